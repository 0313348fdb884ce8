//! Embassy async tasks

pub mod sweep;

pub use sweep::sweep_task;
