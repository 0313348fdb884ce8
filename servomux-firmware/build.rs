//! Build script for servomux-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates servos.toml at compile time
//! - Generates `servo_layout.rs` from the validated layout

use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use servomux_core::config::{
    PulseRange, TimingConfig, DEFAULT_MAX_PULSE_US, DEFAULT_MIN_PULSE_US, MAX_SERVOS,
};

/// Highest user GPIO on the RP2040
const MAX_PIN: i64 = 29;

/// One validated `[[servo]]` entry
struct ServoEntry {
    pin: u8,
    range: PulseRange,
    sweep: bool,
}

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);

    let config = load_config();
    let timing = validate_timing(&config);
    let servos = validate_servos(&config, &timing);
    generate_layout(&out_dir, &timing, &servos);

    println!(
        "cargo:warning=servos.toml validated successfully ({} servos)",
        servos.len()
    );
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse servos.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=servos.toml");

    let config_path = Path::new("servos.toml");
    if !config_path.exists() {
        fail(
            "servos.toml not found",
            &[
                "The firmware requires a servos.toml layout file.".to_string(),
                "Add at least one [[servo]] entry with a `pin`.".to_string(),
            ],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read servos.toml", &[e.to_string()]),
    };

    match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in servos.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    }
}

/// Validate the optional [timing] table
fn validate_timing(config: &toml::Value) -> TimingConfig {
    let mut timing = TimingConfig::default();
    let Some(table) = config.get("timing") else {
        return timing;
    };
    let Some(table) = table.as_table() else {
        fail("Invalid timing configuration", &["[timing] must be a table".to_string()]);
    };

    let mut errors = Vec::new();
    for (key, target) in [
        ("tick_interval_us", &mut timing.tick_interval_us),
        ("refresh_interval_us", &mut timing.refresh_interval_us),
    ] {
        match table.get(key) {
            None => {}
            Some(toml::Value::Integer(v)) if (1..=i64::from(u32::MAX)).contains(v) => {
                *target = *v as u32;
            }
            Some(_) => errors.push(format!("[timing] {} must be a positive integer", key)),
        }
    }

    if errors.is_empty() {
        if let Err(e) = timing.validate() {
            errors.push(format!("[timing] rejected: {:?}", e));
        }
    }
    if !errors.is_empty() {
        fail("Invalid timing configuration", &errors);
    }
    timing
}

/// Validate the [[servo]] entries
fn validate_servos(config: &toml::Value, timing: &TimingConfig) -> Vec<ServoEntry> {
    let entries = match config.get("servo") {
        Some(toml::Value::Array(entries)) => entries,
        Some(_) => fail(
            "Invalid servo configuration",
            &["`servo` must be an array of tables ([[servo]])".to_string()],
        ),
        None => fail(
            "Missing [[servo]] entries in servos.toml",
            &["At least one servo is required".to_string()],
        ),
    };

    let mut errors = Vec::new();
    if entries.is_empty() {
        errors.push("At least one servo is required".to_string());
    }
    if entries.len() > MAX_SERVOS {
        errors.push(format!(
            "{} servos configured, at most {} supported",
            entries.len(),
            MAX_SERVOS
        ));
    }

    let mut seen = HashSet::new();
    let mut servos = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_table() else {
            errors.push(format!("servo {} must be a table", i));
            continue;
        };

        let pin = match entry.get("pin") {
            Some(toml::Value::Integer(pin)) if (0..=MAX_PIN).contains(pin) => *pin as u8,
            Some(_) => {
                errors.push(format!("servo {} pin must be 0-{}", i, MAX_PIN));
                continue;
            }
            None => {
                errors.push(format!("servo {} missing 'pin'", i));
                continue;
            }
        };
        if !seen.insert(pin) {
            errors.push(format!("servo {} reuses pin {}", i, pin));
        }

        let mut bound = |key: &str, default: u16| match entry.get(key) {
            None => Some(default),
            Some(toml::Value::Integer(v)) if (0..=i64::from(u16::MAX)).contains(v) => {
                Some(*v as u16)
            }
            Some(_) => {
                errors.push(format!("servo {} {} must be 0-{}", i, key, u16::MAX));
                None
            }
        };
        let min_us = bound("min_us", DEFAULT_MIN_PULSE_US);
        let max_us = bound("max_us", DEFAULT_MAX_PULSE_US);

        let sweep = match entry.get("sweep") {
            None => false,
            Some(toml::Value::Boolean(sweep)) => *sweep,
            Some(_) => {
                errors.push(format!("servo {} sweep must be true or false", i));
                false
            }
        };

        let (Some(min_us), Some(max_us)) = (min_us, max_us) else {
            continue;
        };
        let range = PulseRange::new(min_us, max_us);
        if !range.is_valid_for(timing) {
            errors.push(format!(
                "servo {} needs min_us < max_us < {}",
                i, timing.refresh_interval_us
            ));
            continue;
        }

        servos.push(ServoEntry { pin, range, sweep });
    }

    if !errors.is_empty() {
        fail("Invalid servo configuration", &errors);
    }
    servos
}

/// Write the layout consumed by `src/layout.rs`
fn generate_layout(out_dir: &Path, timing: &TimingConfig, servos: &[ServoEntry]) {
    let mut code = String::new();
    code.push_str("// Generated by build.rs from servos.toml\n\n");

    writeln!(
        code,
        "pub const TIMING: TimingConfig = TimingConfig {{ tick_interval_us: {}, refresh_interval_us: {} }};\n",
        timing.tick_interval_us, timing.refresh_interval_us
    )
    .unwrap();

    code.push_str("pub const SERVOS: &[ServoSpec] = &[\n");
    for servo in servos {
        writeln!(
            code,
            "    ServoSpec {{ pin: {}, range: PulseRange::new({}, {}), sweep: {} }},",
            servo.pin, servo.range.min_us, servo.range.max_us, servo.sweep
        )
        .unwrap();
    }
    code.push_str("];\n\n");

    code.push_str("/// Move the configured GPIOs out of the peripherals\n");
    code.push_str("macro_rules! take_servo_pins {\n    ($p:ident) => {\n        [\n");
    for servo in servos {
        writeln!(
            code,
            "            ({0}u8, embassy_rp::Peri::<'static, embassy_rp::gpio::AnyPin>::from($p.PIN_{0})),",
            servo.pin
        )
        .unwrap();
    }
    code.push_str("        ]\n    };\n}\n");

    fs::write(out_dir.join("servo_layout.rs"), code).unwrap();
}

/// Abort the build with a boxed diagnostic
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| {
                let truncated = if e.len() > 62 {
                    format!("{}...", &e[..59])
                } else {
                    e.clone()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}
