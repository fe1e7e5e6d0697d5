use std::fs;
use std::path::PathBuf;
use tonewire_core::*;

fn bits_literal(bits: &[u8]) -> String {
    bits.iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> std::io::Result<()> {
    let output_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../web/src/constants/modem.ts"),
    };

    let config = ModemConfig::default();
    let content = format!(
        r#"// AUTO-GENERATED FILE - DO NOT EDIT MANUALLY
// Generated from core/src/lib.rs and core/src/framing.rs
// Run `cargo run -p generate-web-constants` to regenerate

export const START_OF_DATA_MARKER = [{}] as const
export const END_OF_DATA_MARKER = [{}] as const
export const SAMPLE_RATE = {}
export const BAUD_RATE = {}
export const FREQ_ZERO = {}
export const FREQ_ONE = {}
export const SAMPLES_PER_BIT = {}
export const MARKER_THRESHOLD = {}
export const PARSE_INTERVAL_MS = {}
export const LEAD_IN_MS = {}
export const TAIL_MS = {}
"#,
        bits_literal(&START_OF_DATA_MARKER),
        bits_literal(&END_OF_DATA_MARKER),
        config.sample_rate,
        config.baud_rate,
        config.freq_zero,
        config.freq_one,
        config.samples_per_bit(),
        config.marker_threshold,
        config.parse_interval.as_millis(),
        DEFAULT_LEAD_IN.as_millis(),
        DEFAULT_TAIL.as_millis(),
    );

    if let Some(dir) = output_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&output_path, content)?;

    println!("Generated: {}", output_path.display());
    Ok(())
}
