use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn tmp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tonewire-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir.join(name)
}

fn run_tonewire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tonewire"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute tonewire")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_encode_then_decode_wav() {
    let wav = tmp_path("hello.wav");
    let output = run_tonewire(&["encode", "--text", "Hello over audio", wav.to_str().unwrap()]);
    assert!(output.status.success(), "encode failed: {:?}", output);
    assert!(wav.exists(), "WAV file was not created");

    // 300 ms + frame + 700 ms of 16-bit mono at 48 kHz, plus the header
    let frame = (64 + 8 * 16) * 40;
    let expected = (14400 + frame + 33600) * 2;
    let size = fs::metadata(&wav).unwrap().len() as usize;
    assert!(size >= expected && size < expected + 100, "size {}", size);

    let output = run_tonewire(&["decode", wav.to_str().unwrap()]);
    assert!(output.status.success(), "decode failed: {:?}", output);
    assert_eq!(stdout_of(&output).trim(), "Hello over audio");
}

#[test]
fn test_raw_round_trip_with_dump() {
    let raw = tmp_path("message.raw");
    let dump = tmp_path("dump.raw");
    let input = tmp_path("message.txt");
    fs::write(&input, "from a file").unwrap();

    let output = run_tonewire(&[
        "encode",
        "--input",
        input.to_str().unwrap(),
        "--raw",
        "--lead-in-ms",
        "0",
        "--tail-ms",
        "0",
        raw.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "encode failed: {:?}", output);
    assert_eq!(
        fs::metadata(&raw).unwrap().len() as usize,
        (64 + 8 * 11) * 40
    );

    let output = run_tonewire(&[
        "decode",
        "--raw",
        "--json",
        "--dump-raw",
        dump.to_str().unwrap(),
        raw.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "decode failed: {:?}", output);

    let line: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(line["text"], "from a file");
    assert!(line["at_ms"].is_u64());
    assert_eq!(fs::read(&dump).unwrap(), fs::read(&raw).unwrap());
}

#[test]
fn test_config_file_changes_timing() {
    let config = tmp_path("slow.json");
    fs::write(
        &config,
        r#"{"sample_rate": 24000, "baud_rate": 600, "buffer_capacity": 120000}"#,
    )
    .unwrap();
    let wav = tmp_path("slow.wav");

    let output = run_tonewire(&[
        "--config",
        config.to_str().unwrap(),
        "encode",
        "--text",
        "slow",
        wav.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "encode failed: {:?}", output);

    let output = run_tonewire(&[
        "--config",
        config.to_str().unwrap(),
        "decode",
        wav.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "decode failed: {:?}", output);
    assert_eq!(stdout_of(&output).trim(), "slow");

    let output = run_tonewire(&["--config", config.to_str().unwrap(), "info"]);
    let text = stdout_of(&output);
    assert!(text.contains("samples per bit:    40"), "{}", text);
    assert!(text.contains("24000 Hz"), "{}", text);
}

#[test]
fn test_decode_silence_prints_nothing() {
    let raw = tmp_path("silence.raw");
    fs::write(&raw, vec![0u8; 48000]).unwrap();

    let output = run_tonewire(&["decode", "--raw", raw.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout_of(&output).trim().is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No message found"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = tmp_path("bad.json");
    fs::write(&config, r#"{"baud_rate": 9600}"#).unwrap();

    let output = run_tonewire(&["--config", config.to_str().unwrap(), "info"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("baud_rate"));
}

#[test]
fn test_encode_requires_payload() {
    let wav = tmp_path("nothing.wav");
    let output = run_tonewire(&["encode", wav.to_str().unwrap()]);
    assert!(!output.status.success());
}
