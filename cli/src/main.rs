mod audio;

use audio::AudioClock;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tonewire_core::{
    BfskEncoder, Clock, MessageQueue, ModemConfig, ModemError, StreamingDecoder, MARKER_BITS,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Modem(#[from] ModemError),

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unsupported WAV format: {0}")]
    UnsupportedWav(String),

    #[error("Nothing to encode: pass --text or --input")]
    NoPayload,
}

#[derive(Parser)]
#[command(name = "tonewire")]
#[command(about = "BFSK audio modem for short text messages")]
struct Cli {
    /// JSON modem configuration; omitted fields keep their defaults
    #[arg(long, global = true, value_name = "CONFIG.JSON")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text into a tone frame
    Encode {
        /// Text to send
        #[arg(short, long, conflicts_with = "input")]
        text: Option<String>,

        /// Read the payload from a file instead
        #[arg(short, long, value_name = "INPUT.TXT")]
        input: Option<PathBuf>,

        /// Output WAV (or raw 8-bit PCM with --raw)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Write raw signed 8-bit mono instead of WAV
        #[arg(long)]
        raw: bool,

        /// Silence before the frame
        #[arg(long, default_value_t = 300)]
        lead_in_ms: u64,

        /// Silence after the frame
        #[arg(long, default_value_t = 700)]
        tail_ms: u64,
    },

    /// Replay a recording through the streaming decoder
    Decode {
        /// Input WAV (or raw 8-bit PCM with --raw)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Read raw signed 8-bit mono instead of WAV
        #[arg(long)]
        raw: bool,

        /// Audio fed to the decoder per call
        #[arg(long, default_value_t = 100)]
        chunk_ms: u64,

        /// Print one JSON object per decoded message
        #[arg(long)]
        json: bool,

        /// Also write the 8-bit stream fed to the decoder
        #[arg(long, value_name = "OUTPUT.RAW")]
        dump_raw: Option<PathBuf>,
    },

    /// Show the timing derived from the configuration
    Info,
}

#[derive(Serialize)]
struct DecodedMessage {
    text: String,
    /// Position in the recording when the message was delivered
    at_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode {
            text,
            input,
            output,
            raw,
            lead_in_ms,
            tail_ms,
        } => encode_command(
            config,
            text,
            input.as_deref(),
            &output,
            raw,
            Duration::from_millis(lead_in_ms),
            Duration::from_millis(tail_ms),
        )?,
        Commands::Decode {
            input,
            raw,
            chunk_ms,
            json,
            dump_raw,
        } => decode_command(config, &input, raw, chunk_ms, json, dump_raw.as_deref())?,
        Commands::Info => info_command(&config)?,
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ModemConfig, CliError> {
    let Some(path) = path else {
        return Ok(ModemConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: ModemConfig =
        serde_json::from_str(&contents).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

fn encode_command(
    config: ModemConfig,
    text: Option<String>,
    input: Option<&Path>,
    output: &Path,
    raw: bool,
    lead_in: Duration,
    tail: Duration,
) -> Result<(), CliError> {
    let text = match (text, input) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            let bytes = std::fs::read(path)?;
            info!("Read {} bytes from {}", bytes.len(), path.display());
            String::from_utf8_lossy(&bytes).into_owned()
        }
        (None, None) => return Err(CliError::NoPayload),
    };

    let sample_rate = config.sample_rate;
    let encoder = BfskEncoder::new(config)?;
    let samples = encoder.encode_padded(&text, lead_in, tail);
    info!(
        "Encoded {} bytes to {} samples ({:.2} s)",
        text.len(),
        samples.len(),
        samples.len() as f64 / f64::from(sample_rate)
    );

    if raw {
        audio::write_raw(output, &samples)?;
    } else {
        audio::write_wav(output, &samples, sample_rate)?;
    }
    println!("Wrote {}", output.display());
    Ok(())
}

fn decode_command(
    config: ModemConfig,
    input: &Path,
    raw: bool,
    chunk_ms: u64,
    json: bool,
    dump_raw: Option<&Path>,
) -> Result<(), CliError> {
    let sample_rate = config.sample_rate;
    let samples = if raw {
        audio::read_raw(input)?
    } else {
        audio::read_wav(input, sample_rate)?
    };
    info!("Replaying {} samples from {}", samples.len(), input.display());

    if let Some(path) = dump_raw {
        audio::write_raw(path, &samples)?;
        info!("Dumped raw 8-bit stream to {}", path.display());
    }

    let decoder =
        StreamingDecoder::with_clock(config, MessageQueue::new(), AudioClock::new(sample_rate))?;
    let chunk_len = (u64::from(sample_rate) * chunk_ms.max(1) / 1000).max(1) as usize;

    let mut decoded = 0usize;
    for chunk in samples.chunks(chunk_len) {
        decoder.feed_audio_data(chunk);
        decoder.clock().advance(chunk.len());
        decoded += print_messages(&decoder, json)?;
    }
    decoder.decode_now();
    decoded += print_messages(&decoder, json)?;

    let stats = decoder.stats();
    debug!("Decoder stats: {:?}", stats);
    if decoded == 0 {
        warn!("No message found in {}", input.display());
    } else {
        info!("Decoded {} message(s) in {} passes", decoded, stats.attempts);
    }
    Ok(())
}

fn print_messages(
    decoder: &StreamingDecoder<MessageQueue, AudioClock>,
    json: bool,
) -> Result<usize, CliError> {
    let messages = decoder.sink().drain();
    let at_ms = decoder.clock().now().as_millis() as u64;
    for text in &messages {
        if json {
            let line = DecodedMessage {
                text: text.clone(),
                at_ms,
            };
            let encoded = serde_json::to_string(&line).map_err(std::io::Error::from)?;
            println!("{}", encoded);
        } else {
            println!("{}", text);
        }
    }
    Ok(messages.len())
}

fn info_command(config: &ModemConfig) -> Result<(), CliError> {
    config.validate()?;
    let samples_per_bit = config.samples_per_bit();
    let bit_ms = samples_per_bit as f64 * 1000.0 / f64::from(config.sample_rate);

    println!("sample rate:        {} Hz", config.sample_rate);
    println!("baud rate:          {} bit/s", config.baud_rate);
    println!("tones:              {} Hz (0), {} Hz (1)", config.freq_zero, config.freq_one);
    println!("samples per bit:    {} ({:.3} ms)", samples_per_bit, bit_ms);
    println!("search stride:      {} samples", config.search_stride());
    println!(
        "marker span:        {} samples ({} bits)",
        config.marker_span(),
        MARKER_BITS
    );
    println!("samples per char:   {}", 8 * samples_per_bit);
    println!("empty frame:        {} samples", config.frame_len(0));
    println!(
        "buffer capacity:    {} samples ({:.1} s)",
        config.buffer_capacity,
        config.buffer_capacity as f64 / f64::from(config.sample_rate)
    );
    println!("parse interval:     {} ms", config.parse_interval.as_millis());
    Ok(())
}
