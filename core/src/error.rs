use thiserror::Error;

/// Failures raised by the modem core.
///
/// Detection outcomes (no start marker, no end marker, empty payload) are not
/// errors and never show up here.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input size")]
    InvalidInputSize,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
