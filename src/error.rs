//! Error types for BFV operations

/// Errors surfaced at the public API boundary.
///
/// Only [`Error::InvalidParameters`] is raised during context construction;
/// every other variant reports a recoverable misuse or a refused operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid encryption parameters: {0}")]
    InvalidParameters(String),

    #[error("expected {expected} slots, got {actual}")]
    SlotCount { expected: usize, actual: usize },

    #[error("value {value} at slot {index} is not below the plaintext modulus {modulus}")]
    ValueOutOfRange {
        index: usize,
        value: u64,
        modulus: u64,
    },

    #[error("operands are not in the same (coefficient or NTT) domain")]
    DomainMismatch,

    #[error("operand does not belong to this context's parameter set")]
    ParameterMismatch,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("noise budget exhausted; decryption refused")]
    NoiseBudgetExhausted,

    #[error("buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
