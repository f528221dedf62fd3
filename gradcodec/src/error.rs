pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown compressor '{0}'")]
    UnknownCompressor(String),

    #[error("unknown partition '{0}' (expected linear or natural)")]
    UnknownPartition(String),

    #[error("unknown normalize mode '{0}' (expected max or l2)")]
    UnknownNormalize(String),

    #[error("hyper-parameter '{name}' is required by {compressor}")]
    MissingParam {
        name: &'static str,
        compressor: &'static str,
    },

    #[error("hyper-parameter '{name}' has invalid value '{value}'")]
    InvalidParam { name: String, value: String },

    #[error("{compressor}: k must be positive")]
    NonPositiveK { compressor: &'static str },

    #[error("{compressor}: k={k} exceeds tensor length {len}")]
    KExceedsLength {
        compressor: &'static str,
        k: u32,
        len: usize,
    },

    #[error("natural partition supports k <= {max}, got {k}")]
    KTooLarge { k: u32, max: u32 },

    #[error("invalid random range [{low}, {high})")]
    InvalidRange { low: u64, high: u64 },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl CodecError {
    /// True for every failure that stems from a bad configuration record or
    /// bad call arguments, as opposed to a malformed tensor buffer.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::BufferSizeMismatch { .. })
    }

    pub(crate) fn invalid_param(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            value: value.into(),
        }
    }
}
