//! Runtime-configurable tuning parameters for gradcodec.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `GRADCODEC_`) or by constructing a custom `CodecConfig`.

/// Tuning parameters for the compression kernels.
///
/// None of these affect compressed output; they only decide how the work
/// is scheduled.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Tensors with at least this many elements are dithered across the
    /// rayon thread pool when a keyed stream is used.
    pub parallel_min_elems: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            parallel_min_elems: 64 * 1024,
        }
    }
}

impl CodecConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `GRADCODEC_PARALLEL_MIN_ELEMS`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("GRADCODEC_PARALLEL_MIN_ELEMS") {
            match v.parse::<usize>() {
                Ok(n) => cfg.parallel_min_elems = n,
                Err(_) => tracing::warn!(
                    value = %v,
                    "ignoring unparsable GRADCODEC_PARALLEL_MIN_ELEMS"
                ),
            }
        }

        cfg
    }

    /// Always fan out, regardless of tensor size.
    pub fn always_parallel() -> Self {
        Self {
            parallel_min_elems: 0,
        }
    }

    /// Never fan out.
    pub fn sequential() -> Self {
        Self {
            parallel_min_elems: usize::MAX,
        }
    }
}
