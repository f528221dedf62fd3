//! Compression trait shared by every codec.

use crate::error::Result;
use crate::rng::DeterministicRng;
use crate::tensor::Tensor;

/// Trait for gradient compressors.
///
/// `compress` returns the dense reconstruction: a tensor with the input's
/// shape and element type whose values are what the receiver would decode.
/// Decoding is therefore the identity; applying a compressor a second time
/// re-quantizes rather than decodes.
///
/// Stochastic codecs draw from the caller-owned `rng`, so the sender and a
/// receiver holding an identically positioned stream compute the same
/// output. Deterministic codecs leave `rng` untouched.
pub trait Compressor: Send + Sync {
    /// Identifier of this codec, as used in configuration records.
    fn name(&self) -> &'static str;

    /// Compress `input`, consuming randomness from `rng`.
    ///
    /// Configuration errors are raised before any draw is consumed.
    fn compress(&self, input: &Tensor, rng: &mut dyn DeterministicRng) -> Result<Tensor>;
}
