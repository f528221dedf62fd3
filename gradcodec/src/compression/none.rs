//! Identity (no-op) compressor. Passes data through unmodified.

use crate::error::Result;
use crate::rng::DeterministicRng;
use crate::tensor::Tensor;

use super::traits::Compressor;

/// No-op compressor that passes all elements through.
pub struct NoCompression;

impl Compressor for NoCompression {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, input: &Tensor, _rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        Ok(input.clone())
    }
}
