//! TopK sparsification: keep the K largest elements by magnitude.

use crate::error::{CodecError, Result};
use crate::rng::DeterministicRng;
use crate::tensor::Tensor;

use super::traits::Compressor;

/// TopK gradient compressor.
///
/// Keeps the `k` entries with the largest absolute value and zeroes the
/// rest. Deterministic: the random stream is never touched. Ties are broken
/// in favour of the lower index so every node selects the same set.
#[derive(Debug, Clone)]
pub struct TopKCompressor {
    k: u32,
}

impl TopKCompressor {
    pub fn new(k: u32) -> Result<Self> {
        if k == 0 {
            return Err(CodecError::NonPositiveK { compressor: "topk" });
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> u32 {
        self.k
    }
}

impl Compressor for TopKCompressor {
    fn name(&self) -> &'static str {
        "topk"
    }

    fn compress(&self, input: &Tensor, _rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        let n = input.len();
        let k = self.k as usize;
        if k > n {
            return Err(CodecError::KExceedsLength {
                compressor: "topk",
                k: self.k,
                len: n,
            });
        }

        let values = input.to_f64_vec();

        // Find top-K by magnitude using a partial selection.
        let mut indices_by_mag: Vec<usize> = (0..n).collect();
        let by_magnitude = |&a: &usize, &b: &usize| {
            values[b]
                .abs()
                .total_cmp(&values[a].abs())
                .then(a.cmp(&b))
        };
        if k < n {
            indices_by_mag.select_nth_unstable_by(k, by_magnitude);
            indices_by_mag.truncate(k);
        }

        let mut out = vec![0.0; n];
        for idx in indices_by_mag {
            out[idx] = values[idx];
        }
        input.with_values(&out)
    }
}
