//! Random-K sampling: keep K randomly chosen elements, scaled by `n / k`.
//!
//! Simpler than TopK (no sort needed), and unbiased in expectation when the
//! indices are drawn without replacement: every element survives with
//! probability `k / n` and is scaled by `n / k`.

use crate::error::{CodecError, Result};
use crate::rng::DeterministicRng;
use crate::tensor::Tensor;

use super::traits::Compressor;

/// How the `k` indices are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Partial Fisher-Yates shuffle; `k` distinct indices. Unbiased.
    #[default]
    WithoutReplacement,
    /// `k` independent draws from `[0, n)`. Duplicates overwrite rather
    /// than accumulate, so fewer than `k` entries may survive and the
    /// estimator is biased whenever a collision occurs.
    WithReplacement,
}

/// Random-K gradient compressor.
#[derive(Debug, Clone)]
pub struct RandomKCompressor {
    k: u32,
    sampling: Sampling,
}

impl RandomKCompressor {
    pub fn new(k: u32) -> Result<Self> {
        if k == 0 {
            return Err(CodecError::NonPositiveK {
                compressor: "randomk",
            });
        }
        Ok(Self {
            k,
            sampling: Sampling::default(),
        })
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }
}

impl Compressor for RandomKCompressor {
    fn name(&self) -> &'static str {
        "randomk"
    }

    fn compress(&self, input: &Tensor, rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        let n = input.len();
        let k = self.k as usize;
        if k > n {
            return Err(CodecError::KExceedsLength {
                compressor: "randomk",
                k: self.k,
                len: n,
            });
        }

        let values = input.to_f64_vec();
        let indices = match self.sampling {
            Sampling::WithoutReplacement => sample_indices(n, k, rng)?,
            Sampling::WithReplacement => (0..k)
                .map(|_| rng.draw_randint(0, n as u64).map(|i| i as usize))
                .collect::<Result<Vec<_>>>()?,
        };

        let scale = n as f64 / k as f64;
        let mut out = vec![0.0; n];
        for idx in indices {
            out[idx] = values[idx] * scale;
        }
        input.with_values(&out)
    }
}

/// Fisher-Yates partial shuffle to select k unique indices from [0, n).
///
/// Consumes exactly `k` draws: draw `i` picks from `[i, n)`.
fn sample_indices(n: usize, k: usize, rng: &mut dyn DeterministicRng) -> Result<Vec<usize>> {
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.draw_randint(i as u64, n as u64)? as usize;
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool.sort_unstable();
    Ok(pool)
}
