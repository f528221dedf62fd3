//! Dithering: unbiased stochastic rounding onto a finite level set.
//!
//! Each element is normalized by a per-tensor scale, its magnitude is
//! rounded up or down to a neighbouring level with probability proportional
//! to its distance from the lower level, and the sign is reapplied. The
//! expected reconstruction equals the input.
//!
//! Two level layouts are supported:
//! - linear: `k + 1` equally spaced levels `0, 1/k, ..., 1`.
//! - natural: `0` plus the powers of two `2^-(k-1), ..., 1/2, 1`, which gives
//!   finer resolution near zero where most gradient mass sits.

use std::str::FromStr;

use rayon::prelude::*;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::normalize::NormalizeMode;
use crate::rng::{DeterministicRng, KeyedRng};
use crate::tensor::Tensor;

use super::traits::Compressor;

/// Largest `k` the natural partition accepts. Level indices are held in a
/// `u32`, and `2^(k-1)` must stay representable.
pub const MAX_NATURAL_K: u32 = 32;

/// Level layout used by dithering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Partition {
    #[default]
    Linear,
    Natural,
}

impl Partition {
    pub const fn name(self) -> &'static str {
        match self {
            Partition::Linear => "linear",
            Partition::Natural => "natural",
        }
    }
}

impl FromStr for Partition {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Partition::Linear),
            "natural" => Ok(Partition::Natural),
            other => Err(CodecError::UnknownPartition(other.to_string())),
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Smallest power of two `>= v`.
///
/// `0` maps to `0`, and inputs above `2^31` wrap to `0` because the result
/// is not representable in 32 bits. Natural dithering never feeds it more
/// than `2^31` (see [`MAX_NATURAL_K`]).
#[inline]
pub fn round_next_pow2(v: u32) -> u32 {
    let mut v = v.wrapping_sub(1);
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v.wrapping_add(1)
}

/// Stochastic-rounding quantizer.
#[derive(Debug, Clone)]
pub struct DitheringCompressor {
    k: u32,
    partition: Partition,
    normalize: NormalizeMode,
}

impl DitheringCompressor {
    pub fn new(k: u32, partition: Partition, normalize: NormalizeMode) -> Result<Self> {
        if k == 0 {
            return Err(CodecError::NonPositiveK {
                compressor: "dithering",
            });
        }
        if partition == Partition::Natural && k > MAX_NATURAL_K {
            return Err(CodecError::KTooLarge {
                k,
                max: MAX_NATURAL_K,
            });
        }
        Ok(Self {
            k,
            partition,
            normalize,
        })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn normalize(&self) -> NormalizeMode {
        self.normalize
    }

    /// Number of level steps between 0 and 1: `k` (linear) or `2^(k-1)`
    /// (natural).
    fn divisor(&self) -> f64 {
        match self.partition {
            Partition::Linear => self.k as f64,
            Partition::Natural => (1u64 << (self.k - 1)) as f64,
        }
    }

    /// Every normalized magnitude a reconstruction can take, ascending.
    pub fn level_set(&self) -> Vec<f64> {
        let divisor = self.divisor();
        match self.partition {
            Partition::Linear => (0..=self.k).map(|l| l as f64 / divisor).collect(),
            Partition::Natural => std::iter::once(0.0)
                .chain((0..self.k).map(|j| (1u64 << j) as f64 / divisor))
                .collect(),
        }
    }

    /// Round a normalized magnitude `y` in `[0, 1]` to a level, using one
    /// Bernoulli trial from `bernoulli`. Returns the normalized level.
    #[inline]
    fn round_magnitude(&self, y: f64, bernoulli: impl FnOnce(f64) -> bool) -> f64 {
        let divisor = self.divisor();
        let scaled = y * divisor;
        let level = match self.partition {
            Partition::Linear => {
                let low = scaled.floor();
                let p = scaled - low;
                low + if bernoulli(p) { 1.0 } else { 0.0 }
            }
            Partition::Natural => {
                let low = (round_next_pow2(scaled.ceil() as u32) >> 1) as f64;
                // The lowest bucket [0, 1] has no power-of-two floor.
                let length = if low == 0.0 { 1.0 } else { low };
                let p = (scaled - low) / length;
                low + if bernoulli(p) { length } else { 0.0 }
            }
        };
        level / divisor
    }

    /// Reconstruct one element given the tensor scale.
    #[inline]
    fn reconstruct(&self, x: f64, scale: f64, bernoulli: impl FnOnce(f64) -> bool) -> f64 {
        let sign = if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        };
        let y_hat = self.round_magnitude(x.abs() / scale, bernoulli);
        sign * y_hat * scale
    }

    /// Compress with a keyed stream: element `i` uses draw `i` of `rng`.
    ///
    /// Output is bit-identical to `compress(input, &mut rng.cursor())`.
    /// Tensors with at least `config.parallel_min_elems` elements are
    /// processed on the rayon pool.
    pub fn compress_keyed(
        &self,
        input: &Tensor,
        rng: &KeyedRng,
        config: &CodecConfig,
    ) -> Result<Tensor> {
        let values = input.to_f64_vec();
        let scale = self.normalize.scale(&values);
        if scale == 0.0 {
            tracing::trace!(len = values.len(), "dithering: zero scale, emitting zeros");
            return Ok(Tensor::zeros(input.shape(), input.dtype()));
        }

        let element = |(i, &x): (usize, &f64)| {
            self.reconstruct(x, scale, |p| rng.bernoulli_at(i as u64, p))
        };
        let out: Vec<f64> = if values.len() >= config.parallel_min_elems {
            tracing::trace!(len = values.len(), "dithering: parallel keyed pass");
            values.par_iter().enumerate().map(element).collect()
        } else {
            values.iter().enumerate().map(element).collect()
        };
        input.with_values(&out)
    }
}

impl Compressor for DitheringCompressor {
    fn name(&self) -> &'static str {
        "dithering"
    }

    fn compress(&self, input: &Tensor, rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        let values = input.to_f64_vec();
        let scale = self.normalize.scale(&values);
        if scale == 0.0 {
            tracing::trace!(len = values.len(), "dithering: zero scale, emitting zeros");
            return Ok(Tensor::zeros(input.shape(), input.dtype()));
        }

        let out: Vec<f64> = values
            .iter()
            .map(|&x| self.reconstruct(x, scale, |p| rng.draw_bernoulli(p)))
            .collect();
        input.with_values(&out)
    }
}
