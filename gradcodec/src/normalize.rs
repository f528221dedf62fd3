//! Per-tensor scale factors.

use std::str::FromStr;

use crate::error::CodecError;
use crate::tensor::Tensor;

/// How a tensor is brought into `[0, 1]` before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalizeMode {
    /// Largest absolute value.
    #[default]
    Max,
    /// Euclidean norm.
    L2,
}

impl NormalizeMode {
    pub const fn name(self) -> &'static str {
        match self {
            NormalizeMode::Max => "max",
            NormalizeMode::L2 => "l2",
        }
    }

    /// Scale factor of `values` under this mode.
    ///
    /// Both reductions walk the slice front to back in a single thread, so
    /// the result is bit-identical on every node. An all-zero (or empty)
    /// input yields 0.
    pub fn scale(self, values: &[f64]) -> f64 {
        match self {
            NormalizeMode::Max => max_abs(values),
            NormalizeMode::L2 => l2_norm(values),
        }
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// Euclidean norm with the squares taken relative to the largest magnitude,
/// so finite inputs never overflow (or underflow) in the sum.
fn l2_norm(values: &[f64]) -> f64 {
    let m = max_abs(values);
    if m == 0.0 || !m.is_finite() {
        return m;
    }
    let sum = values.iter().fold(0.0f64, |acc, v| {
        let r = v / m;
        acc + r * r
    });
    m * sum.sqrt()
}

/// Scale factor of a tensor.
pub fn scale(tensor: &Tensor, mode: NormalizeMode) -> f64 {
    mode.scale(&tensor.to_f64_vec())
}

impl FromStr for NormalizeMode {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "max" => Ok(NormalizeMode::Max),
            "l2" => Ok(NormalizeMode::L2),
            other => Err(CodecError::UnknownNormalize(other.to_string())),
        }
    }
}

impl std::fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
