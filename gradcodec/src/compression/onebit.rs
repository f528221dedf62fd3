//! One-bit sign compression.

use crate::error::Result;
use crate::rng::DeterministicRng;
use crate::tensor::Tensor;

use super::traits::Compressor;

/// Sends only the sign of each element.
///
/// Every element reconstructs to `-scale` if it was negative and `+scale`
/// otherwise (zero included). With `scaling` enabled `scale` is the mean
/// absolute value of the tensor, which keeps the L1 mass of the gradient;
/// without it `scale` is 1.
#[derive(Debug, Clone, Default)]
pub struct OneBitCompressor {
    scaling: bool,
}

impl OneBitCompressor {
    pub fn new(scaling: bool) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> bool {
        self.scaling
    }
}

impl Compressor for OneBitCompressor {
    fn name(&self) -> &'static str {
        "onebit"
    }

    fn compress(&self, input: &Tensor, _rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        let values = input.to_f64_vec();
        let scale = if self.scaling && !values.is_empty() {
            values.iter().fold(0.0f64, |acc, v| acc + v.abs()) / values.len() as f64
        } else {
            1.0
        };

        let out: Vec<f64> = values
            .iter()
            .map(|&x| if x < 0.0 { -scale } else { scale })
            .collect();
        input.with_values(&out)
    }
}
