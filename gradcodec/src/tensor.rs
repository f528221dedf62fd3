//! Dense tensor buffer handed to and returned by the compressors.

use crate::element;
use crate::error::{CodecError, Result};
use crate::types::DataType;

/// A dense, contiguous tensor: little-endian element bytes plus shape and
/// element type. Compressors treat it as a flat sequence and hand back a
/// tensor with the same shape and element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<u8>,
    shape: Vec<usize>,
    dtype: DataType,
}

impl Tensor {
    /// Wrap a raw buffer. Its length must equal `prod(shape) * dtype` width.
    pub fn new(data: Vec<u8>, shape: Vec<usize>, dtype: DataType) -> Result<Self> {
        let expected = shape.iter().product::<usize>() * dtype.size_in_bytes();
        if data.len() != expected {
            return Err(CodecError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, shape, dtype })
    }

    /// Build a 1-D f32 tensor.
    pub fn from_f32(values: &[f32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self {
            data,
            shape: vec![values.len()],
            dtype: DataType::F32,
        }
    }

    /// Build a tensor of `dtype` from f64 values, rounding to the element
    /// width. Fails for a shape that does not cover `values`.
    pub fn from_values(values: &[f64], shape: &[usize], dtype: DataType) -> Result<Self> {
        let data = element::encode(values, dtype);
        Self::new(data, shape.to_vec(), dtype)
    }

    /// All-zero tensor of the given shape and element type.
    pub fn zeros(shape: &[usize], dtype: DataType) -> Self {
        let len = shape.iter().product::<usize>() * dtype.size_in_bytes();
        Self {
            data: vec![0u8; len],
            shape: shape.to_vec(),
            dtype,
        }
    }

    /// Return a tensor with the same elements and a different shape.
    pub fn reshape(self, shape: &[usize]) -> Result<Self> {
        Self::new(self.data, shape.to_vec(), self.dtype)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.size_in_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Decode every element into f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        element::decode(&self.data, self.dtype)
    }

    /// Decode into f32, for callers that feed f32 buffers.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.to_f64_vec().into_iter().map(|v| v as f32).collect()
    }

    /// Build a tensor shaped like `self` from reconstructed f64 values.
    pub(crate) fn with_values(&self, values: &[f64]) -> Result<Self> {
        Self::from_values(values, &self.shape, self.dtype)
    }
}
