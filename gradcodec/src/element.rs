//! Floating-point element encodings and byte-level conversion.
//!
//! Compression arithmetic runs in f64; these helpers move values between a
//! tensor's little-endian byte buffer and f64. Narrowing rounds once, to
//! nearest-even, straight from f64.

use half::{bf16, f16};

use crate::types::DataType;

/// Narrow to f32 rounding to odd, so a second rounding to a format with at
/// most 22 mantissa bits lands where a single rounding from f64 would.
#[inline]
fn to_f32_round_odd(v: f64) -> f32 {
    let f = v as f32;
    if v.is_nan() || f as f64 == v || f.to_bits() & 1 == 1 {
        return f;
    }
    // Inexact with an even last bit: take the other neighbour of `v`.
    if (f as f64).abs() > v.abs() {
        f32::from_bits(f.to_bits() - 1)
    } else {
        f32::from_bits(f.to_bits() + 1)
    }
}

/// A floating-point element stored little-endian in a tensor buffer.
pub(crate) trait Element: Copy {
    const SIZE: usize;
    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(self, bytes: &mut [u8]);
    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
}

impl Element for f32 {
    const SIZE: usize = 4;
    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Element for f64 {
    const SIZE: usize = 8;
    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Element for f16 {
    const SIZE: usize = 2;
    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        f16::from_le_bytes([bytes[0], bytes[1]])
    }
    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f32(to_f32_round_odd(v))
    }
}

impl Element for bf16 {
    const SIZE: usize = 2;
    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bf16::from_le_bytes([bytes[0], bytes[1]])
    }
    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }
    #[inline]
    fn to_f64(self) -> f64 {
        bf16::to_f64(self)
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        bf16::from_f32(to_f32_round_odd(v))
    }
}

/// Decode a little-endian buffer of `dtype` elements into f64 values.
pub(crate) fn decode(bytes: &[u8], dtype: DataType) -> Vec<f64> {
    match dtype {
        DataType::F32 => decode_typed::<f32>(bytes),
        DataType::F64 => decode_typed::<f64>(bytes),
        DataType::F16 => decode_typed::<f16>(bytes),
        DataType::BF16 => decode_typed::<bf16>(bytes),
    }
}

/// Encode f64 values into a little-endian buffer of `dtype` elements.
pub(crate) fn encode(values: &[f64], dtype: DataType) -> Vec<u8> {
    match dtype {
        DataType::F32 => encode_typed::<f32>(values),
        DataType::F64 => encode_typed::<f64>(values),
        DataType::F16 => encode_typed::<f16>(values),
        DataType::BF16 => encode_typed::<bf16>(values),
    }
}

fn decode_typed<T: Element>(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(T::SIZE)
        .map(|chunk| T::read_le(chunk).to_f64())
        .collect()
}

fn encode_typed<T: Element>(values: &[f64]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * T::SIZE];
    for (chunk, &v) in out.chunks_exact_mut(T::SIZE).zip(values) {
        T::from_f64(v).write_le(chunk);
    }
    out
}
