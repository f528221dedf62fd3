//! Seed-reproducible gradient compression codecs.
//!
//! Every codec maps a dense float tensor to a dense tensor of the same
//! shape and element type, using only randomness drawn from a caller-owned
//! stream, so two parties holding the same stream position compute
//! identical outputs without exchanging any random state.

pub mod compression;
pub mod config;
pub mod dispatch;
pub(crate) mod element;
pub mod error;
pub mod normalize;
pub mod params;
pub mod rng;
pub mod tensor;
pub mod types;

pub use compression::{
    Compressor, DitheringCompressor, NoCompression, OneBitCompressor, Partition,
    RandomKCompressor, Sampling, TopKCompressor,
};
pub use config::CodecConfig;
pub use dispatch::{CompressionDispatcher, build_compressor};
pub use error::{CodecError, Result};
pub use normalize::NormalizeMode;
pub use params::{CompressionParams, CompressorKind, Kwargs, deserialize_kwargs, serialize_kwargs};
pub use rng::{DeterministicRng, KeyedCursor, KeyedRng, XorShift128Plus};
pub use tensor::Tensor;
pub use types::DataType;
