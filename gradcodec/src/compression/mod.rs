pub mod dithering;
pub mod none;
pub mod onebit;
pub mod randomk;
pub mod topk;
pub mod traits;

pub use dithering::{DitheringCompressor, MAX_NATURAL_K, Partition, round_next_pow2};
pub use none::NoCompression;
pub use onebit::OneBitCompressor;
pub use randomk::{RandomKCompressor, Sampling};
pub use topk::TopKCompressor;
pub use traits::Compressor;
