//! Validates a configuration record and routes tensors to the right codec.

use crate::compression::{
    Compressor, DitheringCompressor, NoCompression, OneBitCompressor, RandomKCompressor,
    TopKCompressor,
};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::params::{CompressionParams, CompressorKind, Kwargs};
use crate::rng::{DeterministicRng, KeyedRng, XorShift128Plus};
use crate::tensor::Tensor;

/// Concrete codec selected for a parameter.
enum Codec {
    None(NoCompression),
    OneBit(OneBitCompressor),
    Dithering(DitheringCompressor),
    RandomK(RandomKCompressor),
    TopK(TopKCompressor),
}

impl Codec {
    fn as_compressor(&self) -> &dyn Compressor {
        match self {
            Codec::None(c) => c,
            Codec::OneBit(c) => c,
            Codec::Dithering(c) => c,
            Codec::RandomK(c) => c,
            Codec::TopK(c) => c,
        }
    }
}

/// Build the codec a configuration record asks for.
///
/// Fields the selected kind does not use are accepted and ignored.
pub fn build_compressor(params: &CompressionParams) -> Result<Box<dyn Compressor>> {
    let compressor: Box<dyn Compressor> = match build_codec(params)? {
        Codec::None(c) => Box::new(c),
        Codec::OneBit(c) => Box::new(c),
        Codec::Dithering(c) => Box::new(c),
        Codec::RandomK(c) => Box::new(c),
        Codec::TopK(c) => Box::new(c),
    };
    Ok(compressor)
}

fn build_codec(params: &CompressionParams) -> Result<Codec> {
    let kind = params.compressor();
    if kind != CompressorKind::Dithering
        && (params.partition_override().is_some() || params.normalize_override().is_some())
    {
        tracing::debug!(compressor = %kind, "partition/normalize ignored for this compressor");
    }
    if !kind.uses_k() && params.k().is_some() {
        tracing::debug!(compressor = %kind, "k ignored for this compressor");
    }

    let codec = match kind {
        CompressorKind::None => Codec::None(NoCompression),
        CompressorKind::OneBit => Codec::OneBit(OneBitCompressor::new(params.scaling())),
        CompressorKind::Dithering => Codec::Dithering(DitheringCompressor::new(
            params.require_k()?,
            params.partition(),
            params.normalize(),
        )?),
        CompressorKind::RandomK => Codec::RandomK(
            RandomKCompressor::new(params.require_k()?)?.with_sampling(params.sampling()),
        ),
        CompressorKind::TopK => Codec::TopK(TopKCompressor::new(params.require_k()?)?),
    };
    tracing::debug!(
        compressor = %kind,
        k = ?params.k(),
        seed = params.seed(),
        "compressor configured"
    );
    Ok(codec)
}

/// Entry point used by the communication layer: one dispatcher per
/// configuration, shared by every parameter compressed with it.
///
/// The dispatcher holds no random state. Each parameter owns its stream,
/// obtained from [`rng_for_parameter`](Self::rng_for_parameter) or
/// [`keyed_rng_for_parameter`](Self::keyed_rng_for_parameter), so
/// different parameters can be compressed concurrently.
pub struct CompressionDispatcher {
    params: CompressionParams,
    codec: Codec,
    config: CodecConfig,
}

impl CompressionDispatcher {
    /// Validate `params` and select the codec.
    pub fn new(params: CompressionParams) -> Result<Self> {
        let codec = build_codec(&params)?;
        Ok(Self {
            params,
            codec,
            config: CodecConfig::default(),
        })
    }

    /// Parse string hyper-parameters, then behave like [`new`](Self::new).
    pub fn from_kwargs(kwargs: &Kwargs) -> Result<Self> {
        Self::new(CompressionParams::from_kwargs(kwargs)?)
    }

    /// Replace the tuning config.
    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn params(&self) -> &CompressionParams {
        &self.params
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The selected codec.
    pub fn compressor(&self) -> &dyn Compressor {
        self.codec.as_compressor()
    }

    /// Sequential stream for the parameter at `index`, seeded with
    /// `seed + index`.
    pub fn rng_for_parameter(&self, index: u64) -> XorShift128Plus {
        XorShift128Plus::for_parameter(self.params.seed(), index)
    }

    /// Keyed stream for the parameter at `index`.
    pub fn keyed_rng_for_parameter(&self, index: u64) -> KeyedRng {
        KeyedRng::new(self.params.seed(), index)
    }

    /// Compress `input`, advancing the caller-owned sequential stream.
    pub fn compress(&self, input: &Tensor, rng: &mut dyn DeterministicRng) -> Result<Tensor> {
        self.check_fp16_hint(input);
        self.compressor().compress(input, rng)
    }

    /// Compress `input` with a keyed stream.
    ///
    /// Dithering evaluates elements independently (in parallel for large
    /// tensors); every other codec walks a fresh cursor over `rng`.
    /// Either way the result equals `compress(input, &mut rng.cursor())`.
    pub fn compress_keyed(&self, input: &Tensor, rng: &KeyedRng) -> Result<Tensor> {
        self.check_fp16_hint(input);
        match &self.codec {
            Codec::Dithering(c) => c.compress_keyed(input, rng, &self.config),
            other => other.as_compressor().compress(input, &mut rng.cursor()),
        }
    }

    fn check_fp16_hint(&self, input: &Tensor) {
        if input.dtype() != self.params.element_type() {
            tracing::debug!(
                hint = %self.params.element_type(),
                actual = %input.dtype(),
                "tensor element type differs from the fp16 hint"
            );
        }
    }
}
