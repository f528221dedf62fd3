//! Compression configuration records.
//!
//! A [`CompressionParams`] is built either through its builder methods or
//! from string key/value pairs as they arrive from a framework binding.
//! Key/value maps can be flattened into a single line for shipping to a
//! parameter server and parsed back on the other side.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::compression::{Partition, Sampling};
use crate::error::{CodecError, Result};
use crate::normalize::NormalizeMode;
use crate::types::DataType;

/// String hyper-parameters keyed by name. Ordered, so serialization is
/// stable across nodes.
pub type Kwargs = BTreeMap<String, String>;

/// Every compressor the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressorKind {
    None,
    OneBit,
    Dithering,
    RandomK,
    TopK,
}

impl CompressorKind {
    pub const ALL: [CompressorKind; 5] = [
        CompressorKind::None,
        CompressorKind::OneBit,
        CompressorKind::Dithering,
        CompressorKind::RandomK,
        CompressorKind::TopK,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CompressorKind::None => "none",
            CompressorKind::OneBit => "onebit",
            CompressorKind::Dithering => "dithering",
            CompressorKind::RandomK => "randomk",
            CompressorKind::TopK => "topk",
        }
    }

    /// Whether this kind reads the `k` field.
    pub const fn uses_k(self) -> bool {
        matches!(
            self,
            CompressorKind::Dithering | CompressorKind::RandomK | CompressorKind::TopK
        )
    }
}

impl FromStr for CompressorKind {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CompressorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CodecError::UnknownCompressor(s.to_string()))
    }
}

impl std::fmt::Display for CompressorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable compression configuration for one parameter stream.
///
/// `ef`, `momentum` and `scaling` (for kinds other than onebit) are carried
/// for the surrounding training runtime and never interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionParams {
    compressor: CompressorKind,
    k: Option<u32>,
    partition: Option<Partition>,
    normalize: Option<NormalizeMode>,
    seed: u64,
    ef: Option<String>,
    momentum: Option<String>,
    scaling: bool,
    fp16: bool,
    sampling: Sampling,
}

impl CompressionParams {
    pub fn new(compressor: CompressorKind) -> Self {
        Self {
            compressor,
            k: None,
            partition: None,
            normalize: None,
            seed: 0,
            ef: None,
            momentum: None,
            scaling: false,
            fp16: false,
            sampling: Sampling::default(),
        }
    }

    pub fn with_k(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeMode) -> Self {
        self.normalize = Some(normalize);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_ef(mut self, ef: impl Into<String>) -> Self {
        self.ef = Some(ef.into());
        self
    }

    pub fn with_momentum(mut self, momentum: impl Into<String>) -> Self {
        self.momentum = Some(momentum.into());
        self
    }

    pub fn with_scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_fp16(mut self, fp16: bool) -> Self {
        self.fp16 = fp16;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn compressor(&self) -> CompressorKind {
        self.compressor
    }

    pub fn k(&self) -> Option<u32> {
        self.k
    }

    /// Partition that was explicitly set, if any.
    pub fn partition_override(&self) -> Option<Partition> {
        self.partition
    }

    /// Partition, defaulting to linear.
    pub fn partition(&self) -> Partition {
        self.partition.unwrap_or_default()
    }

    /// Normalize mode that was explicitly set, if any.
    pub fn normalize_override(&self) -> Option<NormalizeMode> {
        self.normalize
    }

    /// Normalize mode, defaulting to max.
    pub fn normalize(&self) -> NormalizeMode {
        self.normalize.unwrap_or_default()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ef(&self) -> Option<&str> {
        self.ef.as_deref()
    }

    pub fn momentum(&self) -> Option<&str> {
        self.momentum.as_deref()
    }

    pub fn scaling(&self) -> bool {
        self.scaling
    }

    pub fn fp16(&self) -> bool {
        self.fp16
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    /// Element width implied by the `fp16` hint.
    pub fn element_type(&self) -> DataType {
        if self.fp16 { DataType::F16 } else { DataType::F32 }
    }

    /// `k`, or a configuration error if the compressor needs one and none
    /// was given.
    pub(crate) fn require_k(&self) -> Result<u32> {
        self.k.ok_or(CodecError::MissingParam {
            name: "k",
            compressor: self.compressor.name(),
        })
    }

    /// Parse string hyper-parameters.
    ///
    /// `compressor` is required. Keys the selected compressor does not read
    /// are skipped without being parsed; unrecognized keys are ignored.
    pub fn from_kwargs(kwargs: &Kwargs) -> Result<Self> {
        let kind: CompressorKind = kwargs
            .get("compressor")
            .ok_or(CodecError::MissingParam {
                name: "compressor",
                compressor: "dispatcher",
            })?
            .parse()?;
        let mut params = Self::new(kind);

        for (key, value) in kwargs {
            match key.as_str() {
                "compressor" => continue,
                "k" if kind.uses_k() => params.k = Some(parse_k(kind, value)?),
                "partition" if kind == CompressorKind::Dithering => {
                    params.partition = Some(value.parse()?)
                }
                "normalize" if kind == CompressorKind::Dithering => {
                    params.normalize = Some(value.parse()?)
                }
                "replacement" if kind == CompressorKind::RandomK => {
                    params.sampling = if parse_bool(key, value)? {
                        Sampling::WithReplacement
                    } else {
                        Sampling::WithoutReplacement
                    }
                }
                "seed" => {
                    params.seed = value
                        .parse()
                        .map_err(|_| CodecError::invalid_param(key.as_str(), value.as_str()))?
                }
                "ef" => params.ef = Some(value.clone()),
                "momentum" => params.momentum = Some(value.clone()),
                "scaling" => params.scaling = parse_bool(key, value)?,
                "fp16" => params.fp16 = parse_bool(key, value)?,
                "k" | "partition" | "normalize" | "replacement" => {
                    tracing::debug!(
                        compressor = %kind,
                        key = %key,
                        "hyper-parameter not used by this compressor, ignoring"
                    );
                    continue;
                }
                _ => {
                    tracing::debug!(key = %key, "unknown hyper-parameter, ignoring");
                    continue;
                }
            }
            tracing::info!("Register hyper-parameter '{key}'={value}");
        }

        Ok(params)
    }

    /// Flatten into string hyper-parameters.
    ///
    /// Only set fields the selected compressor reads are emitted, so the
    /// result parses back through [`from_kwargs`](Self::from_kwargs) into a
    /// record that flattens to the same map.
    pub fn to_kwargs(&self) -> Kwargs {
        let kind = self.compressor;
        let mut kwargs = Kwargs::new();
        kwargs.insert("compressor".into(), kind.name().into());
        if let Some(k) = self.k.filter(|_| kind.uses_k()) {
            kwargs.insert("k".into(), k.to_string());
        }
        if kind == CompressorKind::Dithering {
            if let Some(partition) = self.partition {
                kwargs.insert("partition".into(), partition.name().into());
            }
            if let Some(normalize) = self.normalize {
                kwargs.insert("normalize".into(), normalize.name().into());
            }
        }
        if kind == CompressorKind::RandomK && self.sampling == Sampling::WithReplacement {
            kwargs.insert("replacement".into(), "true".into());
        }
        kwargs.insert("seed".into(), self.seed.to_string());
        if let Some(ef) = &self.ef {
            kwargs.insert("ef".into(), ef.clone());
        }
        if let Some(momentum) = &self.momentum {
            kwargs.insert("momentum".into(), momentum.clone());
        }
        kwargs.insert("scaling".into(), self.scaling.to_string());
        kwargs.insert("fp16".into(), self.fp16.to_string());
        kwargs
    }
}

fn parse_k(kind: CompressorKind, value: &str) -> Result<u32> {
    let k: i64 = value
        .parse()
        .map_err(|_| CodecError::invalid_param("k", value))?;
    if k <= 0 {
        return Err(CodecError::NonPositiveK {
            compressor: kind.name(),
        });
    }
    u32::try_from(k).map_err(|_| CodecError::invalid_param("k", value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(CodecError::invalid_param(key, value)),
    }
}

/// Serialize hyper-parameters as `"<count> key val key val ..."`.
///
/// Keys and values must be non-empty and free of whitespace.
pub fn serialize_kwargs(kwargs: &Kwargs) -> Result<String> {
    let mut out = kwargs.len().to_string();
    for (key, value) in kwargs {
        for token in [key, value] {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(CodecError::invalid_param(key.as_str(), value.as_str()));
            }
        }
        out.push(' ');
        out.push_str(key);
        out.push(' ');
        out.push_str(value);
    }
    Ok(out)
}

/// Parse the output of [`serialize_kwargs`].
pub fn deserialize_kwargs(content: &str) -> Result<Kwargs> {
    let malformed = || CodecError::invalid_param("kwargs", content);
    let mut tokens = content.split_whitespace();
    let count: usize = tokens
        .next()
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;

    let mut kwargs = Kwargs::new();
    for _ in 0..count {
        let key = tokens.next().ok_or_else(malformed)?;
        let value = tokens.next().ok_or_else(malformed)?;
        kwargs.insert(key.to_string(), value.to_string());
    }
    if tokens.next().is_some() {
        return Err(malformed());
    }
    Ok(kwargs)
}
