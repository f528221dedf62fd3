//! Seed-reproducible random streams.
//!
//! Compression on the sending and receiving side must agree on every random
//! decision without exchanging it, so all randomness comes from explicit,
//! caller-owned state. Two flavours exist:
//!
//! - [`XorShift128Plus`]: a sequential stream. Each draw advances the state,
//!   so draws must be consumed in element order.
//! - [`KeyedRng`]: counter-based. The draw at position `i` is a pure function
//!   of `(seed, stream, i)`, so any element's draw can be recomputed alone
//!   and a tensor can be processed in parallel.

use crate::error::{CodecError, Result};

/// 2^-53, the spacing of the 53-bit uniform grid.
const UNIFORM_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Source of reproducible random draws.
///
/// Only `next_u64` is required; the derived draws are defined in terms of it
/// so every implementation maps bits to values identically.
pub trait DeterministicRng {
    /// Next raw 64-bit output.
    fn next_u64(&mut self) -> u64;

    /// Uniform real in `[0, 1)` from the top 53 bits of one draw.
    fn draw_uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIFORM_SCALE
    }

    /// One Bernoulli trial with success probability `p`.
    ///
    /// `p <= 0` never succeeds and `p >= 1` always does; exactly one draw is
    /// consumed either way.
    fn draw_bernoulli(&mut self, p: f64) -> bool {
        self.draw_uniform() < p
    }

    /// Uniform integer in `[low, high)`.
    fn draw_randint(&mut self, low: u64, high: u64) -> Result<u64> {
        if high <= low {
            return Err(CodecError::InvalidRange { low, high });
        }
        Ok(self.next_u64() % (high - low) + low)
    }
}

impl<R: DeterministicRng + ?Sized> DeterministicRng for &mut R {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// xorshift128+ generator; the per-parameter sequential stream state.
///
/// The two state words are public through [`state`](Self::state) so a caller
/// can checkpoint and restore a stream position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift128Plus {
    a: u64,
    b: u64,
}

impl XorShift128Plus {
    /// Expand `seed` into the two state words with two SplitMix64 steps.
    ///
    /// `mix64` is a bijection, so the words are zero for two different seeds
    /// and the all-zero state, whose output is constantly 0, is unreachable.
    /// Nearby seeds (`global_seed + index`) also start from unrelated states
    /// instead of sharing near-zero first draws.
    pub fn new(seed: u64) -> Self {
        Self {
            a: mix64(seed.wrapping_add(GOLDEN_GAMMA)),
            b: mix64(seed.wrapping_add(GOLDEN_GAMMA.wrapping_mul(2))),
        }
    }

    /// Stream for the parameter at `index` under a run-wide `global_seed`.
    pub fn for_parameter(global_seed: u64, index: u64) -> Self {
        Self::new(global_seed.wrapping_add(index))
    }

    /// Restore a stream from previously captured state words.
    pub fn from_state(a: u64, b: u64) -> Self {
        Self { a, b }
    }

    pub fn state(&self) -> (u64, u64) {
        (self.a, self.b)
    }
}

impl DeterministicRng for XorShift128Plus {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let mut t = self.a;
        let s = self.b;
        self.a = s;
        t ^= t << 23;
        t ^= t >> 17;
        t ^= s ^ (s >> 26);
        self.b = t;
        t.wrapping_add(s)
    }
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 output finalizer.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Counter-based generator keyed by `(seed, stream)`.
///
/// `stream` is typically the parameter index, so every parameter of a model
/// gets an independent stream from one run-wide seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedRng {
    key: u64,
    seed: u64,
    stream: u64,
}

impl KeyedRng {
    pub fn new(seed: u64, stream: u64) -> Self {
        let key = mix64(seed ^ mix64(stream.wrapping_add(GOLDEN_GAMMA)));
        Self { key, seed, stream }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Raw draw at `index`.
    #[inline]
    pub fn u64_at(&self, index: u64) -> u64 {
        mix64(
            self.key
                .wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)),
        )
    }

    /// Uniform in `[0, 1)` at `index`.
    #[inline]
    pub fn uniform_at(&self, index: u64) -> f64 {
        (self.u64_at(index) >> 11) as f64 * UNIFORM_SCALE
    }

    /// Bernoulli trial at `index`; agrees with the `index`-th
    /// [`draw_bernoulli`](DeterministicRng::draw_bernoulli) of a fresh cursor.
    #[inline]
    pub fn bernoulli_at(&self, index: u64, p: f64) -> bool {
        self.uniform_at(index) < p
    }

    /// Sequential view over this key, starting at position 0.
    pub fn cursor(&self) -> KeyedCursor {
        KeyedCursor {
            rng: *self,
            position: 0,
        }
    }
}

/// Sequential cursor over a [`KeyedRng`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedCursor {
    rng: KeyedRng,
    position: u64,
}

impl KeyedCursor {
    /// Number of draws consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the cursor forward without drawing.
    pub fn skip(&mut self, n: u64) {
        self.position = self.position.wrapping_add(n);
    }
}

impl DeterministicRng for KeyedCursor {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let v = self.rng.u64_at(self.position);
        self.position = self.position.wrapping_add(1);
        v
    }
}
