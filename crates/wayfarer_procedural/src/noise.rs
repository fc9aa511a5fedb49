//! # Noise Fields
//!
//! Deterministic multi-field sampler over tile-space coordinates.
//!
//! ## Fields
//!
//! - **height**: domain-warped, two-sample blend, `[0, height.amplitude]`
//! - **moisture**: domain-warped, `[0, moisture.amplitude]`
//! - **river mask**: sharpened ridged-valley signal, `[0, 1]`
//! - **slope**: forward-difference gradient magnitude of height
//!
//! ## Determinism Guarantee
//!
//! Every source is seeded from the recipe seed truncated to 32 bits plus a
//! fixed per-field salt. `NoiseFields` holds no mutable state, so it can be
//! shared across threads behind an `Arc` and every call with the same
//! `(x, y)` returns the same bits.

use noise::{Billow, Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti};

use crate::recipe::{BiomeRecipe, NoiseKind, NoiseParams, MAX_OCTAVES};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Hashes a seed phrase (FNV-1a, 64 bit).
    #[must_use]
    pub const fn from_phrase(phrase: &str) -> Self {
        const OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01B3;

        let bytes = phrase.as_bytes();
        let mut hash = OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Low 32 bits, the base seed for every noise source.
    #[inline]
    #[must_use]
    pub const fn base_u32(self) -> u32 {
        self.0 as u32
    }

    /// Derives a sub-seed for a specific purpose (e.g. structure placement).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Per-field seed offsets. Distinct so fields are decorrelated.
mod salt {
    pub const HEIGHT: u32 = 0;
    pub const MOISTURE: u32 = 1_013;
    pub const RIVER: u32 = 2_027;
    pub const WARP_X: u32 = 3_041;
    pub const WARP_Y: u32 = 4_057;
}

/// Seed for one source: base plus salt, kept below `u32::MAX - MAX_OCTAVES`.
///
/// Fractal sources seed octave `i` with `seed + i` unchecked, so the top of
/// the range must stay free for every octave.
#[inline]
const fn source_seed(base: u32, salt: u32) -> u32 {
    base.wrapping_add(salt) % (u32::MAX - MAX_OCTAVES)
}

/// A seeded fractal source of one of the recipe's kinds.
///
/// Output is roughly `[-1, 1]`; callers clamp after remapping.
enum FractalSource {
    Perlin(Fbm<Perlin>),
    Ridged(RidgedMulti<Perlin>),
    Billow(Billow<Perlin>),
}

impl FractalSource {
    fn new(kind: NoiseKind, seed: u32, octaves: u32) -> Self {
        let octaves = octaves.min(MAX_OCTAVES) as usize;
        match kind {
            NoiseKind::Perlin => Self::Perlin(Fbm::<Perlin>::new(seed).set_octaves(octaves)),
            NoiseKind::Ridged => {
                Self::Ridged(RidgedMulti::<Perlin>::new(seed).set_octaves(octaves))
            }
            NoiseKind::Billow => Self::Billow(Billow::<Perlin>::new(seed).set_octaves(octaves)),
        }
    }

    #[inline]
    fn get(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::Perlin(source) => source.get([x, y]),
            Self::Ridged(source) => source.get([x, y]),
            Self::Billow(source) => source.get([x, y]),
        }
    }
}

/// Maps signed noise `[-1, 1]` onto `[0, 1]`.
#[inline]
fn unit(value: f64) -> f64 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// The five seeded sources plus the scalars derived from the recipe.
pub struct NoiseFields {
    height: FractalSource,
    moisture: FractalSource,
    river: RidgedMulti<Perlin>,
    warp_x: Fbm<Perlin>,
    warp_y: Fbm<Perlin>,
    height_params: NoiseParams,
    moisture_params: NoiseParams,
    /// Warp displacement in tile units.
    warp_amplitude: f64,
}

impl NoiseFields {
    /// Warp strength; displacement is `WARP_STRENGTH / height.scale` tiles.
    pub const WARP_STRENGTH: f64 = 0.25;
    /// Warp sources run at this fraction of the height frequency.
    pub const WARP_FREQUENCY_RATIO: f64 = 0.5;
    /// Warp sources are deliberately smooth.
    pub const WARP_OCTAVES: usize = 2;
    /// Offset (tiles) of the secondary height sample.
    pub const BLEND_OFFSET: f64 = 41.3;
    /// Weight of the primary height sample.
    pub const PRIMARY_WEIGHT: f64 = 0.7;
    /// Weight of the offset height sample.
    pub const SECONDARY_WEIGHT: f64 = 0.3;
    /// River source frequency relative to height frequency.
    pub const RIVER_FREQUENCY_RATIO: f64 = 0.6;
    /// River source octaves.
    pub const RIVER_OCTAVES: usize = 3;
    /// Valley values below this are not river.
    pub const RIVER_THRESHOLD: f64 = 0.40;
    /// Sharpening exponent for river channels.
    pub const RIVER_EXPONENT: f64 = 2.2;
    /// Finite-difference step for slope, in tile units.
    pub const SLOPE_STEP: f64 = 0.75;

    /// Builds all sources from a recipe.
    #[must_use]
    pub fn new(recipe: &BiomeRecipe) -> Self {
        let base = recipe.world_seed().base_u32();

        Self {
            height: FractalSource::new(
                recipe.height.kind,
                source_seed(base, salt::HEIGHT),
                recipe.height.octaves,
            ),
            moisture: FractalSource::new(
                recipe.moisture.kind,
                source_seed(base, salt::MOISTURE),
                recipe.moisture.octaves,
            ),
            river: RidgedMulti::<Perlin>::new(source_seed(base, salt::RIVER))
                .set_octaves(Self::RIVER_OCTAVES),
            warp_x: Fbm::<Perlin>::new(source_seed(base, salt::WARP_X))
                .set_octaves(Self::WARP_OCTAVES),
            warp_y: Fbm::<Perlin>::new(source_seed(base, salt::WARP_Y))
                .set_octaves(Self::WARP_OCTAVES),
            height_params: recipe.height,
            moisture_params: recipe.moisture,
            warp_amplitude: Self::WARP_STRENGTH / recipe.height.scale,
        }
    }

    /// Domain-warps a tile-space coordinate.
    #[inline]
    #[must_use]
    pub fn warp(&self, x: f64, y: f64) -> (f64, f64) {
        let f = self.height_params.scale * Self::WARP_FREQUENCY_RATIO;
        let dx = self.warp_x.get([x * f, y * f]);
        let dy = self.warp_y.get([x * f, y * f]);
        (x + dx * self.warp_amplitude, y + dy * self.warp_amplitude)
    }

    /// Height in `[0, height.amplitude]`.
    #[must_use]
    pub fn sample_height(&self, x: f64, y: f64) -> f64 {
        let (wx, wy) = self.warp(x, y);
        let s = self.height_params.scale;

        let primary = self.height.get(wx * s, wy * s);
        let secondary = self.height.get(
            (wx + Self::BLEND_OFFSET) * s,
            (wy - Self::BLEND_OFFSET) * s,
        );
        let blended = primary * Self::PRIMARY_WEIGHT + secondary * Self::SECONDARY_WEIGHT;

        unit(blended) * self.height_params.amplitude
    }

    /// Moisture in `[0, moisture.amplitude]`.
    #[must_use]
    pub fn sample_moisture(&self, x: f64, y: f64) -> f64 {
        let (wx, wy) = self.warp(x, y);
        let s = self.moisture_params.scale;
        unit(self.moisture.get(wx * s, wy * s)) * self.moisture_params.amplitude
    }

    /// River mask in `[0, 1]`; high only in narrow valley channels.
    #[must_use]
    pub fn river_mask(&self, x: f64, y: f64) -> f64 {
        let f = self.height_params.scale * Self::RIVER_FREQUENCY_RATIO;
        let ridge = self.river.get([x * f, y * f]);
        let valley = unit(-ridge);

        let channel = (valley - Self::RIVER_THRESHOLD).max(0.0) / (1.0 - Self::RIVER_THRESHOLD);
        channel.powf(Self::RIVER_EXPONENT)
    }

    /// Gradient magnitude of the height field.
    #[must_use]
    pub fn slope(&self, x: f64, y: f64) -> f64 {
        let h = self.sample_height(x, y);
        let dx = self.sample_height(x + Self::SLOPE_STEP, y) - h;
        let dy = self.sample_height(x, y + Self::SLOPE_STEP) - h;
        dx.hypot(dy)
    }

    /// Height field parameters this sampler was built with.
    #[inline]
    #[must_use]
    pub const fn height_params(&self) -> NoiseParams {
        self.height_params
    }

    /// Moisture field parameters this sampler was built with.
    #[inline]
    #[must_use]
    pub const fn moisture_params(&self) -> NoiseParams {
        self.moisture_params
    }
}
