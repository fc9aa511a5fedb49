//! # Biome Recipe
//!
//! The immutable parameter bundle that defines one generated world.
//!
//! A recipe is either built in code from a seed phrase
//! (`BiomeRecipe::from_phrase`) or loaded from TOML:
//!
//! ```toml
//! seed = 8121432
//! palette = ["#123a66", "#2f6fa3", "#4f8a3c", "#d9c38a"]
//!
//! [height]
//! kind = "perlin"
//! octaves = 5
//! amplitude = 1.0
//! scale = 0.035
//!
//! [moisture]
//! kind = "billow"
//! octaves = 4
//! amplitude = 1.0
//! scale = 0.05
//!
//! [[structures]]
//! name = "beacon"
//! rarity = 0.015
//! ```
//!
//! Two recipes with equal fields compare equal and sample identical fields.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::noise::WorldSeed;

/// Name of the collectible marker structure.
pub const BEACON_STRUCTURE: &str = "beacon";

/// Rarity used when a recipe carries no `beacon` definition.
pub const DEFAULT_BEACON_RARITY: f64 = 0.015;

/// Upper bound on fractal octaves accepted by validation.
pub const MAX_OCTAVES: u32 = 16;

/// Fractal flavour of a noise source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Fractal Brownian motion over Perlin noise.
    #[default]
    Perlin,
    /// Ridged multifractal (sharp crests).
    Ridged,
    /// Billowy multifractal (rounded lumps).
    Billow,
}

/// Parameters for one sampled field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Fractal flavour.
    pub kind: NoiseKind,
    /// Number of octaves (1..=16).
    pub octaves: u32,
    /// Output range is `[0, amplitude]`.
    pub amplitude: f64,
    /// Frequency applied to tile coordinates (smaller = broader features).
    pub scale: f64,
}

impl NoiseParams {
    /// Default height field parameters.
    pub const HEIGHT: Self = Self {
        kind: NoiseKind::Perlin,
        octaves: 5,
        amplitude: 1.0,
        scale: 0.035,
    };

    /// Default moisture field parameters.
    pub const MOISTURE: Self = Self {
        kind: NoiseKind::Perlin,
        octaves: 4,
        amplitude: 1.0,
        scale: 0.05,
    };

    fn validate(&self, field: &str) -> WorldResult<()> {
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(WorldError::InvalidRecipe(format!(
                "{field}.octaves must be in 1..={MAX_OCTAVES}, got {}",
                self.octaves
            )));
        }
        if !self.amplitude.is_finite() || self.amplitude <= 0.0 {
            return Err(WorldError::InvalidRecipe(format!(
                "{field}.amplitude must be finite and > 0, got {}",
                self.amplitude
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(WorldError::InvalidRecipe(format!(
                "{field}.scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// 24-bit display color.
///
/// Serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Fallback for palette slots the recipe does not provide.
    pub const NEUTRAL_GRAY: Self = Self::from_hex(0x80_80_80);

    /// Creates a color from a packed `0xRRGGBB` value.
    #[inline]
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// Packs the color as `0xRRGGBB`.
    #[inline]
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.strip_prefix('#').unwrap_or(&value);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("color `{value}` is not of the form #rrggbb"));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_hex)
            .map_err(|e| format!("color `{value}`: {e}"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A named structure and its per-tile placement probability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureDef {
    /// Structure name (e.g. `"beacon"`).
    pub name: String,
    /// Probability in `[0, 1]`.
    pub rarity: f64,
}

/// Presentation metadata. Carried with the recipe, never read by the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Atmosphere {
    /// Weather preset name.
    pub weather: String,
    /// Mood / music preset name.
    pub mood: String,
}

/// Immutable description of one world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeRecipe {
    /// World seed.
    #[serde(with = "seed_repr")]
    pub seed: u64,
    /// Ordered palette; slot meaning is fixed by the classifier.
    #[serde(default)]
    pub palette: Vec<Rgb>,
    /// Height field parameters.
    pub height: NoiseParams,
    /// Moisture field parameters.
    pub moisture: NoiseParams,
    /// Structure definitions.
    #[serde(default)]
    pub structures: Vec<StructureDef>,
    /// Weather / mood metadata.
    #[serde(default)]
    pub atmosphere: Atmosphere,
}

impl BiomeRecipe {
    /// Default palette: deep water, shallow water, vegetation, sand, accent.
    pub const DEFAULT_PALETTE: [Rgb; 5] = [
        Rgb::from_hex(0x12_3A_66),
        Rgb::from_hex(0x2F_6F_A3),
        Rgb::from_hex(0x4F_8A_3C),
        Rgb::from_hex(0xD9_C3_8A),
        Rgb::from_hex(0xF2_B1_34),
    ];

    /// Creates a recipe with default parameters for a numeric seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            palette: Self::DEFAULT_PALETTE.to_vec(),
            height: NoiseParams::HEIGHT,
            moisture: NoiseParams::MOISTURE,
            structures: vec![StructureDef {
                name: BEACON_STRUCTURE.to_owned(),
                rarity: DEFAULT_BEACON_RARITY,
            }],
            atmosphere: Atmosphere {
                weather: "clear".to_owned(),
                mood: "calm".to_owned(),
            },
        }
    }

    /// Creates a recipe with default parameters from a seed phrase.
    ///
    /// The same phrase always yields an equal recipe.
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        Self::with_seed(WorldSeed::from_phrase(phrase).value())
    }

    /// Parses and validates a TOML recipe.
    ///
    /// # Errors
    ///
    /// Returns `RecipeParse` on malformed TOML and `InvalidRecipe` when a
    /// parameter is out of range.
    pub fn from_toml_str(source: &str) -> WorldResult<Self> {
        let recipe: Self = toml::from_str(source)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Reads, parses and validates a TOML recipe file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`BiomeRecipe::from_toml_str`].
    pub fn load(path: &Path) -> WorldResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serializes the recipe back to TOML.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipe` if serialization fails.
    pub fn to_toml_string(&self) -> WorldResult<String> {
        toml::to_string(self).map_err(|e| WorldError::InvalidRecipe(e.to_string()))
    }

    /// Checks every parameter range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipe` describing the first offending field.
    pub fn validate(&self) -> WorldResult<()> {
        self.height.validate("height")?;
        self.moisture.validate("moisture")?;
        for def in &self.structures {
            if !(0.0..=1.0).contains(&def.rarity) {
                return Err(WorldError::InvalidRecipe(format!(
                    "structure `{}` rarity must be in [0, 1], got {}",
                    def.name, def.rarity
                )));
            }
        }
        Ok(())
    }

    /// Seed wrapper for this recipe.
    #[inline]
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }

    /// Looks up the rarity of a named structure.
    #[must_use]
    pub fn structure_rarity(&self, name: &str) -> Option<f64> {
        self.structures
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.rarity)
    }

    /// Palette slot, if the recipe provides it.
    #[inline]
    #[must_use]
    pub fn palette_color(&self, slot: usize) -> Option<Rgb> {
        self.palette.get(slot).copied()
    }
}

/// TOML integers are signed; seeds round-trip through their bit pattern.
mod seed_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(seed: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*seed as i64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        i64::deserialize(deserializer).map(|bits| bits as u64)
    }
}

/// Streaming layout for a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// World units per tile.
    pub tile_size: f64,
    /// Chunk width in tiles.
    pub chunk_width: u32,
    /// Chunk height in tiles.
    pub chunk_height: u32,
    /// Chebyshev radius preloaded at spawn.
    pub preload_radius: u32,
    /// Chebyshev radius kept resident while moving.
    pub margin_chunks: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tile_size: 40.0,
            chunk_width: 16,
            chunk_height: 16,
            preload_radius: 1,
            margin_chunks: 1,
        }
    }
}

impl StreamingConfig {
    /// Parses a TOML streaming section.
    ///
    /// # Errors
    ///
    /// Returns `RecipeParse` on malformed TOML, or the validation error.
    pub fn from_toml_str(source: &str) -> WorldResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects degenerate geometry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTileSize` or `InvalidChunkSize`.
    pub fn validate(&self) -> WorldResult<()> {
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(WorldError::InvalidTileSize(self.tile_size));
        }
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(WorldError::InvalidChunkSize {
                width: self.chunk_width,
                height: self.chunk_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_recipes_are_equal() {
        let a = BiomeRecipe::from_phrase("RAIN_FOX_PEAKS");
        let b = BiomeRecipe::from_phrase("RAIN_FOX_PEAKS");
        assert_eq!(a, b);
        assert_ne!(a.seed, BiomeRecipe::from_phrase("RAIN_FOX_VALLEY").seed);
    }

    #[test]
    fn test_toml_round_trip_preserves_high_seeds() {
        let recipe = BiomeRecipe::with_seed(u64::MAX - 7);
        let text = recipe.to_toml_string().unwrap();
        let parsed = BiomeRecipe::from_toml_str(&text).unwrap();
        assert_eq!(parsed, recipe);
    }

    #[test]
    fn test_toml_parsing() {
        let recipe = BiomeRecipe::from_toml_str(
            r##"
            seed = 77
            palette = ["#000000", "#0000ff", "#00ff00"]

            [height]
            kind = "ridged"
            octaves = 3
            amplitude = 1.0
            scale = 0.02

            [moisture]
            kind = "billow"
            octaves = 2
            amplitude = 0.5
            scale = 0.04

            [[structures]]
            name = "beacon"
            rarity = 0.25
            "##,
        )
        .unwrap();

        assert_eq!(recipe.seed, 77);
        assert_eq!(recipe.height.kind, NoiseKind::Ridged);
        assert_eq!(recipe.moisture.kind, NoiseKind::Billow);
        assert_eq!(recipe.palette[2], Rgb::from_hex(0x00_FF_00));
        assert_eq!(recipe.structure_rarity(BEACON_STRUCTURE), Some(0.25));
        assert_eq!(recipe.atmosphere, Atmosphere::default());
    }

    #[test]
    fn test_invalid_recipes_rejected() {
        let mut recipe = BiomeRecipe::with_seed(1);
        recipe.height.octaves = 0;
        assert!(matches!(recipe.validate(), Err(WorldError::InvalidRecipe(_))));

        let mut recipe = BiomeRecipe::with_seed(1);
        recipe.moisture.scale = -1.0;
        assert!(matches!(recipe.validate(), Err(WorldError::InvalidRecipe(_))));

        let mut recipe = BiomeRecipe::with_seed(1);
        recipe.structures[0].rarity = 1.5;
        assert!(matches!(recipe.validate(), Err(WorldError::InvalidRecipe(_))));
    }

    #[test]
    fn test_bad_color_is_parse_error() {
        let err = BiomeRecipe::from_toml_str(
            r##"
            seed = 1
            palette = ["#12345"]
            [height]
            kind = "perlin"
            octaves = 1
            amplitude = 1.0
            scale = 0.1
            [moisture]
            kind = "perlin"
            octaves = 1
            amplitude = 1.0
            scale = 0.1
            "##,
        );
        assert!(matches!(err, Err(WorldError::RecipeParse(_))));
    }

    #[test]
    fn test_rgb_rejects_signs_and_non_hex() {
        for bad in ["#+12345", "#-12345", "#12345g", "#1234567", "+123456"] {
            assert!(Rgb::try_from(bad.to_owned()).is_err(), "{bad}");
        }
        assert_eq!(Rgb::try_from("#0A0b0C".to_owned()), Ok(Rgb::from_hex(0x0A_0B_0C)));
        assert_eq!(Rgb::try_from("123456".to_owned()), Ok(Rgb::from_hex(0x12_34_56)));
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::from_hex(0x0A_0B_0C).to_string(), "#0a0b0c");
        assert_eq!(Rgb::from_hex(0x12_34_56).to_hex(), 0x12_34_56);
    }

    #[test]
    fn test_missing_structure_is_none() {
        let mut recipe = BiomeRecipe::with_seed(3);
        recipe.structures.clear();
        assert_eq!(recipe.structure_rarity(BEACON_STRUCTURE), None);
    }

    #[test]
    fn test_streaming_config_validation() {
        assert!(StreamingConfig::default().validate().is_ok());

        let config = StreamingConfig::from_toml_str("tile_size = 32.0\nmargin_chunks = 2").unwrap();
        assert_eq!(config.margin_chunks, 2);
        assert_eq!(config.chunk_width, 16);

        let bad = StreamingConfig {
            tile_size: 0.0,
            ..StreamingConfig::default()
        };
        assert!(matches!(bad.validate(), Err(WorldError::InvalidTileSize(_))));

        let bad = StreamingConfig {
            chunk_height: 0,
            ..StreamingConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(WorldError::InvalidChunkSize { width: 16, height: 0 })
        ));
    }
}
