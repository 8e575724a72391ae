//! Color tables for the choropleth modes.
//!
//! Discrete tables are sorted by descending `min` and are read "first match
//! wins". The density table is a list of ascending control points that gets
//! interpolated between.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaletteError {
    #[error("invalid hex color: {0:?}")]
    InvalidColor(String),

    #[error("gradient `{0}` has no entries")]
    EmptyTable(String),

    #[error("gradient `{table}` must have strictly decreasing thresholds, found {prev} then {next}")]
    NotDescending { table: String, prev: f64, next: f64 },

    #[error("density stops must have strictly increasing values, found {prev} then {next}")]
    NotAscending { prev: f64, next: f64 },
}

/// 8-bit RGB color, written out as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Parses `#RRGGBB` or `RRGGBB`, case-insensitive.
    pub fn parse_hex(text: &str) -> Result<Self, PaletteError> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PaletteError::InvalidColor(text.to_string()));
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| PaletteError::InvalidColor(text.to_string()))?;
        Ok(Self::hex(value))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// HSL to RGB. Hue in degrees, saturation and lightness in `0..=1`.
    pub fn from_hsl(hue_deg: f64, saturation: f64, lightness: f64) -> Self {
        let h = hue_deg.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Self::rgb(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 1.0 / 2.0 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        }

        let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::rgb(
            to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
            to_u8(hue_to_channel(p, q, h)),
            to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::parse_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub min: f64,
    pub color: Color,
}

impl ColorStop {
    pub const fn new(min: f64, color: u32) -> Self {
        Self { min, color: Color::hex(color) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorControlPoint {
    pub val: f64,
    pub color: Color,
}

impl ColorControlPoint {
    pub const fn new(val: f64, r: u8, g: u8, b: u8) -> Self {
        Self { val, color: Color::rgb(r, g, b) }
    }
}

pub const POPULATION_GRADIENT: &[ColorStop] = &[
    ColorStop::new(301.0, 0x006600),
    ColorStop::new(201.0, 0x008800),
    ColorStop::new(151.0, 0x00AA00),
    ColorStop::new(101.0, 0x00CC00),
    ColorStop::new(81.0, 0x00FF00),
    ColorStop::new(49.0, 0x66FF00),
    ColorStop::new(37.0, 0x99FF00),
    ColorStop::new(29.0, 0xCCFF00),
    ColorStop::new(21.0, 0xEEEE00),
    ColorStop::new(17.0, 0xFFCC00),
    ColorStop::new(13.0, 0xFF6600),
    ColorStop::new(9.0, 0xFF2200),
    ColorStop::new(7.0, 0xEE0000),
    ColorStop::new(5.0, 0x7C0000),
    ColorStop::new(3.0, 0x4D0000),
    ColorStop::new(2.0, 0x2D0000),
    ColorStop::new(1.0, 0x1F0000),
];

pub const NATION_POPULATION_GRADIENT: &[ColorStop] = &[
    ColorStop::new(2048.0, 0x006600),
    ColorStop::new(1536.0, 0x008800),
    ColorStop::new(1024.0, 0x00AA00),
    ColorStop::new(768.0, 0x00CC00),
    ColorStop::new(512.0, 0x00FF00),
    ColorStop::new(384.0, 0x66FF00),
    ColorStop::new(256.0, 0x99FF00),
    ColorStop::new(196.0, 0xCCFF00),
    ColorStop::new(128.0, 0xEEEE00),
    ColorStop::new(96.0, 0xFFF200),
    ColorStop::new(64.0, 0xFFC400),
    ColorStop::new(48.0, 0xFF6600),
    ColorStop::new(32.0, 0xFF2200),
    ColorStop::new(24.0, 0xEE0000),
    ColorStop::new(16.0, 0x7C0000),
    ColorStop::new(8.0, 0x4D0000),
    ColorStop::new(4.0, 0x2D0000),
    ColorStop::new(1.0, 0x1F0000),
];

pub const CLAIMS_GRADIENT: &[ColorStop] = &[
    ColorStop::new(2048.0, 0x006600),
    ColorStop::new(1536.0, 0x008800),
    ColorStop::new(1024.0, 0x00AA00),
    ColorStop::new(896.0, 0x00CC00),
    ColorStop::new(768.0, 0x00FF00),
    ColorStop::new(640.0, 0x66FF00),
    ColorStop::new(512.0, 0x99FF00),
    ColorStop::new(384.0, 0xCCFF00),
    ColorStop::new(256.0, 0xEEEE00),
    ColorStop::new(192.0, 0xFFF200),
    ColorStop::new(128.0, 0xFFC400),
    ColorStop::new(96.0, 0xFF6600),
    ColorStop::new(64.0, 0xFF2200),
    ColorStop::new(48.0, 0xEE0000),
    ColorStop::new(32.0, 0x7C0000),
    ColorStop::new(18.0, 0x4D0000),
    ColorStop::new(9.0, 0x2D0000),
    ColorStop::new(1.0, 0x1F0000),
];

pub const NATION_CLAIMS_GRADIENT: &[ColorStop] = &[
    ColorStop::new(16384.0, 0x006600),
    ColorStop::new(12228.0, 0x008800),
    ColorStop::new(8192.0, 0x00AA00),
    ColorStop::new(6144.0, 0x00CC00),
    ColorStop::new(4096.0, 0x00FF00),
    ColorStop::new(3072.0, 0x66FF00),
    ColorStop::new(2048.0, 0x99FF00),
    ColorStop::new(1536.0, 0xCCFF00),
    ColorStop::new(1024.0, 0xEEEE00),
    ColorStop::new(768.0, 0xFFF200),
    ColorStop::new(512.0, 0xFFC400),
    ColorStop::new(384.0, 0xFF6600),
    ColorStop::new(256.0, 0xFF2200),
    ColorStop::new(128.0, 0xEE0000),
    ColorStop::new(96.0, 0x7C0000),
    ColorStop::new(64.0, 0x4D0000),
    ColorStop::new(32.0, 0x2D0000),
    ColorStop::new(1.0, 0x1F0000),
];

/// Population per chunk, white through navy.
pub const DENSITY_STOPS: &[ColorControlPoint] = &[
    ColorControlPoint::new(0.002, 255, 255, 255),
    ColorControlPoint::new(0.01, 144, 144, 238),
    ColorControlPoint::new(0.03, 82, 82, 206),
    ColorControlPoint::new(0.1, 39, 39, 178),
    ColorControlPoint::new(1.0, 0, 0, 128),
    ColorControlPoint::new(2.0, 0, 0, 96),
];

pub const FALLBACK_COLOR: Color = Color::hex(0x000000);
pub const NO_NATION_COLOR: Color = Color::hex(0x606060);
pub const NO_DATE_COLOR: Color = Color::hex(0x000000);
/// Legend swatch for values under the lowest threshold of a table.
pub const BELOW_RANGE_COLOR: Color = Color::hex(0x1F0000);

/// Every table and sentinel color used to resolve a record.
///
/// Built from the constants above; a config file may replace any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub population: Vec<ColorStop>,
    pub claims: Vec<ColorStop>,
    pub nation_population: Vec<ColorStop>,
    pub nation_claims: Vec<ColorStop>,
    pub density: Vec<ColorControlPoint>,
    /// Discrete value below the lowest threshold.
    pub fallback: Color,
    /// Nation modes for towns without a nation.
    pub no_nation: Color,
    /// Founded mode for towns whose date did not parse.
    pub no_date: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            population: POPULATION_GRADIENT.to_vec(),
            claims: CLAIMS_GRADIENT.to_vec(),
            nation_population: NATION_POPULATION_GRADIENT.to_vec(),
            nation_claims: NATION_CLAIMS_GRADIENT.to_vec(),
            density: DENSITY_STOPS.to_vec(),
            fallback: FALLBACK_COLOR,
            no_nation: NO_NATION_COLOR,
            no_date: NO_DATE_COLOR,
        }
    }
}

impl Palette {
    pub fn validate(&self) -> Result<(), PaletteError> {
        let tables = [
            ("population", &self.population),
            ("claims", &self.claims),
            ("nation_population", &self.nation_population),
            ("nation_claims", &self.nation_claims),
        ];
        for (name, stops) in tables {
            if stops.is_empty() {
                return Err(PaletteError::EmptyTable(name.to_string()));
            }
            for pair in stops.windows(2) {
                // Negated so NaN thresholds are rejected too.
                if !(pair[0].min > pair[1].min) {
                    return Err(PaletteError::NotDescending {
                        table: name.to_string(),
                        prev: pair[0].min,
                        next: pair[1].min,
                    });
                }
            }
        }

        if self.density.is_empty() {
            return Err(PaletteError::EmptyTable("density".to_string()));
        }
        for pair in self.density.windows(2) {
            if !(pair[0].val < pair[1].val) {
                return Err(PaletteError::NotAscending {
                    prev: pair[0].val,
                    next: pair[1].val,
                });
            }
        }
        Ok(())
    }
}
