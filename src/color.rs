//! Scalar to color mapping for each display mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aggregate::DateRange;
use crate::gradients::{Color, ColorControlPoint, ColorStop, Palette};

/// Hue of the oldest town on the founded ramp.
pub const OLDEST_HUE: f64 = 240.0;
/// Hue of the newest town on the founded ramp.
pub const NEWEST_HUE: f64 = 0.0;
/// Used for every dated town when all dates are equal.
pub const MID_RAMP_HUE: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapMode {
    Political,
    Population,
    Claims,
    NationPopulation,
    NationClaims,
    Founded,
    Density,
}

impl MapMode {
    pub const ALL: [MapMode; 7] = [
        MapMode::Political,
        MapMode::Population,
        MapMode::Claims,
        MapMode::NationPopulation,
        MapMode::NationClaims,
        MapMode::Founded,
        MapMode::Density,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MapMode::Political => "political",
            MapMode::Population => "population",
            MapMode::Claims => "claims",
            MapMode::NationPopulation => "nationPopulation",
            MapMode::NationClaims => "nationClaims",
            MapMode::Founded => "founded",
            MapMode::Density => "density",
        }
    }

    /// Threshold table behind a discrete mode.
    pub fn stops(self, palette: &Palette) -> Option<&[ColorStop]> {
        match self {
            MapMode::Population => Some(&palette.population),
            MapMode::Claims => Some(&palette.claims),
            MapMode::NationPopulation => Some(&palette.nation_population),
            MapMode::NationClaims => Some(&palette.nation_claims),
            MapMode::Political | MapMode::Founded | MapMode::Density => None,
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MapMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = MapMode::ALL.iter().map(|m| m.name()).collect();
                format!("unknown map mode {s:?}, expected one of: {}", names.join(", "))
            })
    }
}

/// Color of the first stop whose `min` does not exceed `value`.
pub fn threshold_color(value: f64, stops: &[ColorStop], fallback: Color) -> Color {
    stops
        .iter()
        .find(|stop| value >= stop.min)
        .map_or(fallback, |stop| stop.color)
}

/// Piecewise-linear RGB between ascending control points, clamped at both ends.
pub fn interpolate_rgb(value: f64, points: &[ColorControlPoint], fallback: Color) -> Color {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return fallback;
    };
    if value <= first.val {
        return first.color;
    }
    if value >= last.val {
        return last.color;
    }

    points
        .windows(2)
        .find(|pair| value >= pair[0].val && value <= pair[1].val)
        .map_or(fallback, |pair| {
            let (start, end) = (pair[0], pair[1]);
            let t = (value - start.val) / (end.val - start.val);
            let channel = |a: u8, b: u8| {
                (f64::from(a) + t * (f64::from(b) - f64::from(a))).round() as u8
            };
            Color::rgb(
                channel(start.color.r, end.color.r),
                channel(start.color.g, end.color.g),
                channel(start.color.b, end.color.b),
            )
        })
}

/// Hue for a founding timestamp: 240 for the oldest town down to 0 for the
/// newest.
pub fn ramp_hue(timestamp: i64, range: Option<DateRange>) -> f64 {
    match range {
        Some(range) if !range.is_degenerate() => {
            let ratio = (timestamp - range.min) as f64 / (range.max - range.min) as f64;
            OLDEST_HUE - ratio.clamp(0.0, 1.0) * (OLDEST_HUE - NEWEST_HUE)
        }
        _ => MID_RAMP_HUE,
    }
}

pub fn hue_color(hue: f64) -> Color {
    Color::from_hsl(hue, 1.0, 0.5)
}

pub fn founded_color(founded_at: Option<i64>, range: Option<DateRange>, palette: &Palette) -> Color {
    match founded_at {
        Some(ts) => hue_color(ramp_hue(ts, range)),
        None => palette.no_date,
    }
}

/// Residents per chunk, 0 for towns without area.
pub fn density(population: usize, area_chunks: f64) -> f64 {
    if area_chunks > 0.0 {
        population as f64 / area_chunks
    } else {
        0.0
    }
}
