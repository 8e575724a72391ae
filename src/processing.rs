use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::GlobalStats;
use crate::color::{self, MapMode};
use crate::geometry::{self, RenderPoints};
use crate::gradients::{Color, ColorStop, Palette};
use crate::popup::{self, PopupMatch};
use crate::types::{MarkerStyle, PointTree, RawMarker, Town, TownRecord};

/// Resolved color for every display mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeColors {
    pub political: Color,
    pub population: Color,
    pub nation_population: Color,
    pub nation_claims: Color,
    pub claims: Color,
    pub founded: Color,
    pub density: Color,
}

impl ModeColors {
    pub fn get(&self, mode: MapMode) -> Color {
        match mode {
            MapMode::Political => self.political,
            MapMode::Population => self.population,
            MapMode::NationPopulation => self.nation_population,
            MapMode::NationClaims => self.nation_claims,
            MapMode::Claims => self.claims,
            MapMode::Founded => self.founded,
            MapMode::Density => self.density,
        }
    }
}

/// One town as handed to the rendering side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    #[serde(flatten)]
    pub town: TownRecord,
    pub residents_count: usize,
    pub area_chunks: f64,
    pub density: f64,
    pub nation_population: usize,
    pub nation_area_chunks: f64,
    pub founded_at: Option<i64>,
    pub points: RenderPoints,
    pub style: MarkerStyle,
    pub colors: ModeColors,
    /// Raw `(x, z)` boundary for spatial queries and exports.
    #[serde(skip)]
    pub boundary: PointTree,
}

/// Output of one ingestion run. Rebuilt from scratch on every run.
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub records: Vec<ProcessedRecord>,
    pub stats: GlobalStats,
}

pub fn process_markers(markers: &[RawMarker], palette: &Palette) -> Ingestion {
    info!("Processing {} markers...", markers.len());

    let towns = extract_towns(markers);
    info!("Extracted {} towns", towns.len());

    // Nation totals and the date range must be complete before any color
    // is resolved.
    let stats = GlobalStats::collect(&towns);
    match stats.dates {
        Some(range) => info!(
            "{} nations, founding dates {}..{}",
            stats.nations.len(),
            range.min,
            range.max
        ),
        None => info!("{} nations, no readable founding dates", stats.nations.len()),
    }
    for (nation, totals) in stats.nations.iter() {
        debug!(
            "{}: {} residents, {} chunks",
            nation, totals.population, totals.area_chunks
        );
    }

    let records = towns
        .into_par_iter()
        .map(|town| resolve(town, &stats, palette))
        .collect();

    Ingestion { records, stats }
}

/// Extraction and measurement for every eligible marker, in feed order.
pub fn extract_towns(markers: &[RawMarker]) -> Vec<Town> {
    let towns: Vec<Town> = markers
        .par_iter()
        .filter(|marker| marker.is_eligible())
        .filter_map(measure_town)
        .collect();

    let eligible = markers.iter().filter(|m| m.is_eligible()).count();
    if eligible > towns.len() {
        debug!("{} polygon popups were not towns", eligible - towns.len());
    }
    towns
}

pub fn measure_town(marker: &RawMarker) -> Option<Town> {
    let record = match popup::extract(marker.popup.as_deref()?) {
        PopupMatch::Town(record) => record,
        PopupMatch::NotATown => return None,
    };

    let founded_at = popup::parse_founded(&record.founded_text);
    if founded_at.is_none() {
        debug!("Unreadable founding date {:?} for {}", record.founded_text, record.name);
    }

    Some(Town {
        population: record.population(),
        area_chunks: geometry::area_chunks(&marker.points),
        founded_at,
        boundary: marker.points.clone(),
        style: marker.style.clone(),
        record,
    })
}

pub fn resolve(town: Town, stats: &GlobalStats, palette: &Palette) -> ProcessedRecord {
    let nation = stats.nations.for_town(&town);
    let density = color::density(town.population, town.area_chunks);
    let has_nation = town.nation().is_some();

    let nation_color = |value: f64, stops: &[ColorStop]| {
        if has_nation {
            color::threshold_color(value, stops, palette.fallback)
        } else {
            palette.no_nation
        }
    };

    let colors = ModeColors {
        political: political_color(&town.style, palette),
        population: color::threshold_color(town.population as f64, &palette.population, palette.fallback),
        nation_population: nation_color(nation.population as f64, palette.nation_population.as_slice()),
        nation_claims: nation_color(nation.area_chunks, palette.nation_claims.as_slice()),
        claims: color::threshold_color(town.area_chunks, &palette.claims, palette.fallback),
        founded: color::founded_color(town.founded_at, stats.dates, palette),
        density: color::interpolate_rgb(density, &palette.density, palette.fallback),
    };

    ProcessedRecord {
        residents_count: town.population,
        area_chunks: town.area_chunks,
        density,
        nation_population: nation.population,
        nation_area_chunks: nation.area_chunks,
        founded_at: town.founded_at,
        points: geometry::normalize_points(&town.boundary),
        style: town.style,
        colors,
        boundary: town.boundary,
        town: town.record,
    }
}

/// The marker's own fill, then its stroke, then the neutral color.
fn political_color(style: &MarkerStyle, palette: &Palette) -> Color {
    [style.fill_color.as_deref(), style.color.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|text| Color::parse_hex(text).ok())
        .unwrap_or(palette.no_nation)
}
