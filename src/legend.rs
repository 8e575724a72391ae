use chrono::DateTime;
use serde::Serialize;

use crate::aggregate::DateRange;
use crate::color::{hue_color, MapMode, NEWEST_HUE, OLDEST_HUE};
use crate::gradients::{Color, Palette, BELOW_RANGE_COLOR};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: Color,
    pub label: String,
}

impl LegendEntry {
    fn new(color: Color, label: impl Into<String>) -> Self {
        Self { color, label: label.into() }
    }
}

/// Legend rows for a display mode, top to bottom.
pub fn legend(mode: MapMode, palette: &Palette, dates: Option<DateRange>) -> Vec<LegendEntry> {
    match mode {
        MapMode::Political => Vec::new(),
        MapMode::Founded => match dates {
            Some(range) => vec![
                LegendEntry::new(hue_color(OLDEST_HUE), format!("oldest ({})", format_date(range.min))),
                LegendEntry::new(hue_color(NEWEST_HUE), format!("newest ({})", format_date(range.max))),
            ],
            None => Vec::new(),
        },
        MapMode::Density => palette
            .density
            .iter()
            .map(|point| LegendEntry::new(point.color, format!("{} pop/chunk", point.val)))
            .collect(),
        MapMode::Population | MapMode::Claims | MapMode::NationPopulation | MapMode::NationClaims => {
            let stops = mode.stops(palette).unwrap_or_default();
            let mut entries: Vec<_> = stops
                .iter()
                .map(|stop| LegendEntry::new(stop.color, format!(">= {}", stop.min)))
                .collect();
            if let Some(last) = stops.last().filter(|last| last.min > 1.0) {
                entries.push(LegendEntry::new(BELOW_RANGE_COLOR, format!("< {}", last.min)));
            }
            entries
        }
    }
}

fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
