//! Global pass over all towns: nation totals and the founding date range.
//!
//! Both are only meaningful once every town has been seen, so they are built
//! together into a [`GlobalStats`] value that color resolution reads.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::types::Town;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NationTotals {
    pub population: usize,
    pub area_chunks: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationTable {
    totals: HashMap<String, NationTotals>,
}

impl NationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals for a nation, zero when it is unknown.
    pub fn get(&self, nation: &str) -> NationTotals {
        self.totals.get(nation).copied().unwrap_or_default()
    }

    pub fn for_town(&self, town: &Town) -> NationTotals {
        town.nation().map(|n| self.get(n)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NationTotals)> {
        self.totals.iter().map(|(name, totals)| (name.as_str(), totals))
    }

    pub fn add(&mut self, nation: &str, population: usize, area_chunks: f64) {
        let entry = self.totals.entry(nation.to_string()).or_default();
        entry.population += population;
        entry.area_chunks += area_chunks;
    }

    fn add_town(mut self, town: &Town) -> Self {
        if let Some(nation) = town.nation().filter(|n| !n.is_empty()) {
            self.add(nation, town.population, town.area_chunks);
        }
        self
    }

    fn merge(mut self, other: NationTable) -> Self {
        for (nation, totals) in other.totals {
            self.add(&nation, totals.population, totals.area_chunks);
        }
        self
    }
}

/// Sums population and claimed chunks per nation. Partial tables are built
/// in parallel and merged, so input order never matters.
pub fn aggregate(towns: &[Town]) -> NationTable {
    towns
        .par_iter()
        .fold(NationTable::new, NationTable::add_town)
        .reduce(NationTable::new, NationTable::merge)
}

/// Oldest and newest founding dates, Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub min: i64,
    pub max: i64,
}

impl DateRange {
    pub fn from_timestamps<I: IntoIterator<Item = i64>>(timestamps: I) -> Option<Self> {
        timestamps.into_iter().fold(None, |range, ts| {
            Some(match range {
                None => DateRange { min: ts, max: ts },
                Some(DateRange { min, max }) => DateRange {
                    min: min.min(ts),
                    max: max.max(ts),
                },
            })
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStats {
    pub nations: NationTable,
    /// `None` when no town has a readable founding date.
    pub dates: Option<DateRange>,
}

impl GlobalStats {
    pub fn collect(towns: &[Town]) -> Self {
        Self {
            nations: aggregate(towns),
            dates: DateRange::from_timestamps(towns.iter().filter_map(|t| t.founded_at)),
        }
    }
}
