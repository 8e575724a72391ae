//! Town marker ingestion: popup extraction, claim geometry, nation totals and
//! choropleth colors for every map mode.

pub mod aggregate;
pub mod color;
pub mod config;
pub mod data;
pub mod geometry;
pub mod gradients;
pub mod legend;
pub mod popup;
pub mod processing;
pub mod server;
pub mod types;

pub use aggregate::{aggregate, DateRange, GlobalStats, NationTable, NationTotals};
pub use color::MapMode;
pub use gradients::{Color, Palette};
pub use processing::{process_markers, Ingestion, ProcessedRecord};
pub use types::{PointTree, RawMarker, TownRecord};
