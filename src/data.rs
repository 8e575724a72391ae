use anyhow::{anyhow, Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::config::OutputFormat;
use crate::geometry;
use crate::processing::ProcessedRecord;
use crate::types::{MarkerFeed, RawMarker};

pub fn load_markers(path: &Path, layer_id: &str) -> Result<Vec<RawMarker>> {
    info!("Loading markers from {:?}...", path);
    let file = File::open(path)
        .with_context(|| format!("Failed to open marker feed: {:?}", path))?;
    let markers = parse_feed(BufReader::new(file), layer_id)?;
    info!("Loaded {} markers", markers.len());
    Ok(markers)
}

pub fn parse_feed<R: std::io::Read>(reader: R, layer_id: &str) -> Result<Vec<RawMarker>> {
    let feed: MarkerFeed =
        serde_json::from_reader(reader).context("Failed to parse marker feed")?;
    feed.into_markers(layer_id)
        .ok_or_else(|| anyhow!("Marker layer '{}' not found in feed", layer_id))
}

pub fn write_records(path: &Path, format: OutputFormat, records: &[ProcessedRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, records)
            .context("Failed to write records")?,
        OutputFormat::Geojson => serde_json::to_writer(&mut writer, &to_feature_collection(records)?)
            .context("Failed to write GeoJSON")?,
    }
    writer.flush()?;

    info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

/// One feature per town: a MultiPolygon in raw `[x, z]` grid coordinates,
/// with the record itself (minus points) as properties.
pub fn to_feature_collection(records: &[ProcessedRecord]) -> Result<FeatureCollection> {
    let features = records
        .iter()
        .map(to_feature)
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn to_feature(record: &ProcessedRecord) -> Result<Feature> {
    let polygons = geometry::rings(&record.boundary)
        .into_iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| {
            let mut positions: Vec<Vec<f64>> = ring.iter().map(|p| vec![p.x, p.z]).collect();
            if positions.first() != positions.last() {
                positions.push(positions[0].clone());
            }
            vec![positions]
        })
        .collect();

    let properties = match serde_json::to_value(record)? {
        serde_json::Value::Object(mut map) => {
            map.remove("points");
            map
        }
        _ => JsonObject::new(),
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiPolygon(polygons))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}
