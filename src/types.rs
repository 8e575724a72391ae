use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker type as it appears in the feed. Anything that is not a polygon
/// (icons, lines, circles) collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Polygon,
    #[default]
    #[serde(other)]
    Other,
}

/// A single point on the block grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub x: f64,
    pub z: f64,
}

impl GridPoint {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let x = value.get("x")?.as_f64()?;
        let z = value.get("z")?.as_f64()?;
        Some(Self { x, z })
    }
}

/// Boundary of a marker: either one ring of points or a list of nested trees
/// (multi-ring towns, detached claims).
///
/// Deserialization never fails. Anything that is not an array becomes an
/// empty group, and entries of a ring that lack numeric `x`/`z` are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum PointTree {
    Ring(Vec<GridPoint>),
    Group(Vec<PointTree>),
}

impl Default for PointTree {
    fn default() -> Self {
        PointTree::Group(Vec::new())
    }
}

impl From<Value> for PointTree {
    fn from(value: Value) -> Self {
        let Value::Array(items) = value else {
            return PointTree::default();
        };

        // The first element decides the shape, like the feed producer does.
        if items.first().and_then(GridPoint::from_value).is_some() {
            PointTree::Ring(items.iter().filter_map(GridPoint::from_value).collect())
        } else {
            PointTree::Group(items.into_iter().map(PointTree::from).collect())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMarker {
    #[serde(rename = "type", default)]
    pub kind: MarkerKind,
    #[serde(default)]
    pub popup: Option<String>,
    #[serde(default)]
    pub points: PointTree,
    #[serde(flatten)]
    pub style: MarkerStyle,
}

impl RawMarker {
    /// Only polygons with popup markup can describe a town.
    pub fn is_eligible(&self) -> bool {
        self.kind == MarkerKind::Polygon
            && self.popup.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerLayer {
    pub id: String,
    pub markers: Vec<RawMarker>,
}

/// Top level of a marker document: the full layer list served by the map,
/// or just the markers of one layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MarkerFeed {
    Layers(Vec<MarkerLayer>),
    Markers(Vec<RawMarker>),
}

impl MarkerFeed {
    pub fn into_markers(self, layer_id: &str) -> Option<Vec<RawMarker>> {
        match self {
            MarkerFeed::Markers(markers) => Some(markers),
            MarkerFeed::Layers(layers) if layers.is_empty() => Some(Vec::new()),
            MarkerFeed::Layers(layers) => layers
                .into_iter()
                .find(|layer| layer.id == layer_id)
                .map(|layer| layer.markers),
        }
    }
}

/// Attributes read out of a town popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TownRecord {
    pub name: String,
    pub nation_name: Option<String>,
    pub board: String,
    pub mayor: String,
    pub councillors: String,
    pub founded_text: String,
    pub pvp: bool,
    pub public: bool,
    pub residents: Vec<String>,
}

impl TownRecord {
    pub fn population(&self) -> usize {
        self.residents.len()
    }
}

/// A town after extraction and measurement, before any global pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Town {
    pub record: TownRecord,
    pub boundary: PointTree,
    pub style: MarkerStyle,
    pub population: usize,
    pub area_chunks: f64,
    /// Founding date as Unix milliseconds, `None` when the text did not parse.
    pub founded_at: Option<i64>,
}

impl Town {
    pub fn nation(&self) -> Option<&str> {
        self.record.nation_name.as_deref()
    }
}
