use crate::aggregate::DateRange;
use crate::config::AppConfig;
use crate::geometry;
use crate::gradients::Palette;
use crate::legend::{legend, LegendEntry};
use crate::processing::{Ingestion, ProcessedRecord};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

/// Bounding box of one town, pointing back into the record list.
pub struct TownIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for TownIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub records: Vec<ProcessedRecord>,
    pub shapes: Vec<MultiPolygon<f64>>,
    pub tree: RTree<TownIndex>,
    pub palette: Palette,
    pub dates: Option<DateRange>,
}

impl AppState {
    pub fn new(ingestion: Ingestion, palette: Palette) -> Self {
        let shapes: Vec<MultiPolygon<f64>> = ingestion
            .records
            .iter()
            .map(|record| geometry::to_multi_polygon(&record.boundary))
            .collect();

        let tree_items: Vec<TownIndex> = shapes
            .iter()
            .enumerate()
            .filter_map(|(index, shape)| {
                let rect = shape.bounding_rect()?;
                Some(TownIndex {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self {
            records: ingestion.records,
            shapes,
            tree: RTree::bulk_load(tree_items),
            palette,
            dates: ingestion.stats.dates,
        }
    }

    /// The town whose boundary contains the grid point `(x, z)`.
    pub fn town_at(&self, x: f64, z: f64) -> Option<&ProcessedRecord> {
        let point = Point::new(x, z);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, z]))
            .find(|candidate| self.shapes[candidate.index].contains(&point))
            .and_then(|candidate| self.records.get(candidate.index))
    }
}

#[derive(Deserialize)]
pub struct QueryParams {
    x: f64,
    z: f64,
}

pub fn router(state: Arc<AppState>, static_dir: Option<&std::path::Path>) -> Router {
    let mut app = Router::new()
        .route("/api/records", get(records_handler))
        .route("/api/query", get(query_handler))
        .route("/api/legend/:mode", get(legend_handler));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: &AppConfig, ingestion: Ingestion) -> Result<()> {
    info!("Building spatial index for {} towns...", ingestion.records.len());
    let state = Arc::new(AppState::new(ingestion, config.palette.clone()));
    info!("Spatial index built.");

    let app = router(state, config.server.static_dir.as_deref());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn records_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ProcessedRecord>> {
    Json(state.records.clone())
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<ProcessedRecord>> {
    Json(state.town_at(params.x, params.z).cloned())
}

async fn legend_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
) -> Result<Json<Vec<LegendEntry>>, StatusCode> {
    let mode = mode.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(legend(mode, &state.palette, state.dates)))
}
