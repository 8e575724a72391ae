use geo::algorithm::area::Area;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Serialize;

use crate::types::{GridPoint, PointTree};

/// Grid area of one chunk (16 x 16 blocks).
pub const CHUNK_AREA: f64 = 256.0;

/// Boundary in the map widget's `[row, col]` order, nesting preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RenderPoints {
    Ring(Vec<[f64; 2]>),
    Group(Vec<RenderPoints>),
}

pub fn normalize_points(tree: &PointTree) -> RenderPoints {
    match tree {
        PointTree::Ring(points) => RenderPoints::Ring(points.iter().map(|p| [p.z, p.x]).collect()),
        PointTree::Group(children) => {
            RenderPoints::Group(children.iter().map(normalize_points).collect())
        }
    }
}

/// Unsigned area of a boundary in square grid units.
///
/// Groups are the plain sum of their parts; inner rings are not treated as
/// holes.
pub fn area(tree: &PointTree) -> f64 {
    match tree {
        PointTree::Ring(points) => ring_area(points),
        PointTree::Group(children) => children.iter().map(area).sum(),
    }
}

pub fn area_chunks(tree: &PointTree) -> f64 {
    area(tree) / CHUNK_AREA
}

/// Shoelace area of a single ring, closed implicitly. Fewer than three points
/// enclose nothing.
pub fn ring_area(points: &[GridPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    polygon(points).unsigned_area()
}

/// Every ring of the tree in depth-first order.
pub fn rings(tree: &PointTree) -> Vec<&[GridPoint]> {
    fn walk<'a>(tree: &'a PointTree, out: &mut Vec<&'a [GridPoint]>) {
        match tree {
            PointTree::Ring(points) => out.push(points),
            PointTree::Group(children) => children.iter().for_each(|child| walk(child, out)),
        }
    }

    let mut out = Vec::new();
    walk(tree, &mut out);
    out
}

/// One polygon per ring, in `(x, z)` coordinates.
pub fn to_multi_polygon(tree: &PointTree) -> MultiPolygon<f64> {
    MultiPolygon::new(
        rings(tree)
            .into_iter()
            .filter(|ring| ring.len() >= 3)
            .map(polygon)
            .collect(),
    )
}

fn polygon(points: &[GridPoint]) -> Polygon<f64> {
    let exterior: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.z }).collect();
    Polygon::new(exterior, vec![])
}
