//! Geographic extent extraction from capability descriptions.
//!
//! Upstream services encode bounding boxes four different ways. Encodings are
//! tried in a fixed order and the first key present wins outright: a present
//! but unparsable box yields no extent rather than falling through to a later
//! encoding.

use foundation::Extent;
use serde::Deserialize;
use serde_json::Value;

/// A coordinate serialized as either a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Coord {
    Num(f64),
    Text(String),
}

impl Coord {
    fn value(&self) -> Option<f64> {
        match self {
            Coord::Num(n) => Some(*n),
            Coord::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Corner-pair form: each corner is a `"lon lat"` string.
#[derive(Debug, Clone, Deserialize)]
struct CornerPairBox {
    #[serde(rename = "LowerCorner")]
    lower: String,
    #[serde(rename = "UpperCorner")]
    upper: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MinMaxBox {
    minx: Coord,
    miny: Coord,
    maxx: Coord,
    maxy: Coord,
}

#[derive(Debug, Clone, Deserialize)]
struct CompassBox {
    #[serde(rename = "westBoundLongitude")]
    west: Coord,
    #[serde(rename = "southBoundLatitude")]
    south: Coord,
    #[serde(rename = "eastBoundLongitude")]
    east: Coord,
    #[serde(rename = "northBoundLatitude")]
    north: Coord,
}

#[derive(Debug, Clone, Deserialize)]
struct CardinalBox {
    west: Coord,
    south: Coord,
    east: Coord,
    north: Coord,
}

/// Resolve a layer's geographic extent from its capability description.
///
/// Tie-break order (first key present wins):
/// 1. `WGS84BoundingBox` (corner-pair strings)
/// 2. `LatLonBoundingBox` (min/max attributes)
/// 3. `EX_GeographicBoundingBox` (compass-direction attributes)
/// 4. `BoundingBox` (west/south/east/north attributes)
///
/// Returns `None` when no encoding matches or the winning one fails to
/// parse; zoom-to-extent is a no-op for such layers.
pub fn layer_extent(description: &Value) -> Option<Extent> {
    if let Some(b) = description.get("WGS84BoundingBox") {
        return corner_pair_extent(b);
    }
    if let Some(b) = description.get("LatLonBoundingBox") {
        return min_max_extent(b);
    }
    if let Some(b) = description.get("EX_GeographicBoundingBox") {
        return compass_extent(b);
    }
    if let Some(b) = description.get("BoundingBox") {
        return cardinal_extent(b);
    }
    None
}

fn corner_pair_extent(b: &Value) -> Option<Extent> {
    let b: CornerPairBox = serde_json::from_value(b.clone()).ok()?;
    let (west, south) = split_corner(&b.lower)?;
    let (east, north) = split_corner(&b.upper)?;
    Some(Extent::from_degrees(west, south, east, north))
}

fn split_corner(corner: &str) -> Option<(f64, f64)> {
    let mut parts = corner.split_whitespace();
    let lon = parts.next().and_then(|p| p.parse::<f64>().ok())?;
    let lat = parts.next().and_then(|p| p.parse::<f64>().ok())?;
    Some((lon, lat))
}

fn min_max_extent(b: &Value) -> Option<Extent> {
    let b: MinMaxBox = serde_json::from_value(b.clone()).ok()?;
    Some(Extent::from_degrees(
        b.minx.value()?,
        b.miny.value()?,
        b.maxx.value()?,
        b.maxy.value()?,
    ))
}

fn compass_extent(b: &Value) -> Option<Extent> {
    let b: CompassBox = serde_json::from_value(b.clone()).ok()?;
    Some(Extent::from_degrees(
        b.west.value()?,
        b.south.value()?,
        b.east.value()?,
        b.north.value()?,
    ))
}

fn cardinal_extent(b: &Value) -> Option<Extent> {
    let b: CardinalBox = serde_json::from_value(b.clone()).ok()?;
    Some(Extent::from_degrees(
        b.west.value()?,
        b.south.value()?,
        b.east.value()?,
        b.north.value()?,
    ))
}
