//! GeoJSON output of aligned points.

use crate::{AlignedPoint, Crs, DigitizeError};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use std::io::Write;

/// Returns `points` as a collection of Point features in
/// [Crs::TARGET], with the CRS named in a `crs` member.
pub fn feature_collection(points: &[AlignedPoint]) -> FeatureCollection {
    let features = points.iter().map(feature).collect();

    let mut crs = JsonObject::new();
    crs.insert("type".to_owned(), JsonValue::from("name"));
    crs.insert(
        "properties".to_owned(),
        serde_json::json!({ "name": format!("urn:ogc:def:crs:EPSG::{}", Crs::TARGET.epsg()) }),
    );
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("crs".to_owned(), JsonValue::Object(crs));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}

fn feature(p: &AlignedPoint) -> Feature {
    let properties = serde_json::json!({
        "radar_key": p.radar_key.to_string(),
        "user": p.user,
        "kind": p.kind.as_str(),
        "line_i": p.line,
        "x": p.x,
        "y": p.y,
        "depth": p.depth,
        "twtt": p.twtt,
        "easting": p.easting,
        "northing": p.northing,
        "elevation": p.elevation,
        "distance": p.distance,
        "part_idx": p.part,
        "antenna": p.antenna,
        "year": p.year,
        "glacier": p.glacier,
    });
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![p.easting, p.northing]))),
        id: None,
        properties: match properties {
            JsonValue::Object(properties) => Some(properties),
            _ => None,
        },
        foreign_members: None,
    }
}

/// Writes `points` as a GeoJSON document to `writer`.
pub fn write_geojson<W: Write>(writer: W, points: &[AlignedPoint]) -> Result<(), DigitizeError> {
    serde_json::to_writer(writer, &feature_collection(points))?;
    Ok(())
}
