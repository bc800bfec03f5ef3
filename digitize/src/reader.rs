//! Reads a user's digitized polylines into per-column pixel values.

use crate::{math::Interp1d, DigitizeError, Kind};
use geo::geometry::Coord;
use itertools::Itertools;
use log::{debug, warn};
use radargram::RadarKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

const MAX_PIXEL: f64 = u16::MAX as f64;

/// A submission document as posted by the digitizing tool.
///
/// Only `features` is required to read a document; older documents
/// lack the metadata fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub date_modified: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar_key: Option<String>,

    /// Rendered image height in pixels.
    #[serde(default)]
    pub height: u32,

    /// Rendered image width in pixels.
    #[serde(default)]
    pub width: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    pub features: FeatureList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureList {
    #[serde(rename = "type")]
    pub type_: String,
    pub features: Vec<RawFeature>,
}

/// A feature as submitted. Geometry is kept loosely typed so that one
/// malformed line does not reject the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(rename = "type")]
    pub type_: String,
    pub geometry: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// A well-formed, labeled polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Position of the feature in the submission.
    pub line: usize,
    pub kind: Kind,
    pub vertices: Vec<Coord<f64>>,
}

/// One evaluated pixel of an [Annotation].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpretationRow {
    pub kind: Kind,
    pub x: u16,
    pub y: u16,
    pub line: usize,
}

/// Everything one user digitized on one radargram.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationTable {
    pub radar_key: RadarKey,
    pub user: String,
    pub rows: Vec<InterpretationRow>,
}

impl Submission {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DigitizeError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, DigitizeError> {
        Ok(serde_json::from_reader(rdr)?)
    }

    /// Returns the submission's well-formed features with their kind
    /// resolved.
    ///
    /// Features whose geometry is not a non-empty list of `[x, y]`
    /// pairs are skipped. A well-formed feature with an unknown kind,
    /// or with neither `kind` nor `name`, is an error.
    pub fn annotations(&self) -> Result<Vec<Annotation>, DigitizeError> {
        let mut annotations = Vec::with_capacity(self.features.features.len());
        for (line, feature) in self.features.features.iter().enumerate() {
            let Some(vertices) = vertices(&feature.geometry) else {
                warn!("skipping feature {line}: malformed geometry");
                continue;
            };
            if vertices.is_empty() {
                debug!("skipping feature {line}: no vertices");
                continue;
            }
            let kind = resolve_kind(line, feature.properties.as_ref())?;
            annotations.push(Annotation {
                line,
                kind,
                vertices,
            });
        }
        Ok(annotations)
    }

    /// Evaluates every annotation at the columns of `grid`, or at every
    /// column it spans when there is no grid.
    pub fn interpret(&self, grid: Option<&[u16]>) -> Result<Vec<InterpretationRow>, DigitizeError> {
        let grid = grid.map(|grid| {
            let mut grid = grid.to_vec();
            grid.sort_unstable();
            grid.dedup();
            grid
        });
        let mut rows = Vec::new();
        for annotation in self.annotations()? {
            let samples = annotation.sample(grid.as_deref())?;
            rows.extend(samples.into_iter().map(|(x, y)| InterpretationRow {
                kind: annotation.kind,
                x,
                y,
                line: annotation.line,
            }));
        }
        Ok(rows)
    }
}

impl Annotation {
    /// Returns the `(x, y)` pixels of this polyline, see
    /// [sample_feature].
    pub fn sample(&self, grid: Option<&[u16]>) -> Result<Vec<(u16, u16)>, DigitizeError> {
        sample_feature(&self.vertices, grid).map_err(|e| match e {
            DigitizeError::NonMonotonic(_) => DigitizeError::NonMonotonic(self.line),
            e => e,
        })
    }
}

/// Reads the submission at `path` and evaluates it.
///
/// `user` and `radar_key` missing from the document are taken from
/// the path, which is expected to end in
/// `<user>/<radar_key>/<file>.json`.
pub fn read_interpretation<P: AsRef<Path>>(
    path: P,
    grid: Option<&[u16]>,
) -> Result<InterpretationTable, DigitizeError> {
    let path = path.as_ref();
    let submission = Submission::load(path)?;

    let mut ancestors = path.ancestors().skip(1);
    let key_dir = ancestors.next().and_then(dir_name);
    let user_dir = ancestors.next().and_then(dir_name);

    let radar_key: RadarKey = submission
        .radar_key
        .as_deref()
        .or(key_dir)
        .ok_or(DigitizeError::Submission("radar_key"))?
        .parse()?;
    let user = submission
        .user
        .as_deref()
        .or(user_dir)
        .ok_or(DigitizeError::Submission("user"))?
        .to_owned();

    let rows = submission.interpret(grid)?;
    debug!("read {path:?}; user: {user}, rows: {}", rows.len());
    Ok(InterpretationTable {
        radar_key,
        user,
        rows,
    })
}

/// Returns `(x, y)` pixels of one polyline.
///
/// Vertices are ordered by x and x is rounded to whole pixels, ties to
/// even. Vertices landing on the same pixel are merged into their mean
/// y. The merged polyline is then interpolated linearly at `grid`
/// columns inside its span or, without a grid, at every column of its
/// span. Columns outside `[0, 65535]` are dropped and y is rounded,
/// ties to even, and clamped to `[0, 65535]`.
///
/// `grid` must be sorted and free of duplicates.
pub fn sample_feature(
    vertices: &[Coord<f64>],
    grid: Option<&[u16]>,
) -> Result<Vec<(u16, u16)>, DigitizeError> {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    if sorted.windows(2).any(|w| !(w[0].x <= w[1].x)) || sorted.iter().any(|c| !c.x.is_finite()) {
        return Err(DigitizeError::NonMonotonic(0));
    }

    let (xs, ys) = compress(&sorted);
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return Ok(Vec::new());
    };
    let model = Interp1d::linear(&xs, &ys)?;

    let columns: Vec<f64> = match grid {
        None => {
            #[allow(clippy::cast_possible_truncation)]
            let (lo, hi) = (first.max(0.0) as i64, last.min(MAX_PIXEL) as i64);
            #[allow(clippy::cast_precision_loss)]
            let dense = (lo..=hi).map(|x| x as f64).collect();
            dense
        }
        Some(grid) => grid
            .iter()
            .map(|&x| f64::from(x))
            .filter(|&x| first <= x && x <= last)
            .collect(),
    };

    Ok(columns
        .into_iter()
        .map(|x| {
            let y = model.eval(x).round_ties_even().clamp(0.0, MAX_PIXEL);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pixel = (x as u16, y as u16);
            pixel
        })
        .collect())
}

/// Rounds x to pixels and averages y over runs of equal pixels.
fn compress(sorted: &[Coord<f64>]) -> (Vec<f64>, Vec<f64>) {
    sorted
        .iter()
        .group_by(|c| c.x.round_ties_even())
        .into_iter()
        .map(|(x, run)| {
            let (sum, n) = run.fold((0.0, 0u32), |(sum, n), c| (sum + c.y, n + 1));
            (x, sum / f64::from(n))
        })
        .unzip()
}

/// Returns the vertices of a geometry whose `coordinates` are a list
/// of `[x, y]` number pairs, or `None` for anything else.
fn vertices(geometry: &Value) -> Option<Vec<Coord<f64>>> {
    geometry
        .get("coordinates")?
        .as_array()?
        .iter()
        .map(|pair| match pair.as_array()?.as_slice() {
            [x, y] => Some(Coord {
                x: x.as_f64()?,
                y: y.as_f64()?,
            }),
            _ => None,
        })
        .collect()
}

fn resolve_kind(line: usize, properties: Option<&Map<String, Value>>) -> Result<Kind, DigitizeError> {
    let properties = properties.ok_or(DigitizeError::Unlabeled(line))?;
    if let Some(kind) = properties.get("kind") {
        return match kind.as_str() {
            Some(kind) => kind.parse(),
            None => Err(DigitizeError::Kind(kind.to_string())),
        };
    }
    match properties.get("name") {
        Some(Value::String(name)) => Kind::from_legacy_name(name),
        Some(name) => Err(DigitizeError::Kind(name.to_string())),
        None => Err(DigitizeError::Unlabeled(line)),
    }
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

#[cfg(test)]
mod tests {
    use super::{read_interpretation, sample_feature, Coord, Submission};
    use crate::{DigitizeError, Kind};
    use serde_json::json;
    use std::fs;

    fn coords(pairs: &[(f64, f64)]) -> Vec<Coord<f64>> {
        pairs.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn submission(features: serde_json::Value) -> Submission {
        serde_json::from_value(json!({
            "date_modified": "2024-05-10T12:00:00",
            "radar_key": "amenfonna-20240507-DAT_0042_A1",
            "height": 400,
            "width": 1000,
            "user": "satu",
            "features": {"type": "FeatureCollection", "features": features},
        }))
        .unwrap()
    }

    fn line(coordinates: serde_json::Value, properties: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": coordinates},
            "properties": properties,
        })
    }

    #[test]
    fn test_dense_fill() {
        let samples =
            sample_feature(&coords(&[(4.0, 10.0), (0.0, 0.0), (2.0, 8.0)]), None).unwrap();
        assert_eq!(samples, vec![(0, 0), (1, 4), (2, 8), (3, 9), (4, 10)]);
    }

    #[test]
    fn test_duplicate_columns_are_averaged() {
        let samples = sample_feature(
            &coords(&[(0.0, 10.0), (0.0, 20.0), (0.0, 30.0), (10.0, 40.0)]),
            None,
        )
        .unwrap();
        assert_eq!(samples.len(), 11);
        assert_eq!(samples[0], (0, 20));
        assert_eq!(samples[5], (5, 30));
        assert_eq!(samples[10], (10, 40));
    }

    #[test]
    fn test_x_rounds_half_to_even() {
        // 0.5 -> 0 and 1.5 -> 2.
        let samples = sample_feature(&coords(&[(0.5, 0.0), (1.5, 4.0)]), None).unwrap();
        assert_eq!(samples, vec![(0, 0), (1, 2), (2, 4)]);
    }

    #[test]
    fn test_y_rounded_and_clamped() {
        let samples = sample_feature(&coords(&[(0.0, -3.0), (1.0, 2.5), (2.0, 70_000.0)]), None)
            .unwrap();
        assert_eq!(samples, vec![(0, 0), (1, 2), (2, u16::MAX)]);
    }

    #[test]
    fn test_negative_columns_dropped() {
        let samples = sample_feature(&coords(&[(-2.0, 0.0), (2.0, 8.0)]), None).unwrap();
        assert_eq!(samples, vec![(0, 4), (1, 6), (2, 8)]);
    }

    #[test]
    fn test_grid_stays_inside_span() {
        let vertices = coords(&[(10.0, 100.0), (20.0, 200.0), (30.0, 100.0)]);
        let grid = [0, 5, 10, 15, 25, 30, 35, 60_000];
        let samples = sample_feature(&vertices, Some(&grid)).unwrap();
        let xs: Vec<u16> = samples.iter().map(|s| s.0).collect();
        assert_eq!(xs, vec![10, 15, 25, 30]);
        assert_eq!(samples[1], (15, 150));
        assert_eq!(samples[2], (25, 150));

        let outside = sample_feature(&vertices, Some(&[0, 40])).unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_single_vertex() {
        let samples = sample_feature(&coords(&[(7.4, 3.0)]), None).unwrap();
        assert_eq!(samples, vec![(7, 3)]);
    }

    #[test]
    fn test_annotations() {
        let doc = submission(json!([
            line(json!([[0, 1], [2, 3]]), json!({"kind": "bed_cold"})),
            line(json!([[0, 1, 2]]), json!({"kind": "bed_cold"})),
            line(json!([]), json!({"kind": "bed_cold"})),
            {"type": "Feature", "geometry": {"type": "Point"}, "properties": {}},
            line(json!([[5, 5], [9, 9]]), json!({"name": "Temperate ice"})),
        ]));
        let annotations = doc.annotations().unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].line, 0);
        assert_eq!(annotations[0].kind, Kind::BedCold);
        assert_eq!(annotations[1].line, 4);
        assert_eq!(annotations[1].kind, Kind::TemperateIce);
    }

    #[test]
    fn test_explicit_kind_wins_over_name() {
        let doc = submission(json!([line(
            json!([[0, 0], [1, 1]]),
            json!({"kind": "bed_missing", "name": "Glacier bed"})
        )]));
        assert_eq!(doc.annotations().unwrap()[0].kind, Kind::BedMissing);
    }

    #[test]
    fn test_bad_labels_are_fatal() {
        let doc = submission(json!([line(json!([[0, 0], [1, 1]]), json!({"name": "Moraine"}))]));
        assert!(matches!(doc.annotations(), Err(DigitizeError::Kind(_))));

        let doc = submission(json!([line(json!([[0, 0], [1, 1]]), json!({"kind": "moraine"}))]));
        assert!(matches!(doc.annotations(), Err(DigitizeError::Kind(_))));

        let doc = submission(json!([line(json!([[0, 0], [1, 1]]), json!({}))]));
        assert!(matches!(doc.annotations(), Err(DigitizeError::Unlabeled(0))));
    }

    #[test]
    fn test_interpret_with_grid() {
        let doc = submission(json!([
            line(json!([[0, 0], [10, 100]]), json!({"kind": "bed_unspecified"})),
            line(json!([[20, 50], [40, 50]]), json!({"name": "Cold glacier bed"})),
        ]));
        let rows = doc.interpret(Some(&[30, 5, 10, 5])).unwrap();
        let found: Vec<_> = rows.iter().map(|r| (r.kind, r.x, r.y, r.line)).collect();
        assert_eq!(
            found,
            vec![
                (Kind::BedUnspecified, 5, 50, 0),
                (Kind::BedUnspecified, 10, 100, 0),
                (Kind::BedCold, 30, 50, 1),
            ]
        );
    }

    #[test]
    fn test_read_with_path_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let key_dir = dir
            .path()
            .join("kari")
            .join("amenfonna-20240507-DAT_0042_A1");
        fs::create_dir_all(&key_dir).unwrap();
        let path = key_dir.join("digitized.json");
        let doc = json!({
            "date_modified": "2024-05-10T12:00:00",
            "height": 400,
            "width": 1000,
            "features": {"type": "FeatureCollection", "features": [
                line(json!([[0, 0], [2, 2]]), json!({"kind": "bed_cold"})),
            ]},
        });
        fs::write(&path, doc.to_string()).unwrap();

        let table = read_interpretation(&path, None).unwrap();
        assert_eq!(table.user, "kari");
        assert_eq!(table.radar_key.to_string(), "amenfonna-20240507-DAT_0042_A1");
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_read_features_only() {
        let dir = tempfile::tempdir().unwrap();
        let key_dir = dir
            .path()
            .join("ola")
            .join("amenfonna-20240507-DAT_0042_A1");
        fs::create_dir_all(&key_dir).unwrap();
        let path = key_dir.join("digitized.json");
        let doc = json!({
            "features": {"type": "FeatureCollection", "features": [
                line(json!([[0, 5], [4, 5]]), json!({"name": "Glacier bed"})),
            ]},
        });
        fs::write(&path, doc.to_string()).unwrap();

        let table = read_interpretation(&path, Some(&[0, 2, 4])).unwrap();
        assert_eq!(table.user, "ola");
        let found: Vec<_> = table.rows.iter().map(|r| (r.kind, r.x, r.y)).collect();
        assert_eq!(
            found,
            vec![
                (Kind::BedUnspecified, 0, 5),
                (Kind::BedUnspecified, 2, 5),
                (Kind::BedUnspecified, 4, 5),
            ]
        );
    }
}
