//! Processed radargram dataset format.
//!
//! A processed radargram is one JSON document per survey line holding
//! the amplitude grid (depth bins × traces) together with per-trace
//! geolocation and per-row depth and two-way travel time axes. The
//! documents are produced by ingestion and never modified afterwards.

mod error;
mod key;
mod layout;

pub use crate::{error::RadargramError, key::RadarKey, layout::Layout};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::Path,
};

/// Base floating point type used for all axes and coordinates.
pub type C = f64;

/// Dataset-level attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    /// Free-form antenna description, e.g. `"800 MHz shielded"`.
    pub antenna: String,

    /// CRS identifier of `easting`/`northing`, e.g. `"EPSG:32633"`.
    pub crs: String,

    #[serde(rename = "processing-datetime")]
    pub processing_datetime: String,

    /// Nominal seconds between traces.
    #[serde(
        rename = "time-interval",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub time_interval: Option<C>,
}

/// Serialized form of a [Radargram].
///
/// Trace axis arrays have `cols` values, row axis arrays have `rows`
/// values and `data` is the row-major amplitude grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRadargram {
    pub attrs: Attrs,
    pub rows: usize,
    pub cols: usize,
    /// Pixel column per trace, defaults to `0..cols`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<C>>,
    pub time: Vec<C>,
    pub distance: Vec<C>,
    pub easting: Vec<C>,
    pub northing: Vec<C>,
    pub elevation: Vec<C>,
    pub depth: Vec<C>,
    #[serde(rename = "return-time")]
    pub return_time: Vec<C>,
    pub data: Vec<f32>,
}

/// A validated radargram's axes.
///
/// The amplitude grid is shape-checked on load but not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Radargram {
    attrs: Attrs,
    rows: usize,
    cols: usize,
    x: Vec<C>,
    time: Vec<C>,
    distance: Vec<C>,
    easting: Vec<C>,
    northing: Vec<C>,
    elevation: Vec<C>,
    depth: Vec<C>,
    return_time: Vec<C>,
}

impl Radargram {
    /// Returns the radargram read from the JSON document at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RadargramError> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RadargramError::Missing(path.as_ref().to_owned()))
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, RadargramError> {
        let raw: RawRadargram = serde_json::from_reader(rdr)?;
        Self::try_from(raw)
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Number of depth bins.
    pub fn height(&self) -> usize {
        self.rows
    }

    /// Number of traces.
    pub fn width(&self) -> usize {
        self.cols
    }

    pub fn x(&self) -> &[C] {
        &self.x
    }

    pub fn time(&self) -> &[C] {
        &self.time
    }

    pub fn distance(&self) -> &[C] {
        &self.distance
    }

    pub fn easting(&self) -> &[C] {
        &self.easting
    }

    pub fn northing(&self) -> &[C] {
        &self.northing
    }

    pub fn elevation(&self) -> &[C] {
        &self.elevation
    }

    pub fn depth(&self) -> &[C] {
        &self.depth
    }

    pub fn return_time(&self) -> &[C] {
        &self.return_time
    }
}

impl TryFrom<RawRadargram> for Radargram {
    type Error = RadargramError;

    fn try_from(raw: RawRadargram) -> Result<Self, Self::Error> {
        let RawRadargram {
            attrs,
            rows,
            cols,
            x,
            time,
            distance,
            easting,
            northing,
            elevation,
            depth,
            return_time,
            data,
        } = raw;

        let cells = rows.checked_mul(cols).ok_or(RadargramError::Shape {
            name: "data",
            len: data.len(),
            expected: usize::MAX,
        })?;
        check_len("data", &data, cells)?;

        #[allow(clippy::cast_precision_loss)]
        let x = x.unwrap_or_else(|| (0..cols).map(|col| col as C).collect());

        check_len("x", &x, cols)?;
        check_len("time", &time, cols)?;
        check_len("distance", &distance, cols)?;
        check_len("easting", &easting, cols)?;
        check_len("northing", &northing, cols)?;
        check_len("elevation", &elevation, cols)?;
        check_len("depth", &depth, rows)?;
        check_len("return-time", &return_time, rows)?;

        Ok(Self {
            attrs,
            rows,
            cols,
            x,
            time,
            distance,
            easting,
            northing,
            elevation,
            depth,
            return_time,
        })
    }
}

fn check_len<T>(name: &'static str, values: &[T], expected: usize) -> Result<(), RadargramError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(RadargramError::Shape {
            name,
            len: values.len(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Attrs, Radargram, RadargramError, RawRadargram};
    use std::{fs::File, io::Write};

    fn raw(rows: usize, cols: usize) -> RawRadargram {
        RawRadargram {
            attrs: Attrs {
                antenna: "800 MHz shielded".to_owned(),
                crs: "EPSG:32633".to_owned(),
                processing_datetime: "2024-05-10T12:00:00".to_owned(),
                time_interval: None,
            },
            rows,
            cols,
            x: None,
            time: (0..cols).map(|i| i as f64 * 0.5).collect(),
            distance: (0..cols).map(|i| i as f64 * 2.0).collect(),
            easting: (0..cols).map(|i| 500_000.0 + i as f64 * 2.0).collect(),
            northing: vec![8_700_000.0; cols],
            elevation: vec![300.0; cols],
            depth: (0..rows).map(|i| i as f64).collect(),
            return_time: (0..rows).map(|i| i as f64 * 10.0).collect(),
            data: (0..rows * cols).map(|i| i as f32).collect(),
        }
    }

    #[test]
    fn test_default_x_axis() {
        let radargram = Radargram::try_from(raw(3, 4)).unwrap();
        assert_eq!(radargram.x(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(radargram.width(), 4);
        assert_eq!(radargram.height(), 3);
    }

    #[test]
    fn test_grid_shape() {
        let mut bad = raw(3, 4);
        bad.data.pop();
        assert!(matches!(
            Radargram::try_from(bad),
            Err(RadargramError::Shape {
                name: "data",
                len: 11,
                expected: 12
            })
        ));
    }

    #[test]
    fn test_grid_size_overflow() {
        let mut bad = raw(2, 2);
        bad.rows = usize::MAX;
        assert!(matches!(
            Radargram::try_from(bad),
            Err(RadargramError::Shape {
                name: "data",
                len: 4,
                expected: usize::MAX
            })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut bad = raw(3, 4);
        bad.easting.pop();
        assert!(matches!(
            Radargram::try_from(bad),
            Err(RadargramError::Shape {
                name: "easting",
                len: 3,
                expected: 4
            })
        ));

        let mut bad = raw(3, 4);
        bad.return_time.push(1.0);
        assert!(matches!(
            Radargram::try_from(bad),
            Err(RadargramError::Shape {
                name: "return-time",
                ..
            })
        ));
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DAT_0001_A1.json");
        let original = raw(2, 5);
        let mut file = File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&original).unwrap().as_bytes())
            .unwrap();
        let loaded = Radargram::load(&path).unwrap();
        assert_eq!(loaded, Radargram::try_from(original).unwrap());
        assert_eq!(loaded.attrs().crs, "EPSG:32633");
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Radargram::load(dir.path().join("nope.json")),
            Err(RadargramError::Missing(_))
        ));
    }
}
