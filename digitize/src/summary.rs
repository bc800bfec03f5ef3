//! Per-radargram metadata shown when browsing radargrams, cached
//! on disk by content hash.

use crate::{
    math::{median, round_to},
    parts::{track_parts, TrackParts},
    DigitizeError,
};
use geojson::{Feature, Geometry, JsonObject, JsonValue};
use log::debug;
use radargram::{Layout, RadarKey, Radargram, C};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
};

const META_FILE: &str = "meta.json";

/// Horizontal display stretch of radargrams recorded with slow trace
/// rates.
const XSCALE: [(&str, C); 16] = [
    ("rugaasfonna-20220222-DAT_0738_A1_9", 5.0),
    ("rugaasfonna-20220218-DAT_0728_A1_3", 5.0),
    ("rugaasfonna-20220218-DAT_0723_A1_1", 5.0),
    ("rugaasfonna-20220218-DAT_0727_A1_1", 5.0),
    ("svellnosbreen-20220218-DAT_0735_A1_2", 5.0),
    ("winsnesbreen-20240503-DAT_0013_A1_1", 3.0),
    ("moysalbreen-20220222-DAT_0760_A1_1", 5.0),
    ("moysalbreen-20220222-DAT_0750_A1_6", 5.0),
    ("moysalbreen-20220222-DAT_0749_A1_1", 5.0),
    ("dronbreen-20200226-DAT_0086_A1_1", 0.3),
    ("amenfonna-20240510-DAT_0044_A1_1", 3.0),
    ("etonbreen-20240503-DAT_0011_A1_1", 3.0),
    ("bergmesterbreen-20230222-DAT_0017_A1_4", 3.0),
    ("bergmesterbreen-20230222-DAT_0036_A1_1", 2.0),
    ("scott_turnerbreen-20240207-DAT_0457_A1_3", 2.0),
    ("dronbreen-20250325-DAT_0029_A1_1", 3.0),
];

/// WGS84 bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub minlat: C,
    pub maxlat: C,
    pub minlon: C,
    pub maxlon: C,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub radar_key: RadarKey,

    /// Number of traces.
    pub width: usize,

    /// Number of depth bins.
    pub height: usize,

    /// Total track length (meters).
    pub length: C,
    pub length_km_rounded: C,
    pub max_depth: Option<C>,
    pub max_time: Option<C>,
    pub antenna: String,
    pub depth_resolution_m: Option<C>,
    pub trace_resolution_s: Option<C>,

    /// `[start, end)` trace interval of every track part.
    pub interval_indicators: Vec<[usize; 2]>,

    /// Median speed (distance per time unit).
    pub average_speed: Option<C>,
    pub bounds: Option<Bounds>,

    /// Track parts as WGS84 LineString features.
    pub track: Vec<Feature>,
    pub xscale: C,
}

impl Summary {
    pub fn compute(key: &RadarKey, radargram: &Radargram) -> Result<Self, DigitizeError> {
        let now = std::time::Instant::now();
        let parts = track_parts(radargram)?;
        let length = parts.length();

        let depth = radargram.depth();
        let time = radargram.time();
        let distance = radargram.distance();

        let speeds = distance
            .windows(2)
            .zip(time.windows(2))
            .map(|(d, t)| (d[1] - d[0]) / (t[1] - t[0]));
        let trace_resolution_s = radargram
            .attrs()
            .time_interval
            .or_else(|| median(time.windows(2).map(|t| t[1] - t[0])))
            .map(|dt| round_to(dt, 3));

        let summary = Self {
            radar_key: key.clone(),
            width: radargram.width(),
            height: radargram.height(),
            length,
            length_km_rounded: round_to(length / 1000.0, 1),
            max_depth: finite_max(depth).map(|d| round_to(d, 2)),
            max_time: finite_max(radargram.return_time()).map(|t| round_to(t, 2)),
            antenna: radargram.attrs().antenna.clone(),
            depth_resolution_m: match depth {
                [.., a, b] => Some(round_to(b - a, 3)),
                _ => None,
            },
            trace_resolution_s,
            interval_indicators: parts.intervals.clone(),
            average_speed: median(speeds).map(|s| round_to(round_to(s, 3), 2)),
            bounds: bounds(&parts),
            track: track_features(&parts),
            xscale: xscale(key),
        };
        debug!("summary {key}; parts: {}, exec: {:?}", parts.parts.len(), now.elapsed());
        Ok(summary)
    }
}

/// Returns the display stretch for `key`.
pub fn xscale(key: &RadarKey) -> C {
    let key = key.to_string();
    XSCALE
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(1.0, |&(_, scale)| scale)
}

/// Returns the cache directory of a radargram's summary.
///
/// The directory name carries a hash of the dataset's file stem and
/// processing time, so reprocessing a radargram orphans its old
/// cache.
pub fn cache_dir(layout: &Layout, key: &RadarKey, radargram: &Radargram) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(key.file_stem().as_bytes());
    hasher.update(radargram.attrs().processing_datetime.as_bytes());
    layout
        .cache_dir()
        .join(format!("{key}-{:x}", hasher.finalize()))
}

/// Returns the summary of `key`, computing and caching it unless a
/// cached copy exists and `override_cache` is false.
pub fn load_or_compute(
    layout: &Layout,
    key: &RadarKey,
    override_cache: bool,
) -> Result<Summary, DigitizeError> {
    let radargram = Radargram::load(layout.processed_radar_path(key))?;
    let meta_path = cache_dir(layout, key, &radargram).join(META_FILE);

    if meta_path.is_file() && !override_cache {
        debug!("cached summary {meta_path:?}");
        let file = File::open(&meta_path)?;
        return Ok(serde_json::from_reader(BufReader::new(file))?);
    }

    let summary = Summary::compute(key, &radargram)?;
    if let Some(dir) = meta_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(&meta_path)?);
    serde_json::to_writer_pretty(&mut writer, &summary)?;
    writer.flush()?;
    Ok(summary)
}

fn finite_max(values: &[C]) -> Option<C> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(C::max)
}

fn bounds(parts: &TrackParts) -> Option<Bounds> {
    let mut coords = parts.parts.iter().flat_map(|part| part.geometry.coords());
    let first = coords.next()?;
    let init = Bounds {
        minlat: first.y,
        maxlat: first.y,
        minlon: first.x,
        maxlon: first.x,
    };
    Some(coords.fold(init, |b, c| Bounds {
        minlat: b.minlat.min(c.y),
        maxlat: b.maxlat.max(c.y),
        minlon: b.minlon.min(c.x),
        maxlon: b.maxlon.max(c.x),
    }))
}

fn track_features(parts: &TrackParts) -> Vec<Feature> {
    parts
        .parts
        .iter()
        .map(|part| {
            let mut properties = JsonObject::new();
            properties.insert("i".to_owned(), JsonValue::from(part.index));
            properties.insert("n_traces".to_owned(), JsonValue::from(part.n_traces()));
            properties.insert("length".to_owned(), JsonValue::from(round_to(part.length, 2)));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&part.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{cache_dir, load_or_compute, xscale, Summary};
    use crate::models::tests::straight_line;
    use approx::assert_relative_eq;
    use radargram::{Layout, RadarKey, Radargram, RawRadargram};
    use std::fs::{self, File};

    const KEY: &str = "amenfonna-20240507-DAT_0042_A1";

    fn key() -> RadarKey {
        KEY.parse().unwrap()
    }

    fn dataset(layout: &Layout, raw: &RawRadargram) {
        let path = layout.processed_radar_path(&key());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        serde_json::to_writer(File::create(path).unwrap(), raw).unwrap();
    }

    #[test]
    fn test_compute() {
        let radargram = Radargram::try_from(straight_line()).unwrap();
        let summary = Summary::compute(&key(), &radargram).unwrap();
        assert_eq!(summary.width, 21);
        assert_eq!(summary.height, 4);
        assert_relative_eq!(summary.length, 100.0, epsilon = 1e-9);
        assert_eq!(summary.length_km_rounded, 0.1);
        assert_eq!(summary.max_depth, Some(30.0));
        assert_eq!(summary.max_time, Some(300.0));
        assert_eq!(summary.depth_resolution_m, Some(10.0));
        assert_eq!(summary.trace_resolution_s, Some(0.5));
        // 5 m every 0.5 s.
        assert_eq!(summary.average_speed, Some(10.0));
        assert_eq!(summary.interval_indicators, vec![[0, 21]]);
        assert_eq!(summary.track.len(), 1);
        assert_eq!(summary.xscale, 1.0);

        let bounds = summary.bounds.unwrap();
        assert_relative_eq!(bounds.minlon, 15.0, epsilon = 1e-9);
        assert!(bounds.maxlon > bounds.minlon);
        assert!(bounds.maxlat - bounds.minlat < 1e-4);
    }

    #[test]
    fn test_time_interval_attribute_wins() {
        let mut raw = straight_line();
        raw.attrs.time_interval = Some(0.1234);
        let radargram = Radargram::try_from(raw).unwrap();
        let summary = Summary::compute(&key(), &radargram).unwrap();
        assert_eq!(summary.trace_resolution_s, Some(0.123));
    }

    #[test]
    fn test_xscale() {
        assert_eq!(xscale(&"dronbreen-20200226-DAT_0086_A1_1".parse().unwrap()), 0.3);
        assert_eq!(xscale(&key()), 1.0);
    }

    #[test]
    fn test_cache() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        dataset(&layout, &straight_line());

        let summary = load_or_compute(&layout, &key(), false).unwrap();
        let radargram = Radargram::load(layout.processed_radar_path(&key())).unwrap();
        let meta_path = cache_dir(&layout, &key(), &radargram).join("meta.json");
        assert!(meta_path.is_file());
        assert_eq!(load_or_compute(&layout, &key(), false).unwrap(), summary);

        // A cached summary is trusted as is.
        let mut stale = summary.clone();
        stale.antenna = "stale".to_owned();
        fs::write(&meta_path, serde_json::to_string(&stale).unwrap()).unwrap();
        assert_eq!(load_or_compute(&layout, &key(), false).unwrap(), stale);
        assert_eq!(load_or_compute(&layout, &key(), true).unwrap(), summary);
    }

    #[test]
    fn test_reprocessing_changes_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let before = Radargram::try_from(straight_line()).unwrap();
        let mut raw = straight_line();
        raw.attrs.processing_datetime = "2024-06-01T00:00:00".to_owned();
        let after = Radargram::try_from(raw).unwrap();

        let a = cache_dir(&layout, &key(), &before);
        let b = cache_dir(&layout, &key(), &after);
        assert_ne!(a, b);
        assert!(a.starts_with(layout.cache_dir()));
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(&format!("{KEY}-")));
        // SHA-256 as hex.
        assert_eq!(name.len(), KEY.len() + 1 + 64);
    }
}
