//! Fuses every user's latest interpretation of a radargram into one
//! georeferenced point set.

use crate::{
    read_interpretation, ChordParams, Crs, DigitizeError, InterpretationTable, Kind,
    PhysicalModels, SubmissionStore,
};
use geo::geometry::Coord;
use log::{debug, warn};
use radargram::{RadarKey, Radargram, C};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// One digitized pixel placed in physical space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPoint {
    pub radar_key: RadarKey,
    pub user: String,
    pub kind: Kind,

    /// Index of the source feature within its submission.
    pub line: usize,

    pub x: u16,
    pub y: u16,

    /// Depth below the surface (m).
    pub depth: C,

    /// Two-way travel time.
    pub twtt: C,

    /// Easting in [Crs::TARGET].
    pub easting: C,

    /// Northing in [Crs::TARGET].
    pub northing: C,

    pub elevation: C,

    /// Along-track distance (m), a multiple of the sampling step.
    pub distance: C,

    pub part: i32,
    pub antenna: String,
    pub year: String,
    pub glacier: String,
}

pub struct Aligner {
    store: SubmissionStore,

    /// Sampling grid parameters; `params.step` also quantizes
    /// distance.
    params: ChordParams,
}

impl Aligner {
    pub fn new(store: SubmissionStore) -> Self {
        Self {
            store,
            params: ChordParams::default(),
        }
    }

    /// Sampling step (meters).
    #[must_use]
    pub fn step(mut self, meters: C) -> Self {
        self.params = self.params.step(meters);
        self
    }

    #[must_use]
    pub fn params(mut self, params: ChordParams) -> Self {
        self.params = params;
        self
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    /// Returns the aligned points of every user's latest submission
    /// for `key`.
    pub fn align(&self, key: &RadarKey) -> Result<Vec<AlignedPoint>, DigitizeError> {
        let now = std::time::Instant::now();
        let radargram = Radargram::load(self.store.layout().processed_radar_path(key))?;
        let models = PhysicalModels::builder()
            .step(self.params.step)
            .jump_threshold(self.params.jump_threshold)
            .tolerance(self.params.tolerance)
            .build(&radargram)?;

        let mut tables = Vec::new();
        for (_user, path) in self.store.latest_for_key(key)? {
            tables.push(read_interpretation(&path, Some(models.grid.x.as_slice()))?);
        }

        let points = join(key, &models, &tables, self.params.step);
        debug!(
            "aligned {key}; users: {}, points: {}, exec: {:?}",
            tables.len(),
            points.len(),
            now.elapsed()
        );
        Ok(points)
    }

    /// Aligns every interpreted radargram in parallel and returns the
    /// concatenated points in radar key order.
    ///
    /// Submissions are rescanned from disk first. Radargrams that fail
    /// to align are logged and left out.
    pub fn align_all(&self) -> Result<Vec<AlignedPoint>, DigitizeError> {
        self.store.invalidate_all();
        let keys = self.store.interpreted_radar_keys()?;
        Ok(self.align_keys(&keys, || ()))
    }

    /// Like [Aligner::align_all] over `keys`, calling `tick` after each
    /// radargram.
    pub fn align_keys<F>(&self, keys: &[RadarKey], tick: F) -> Vec<AlignedPoint>
    where
        F: Fn() + Sync,
    {
        let results: Vec<_> = keys
            .par_iter()
            .map(|key| {
                let result = self.align(key);
                tick();
                (key, result)
            })
            .collect();

        let mut points = Vec::new();
        for (key, result) in results {
            match result {
                Ok(aligned) => points.extend(aligned),
                Err(e) => warn!("skipping {key}: {e}"),
            }
        }
        points
    }
}

/// Places the rows of `tables` in physical space using `models`.
///
/// Distances are rounded to the nearest multiple of `step`, ties to
/// even. Rows are ordered by distance; rows without a depth or
/// position are dropped, and only the first row of each (user, kind,
/// distance) is kept. Positions are reprojected into [Crs::TARGET].
pub fn join(
    key: &RadarKey,
    models: &PhysicalModels,
    tables: &[InterpretationTable],
    step: C,
) -> Vec<AlignedPoint> {
    let antenna = models.antenna.as_str();
    let mut points: Vec<AlignedPoint> = tables
        .iter()
        .flat_map(|table| {
            table.rows.iter().map(move |row| {
                let (x, y) = (C::from(row.x), C::from(row.y));
                #[allow(clippy::cast_possible_truncation)]
                let part = models.part.eval(x) as i32;
                AlignedPoint {
                    radar_key: key.clone(),
                    user: table.user.clone(),
                    kind: row.kind,
                    line: row.line,
                    x: row.x,
                    y: row.y,
                    depth: models.depth.eval(y),
                    twtt: models.twtt.eval(y),
                    easting: models.easting.eval(x),
                    northing: models.northing.eval(x),
                    elevation: models.elevation.eval(x),
                    distance: (models.distance.eval(x) / step).round_ties_even() * step,
                    part,
                    antenna: antenna.to_owned(),
                    year: key.year().to_owned(),
                    glacier: key.glacier().to_owned(),
                }
            })
        })
        .collect();

    points.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    points.retain(|p| p.depth.is_finite() && p.easting.is_finite() && p.northing.is_finite());

    let mut seen = HashSet::with_capacity(points.len());
    points.retain(|p| seen.insert((p.user.clone(), p.kind, p.distance.to_bits())));

    if models.crs != Crs::TARGET {
        for p in &mut points {
            let Coord { x, y } = models.crs.transform(
                &Crs::TARGET,
                Coord {
                    x: p.easting,
                    y: p.northing,
                },
            );
            p.easting = x;
            p.northing = y;
        }
    }

    points
}
