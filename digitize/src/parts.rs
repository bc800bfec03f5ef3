//! Splitting a survey track into continuous parts.

use crate::{
    math::{median, Interp1d},
    Crs, DigitizeError,
};
use geo::geometry::{Coord, LineString};
use log::debug;
use radargram::{Radargram, C};

/// A distance step longer than this (meters) breaks the track.
const MAX_DISTANCE_STEP: C = 100.0;

/// A time step longer than this many median time steps breaks the
/// track.
const TIME_GAP_FACTOR: C = 50.0;

/// Median time step (seconds) assumed when none can be measured.
const DEFAULT_TIME_STEP: C = 0.2;

/// Parts with fewer traces are discarded.
const MIN_TRACES: usize = 10;

/// Distance (meters) between vertices of a part's geometry.
const GEOMETRY_STEP: C = 5.0;

/// A continuous run of traces.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPart {
    /// Position among the kept parts.
    pub index: usize,

    /// First trace.
    pub start: usize,

    /// One past the last trace.
    pub end: usize,

    /// Planar length (meters) of `geometry` in the dataset's CRS.
    pub length: C,

    /// Simplified track in WGS84 longitude/latitude.
    pub geometry: LineString<C>,
}

impl TrackPart {
    pub fn n_traces(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackParts {
    /// `[start, end)` trace interval of every part long enough to keep.
    pub intervals: Vec<[usize; 2]>,

    /// Parts of `intervals` whose geometry is not a single point.
    pub parts: Vec<TrackPart>,
}

impl TrackParts {
    /// Total planar length of all parts (meters).
    pub fn length(&self) -> C {
        self.parts.iter().map(|part| part.length).sum()
    }
}

/// Returns the trace indices at which a new part starts, bracketed by
/// `0` and `distance.len()`.
///
/// A part ends where the reported distance jumps by more than 100 m or
/// the time step exceeds 50 times the median non-zero time step.
pub fn break_indices(distance: &[C], time: &[C]) -> Vec<usize> {
    let n = distance.len().min(time.len());
    let dt: Vec<C> = time
        .windows(2)
        .map(|w| w[1] - w[0])
        .map(|dt| if dt == 0.0 { C::NAN } else { dt })
        .collect();
    let median_dt = median(dt.iter().copied()).unwrap_or(DEFAULT_TIME_STEP);

    let mut breaks = vec![0];
    for i in 0..n.saturating_sub(1) {
        let dd = distance[i + 1] - distance[i];
        if dd > MAX_DISTANCE_STEP || dt[i] > median_dt * TIME_GAP_FACTOR {
            breaks.push(i + 1);
        }
    }
    breaks.push(n);
    breaks.dedup();
    breaks
}

/// Splits the track of `radargram` into parts.
pub fn track_parts(radargram: &Radargram) -> Result<TrackParts, DigitizeError> {
    let crs: Crs = radargram.attrs().crs.parse()?;
    let distance = radargram.distance();
    let easting = radargram.easting();
    let northing = radargram.northing();

    let mut parts = TrackParts::default();
    for bounds in break_indices(distance, radargram.time()).windows(2) {
        let (start, end) = (bounds[0], bounds[1]);
        if end - start < MIN_TRACES {
            continue;
        }
        parts.intervals.push([start, end]);

        let traces = simplified(&distance[start..end], start)?;
        if traces.len() < 2 {
            debug!("part [{start}, {end}) has no extent");
            continue;
        }

        let native: Vec<Coord<C>> = traces
            .iter()
            .map(|&i| Coord {
                x: easting[i],
                y: northing[i],
            })
            .collect();
        let length: C = native
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum();
        let geometry = native
            .into_iter()
            .map(|coord| crs.transform(&Crs::Geographic, coord))
            .collect();

        parts.parts.push(TrackPart {
            index: parts.intervals.len() - 1,
            start,
            end,
            length,
            geometry,
        });
    }
    Ok(parts)
}

/// Returns the trace indices, offset by `start`, at every 5 m of
/// `distance` plus the farthest distance.
fn simplified(distance: &[C], start: usize) -> Result<Vec<usize>, DigitizeError> {
    let finite = || distance.iter().copied().filter(|d| d.is_finite());
    let (Some(min), Some(max)) = (finite().reduce(C::min), finite().reduce(C::max)) else {
        return Ok(Vec::new());
    };

    #[allow(clippy::cast_precision_loss)]
    let indices: Vec<C> = (0..distance.len()).map(|i| (start + i) as C).collect();
    let model = Interp1d::linear(distance, &indices)?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n_steps = ((max - min) / GEOMETRY_STEP).ceil() as usize;
    #[allow(clippy::cast_precision_loss)]
    let stations = (0..n_steps)
        .map(|k| min + k as C * GEOMETRY_STEP)
        .chain(std::iter::once(max));

    #[allow(clippy::cast_precision_loss)]
    let (lo, hi) = (start as C, (start + distance.len() - 1) as C);
    Ok(stations
        .map(|d| {
            let i = model.eval(d);
            let i = if i.is_finite() { i } else { 0.0 };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let i = i.clamp(lo, hi) as usize;
            i
        })
        .collect())
}
