//! Chord (fixed straight-line distance) resampling of a survey track.

use crate::DigitizeError;
use geo::geometry::Coord;
use std::collections::HashSet;

/// Largest representable pixel index.
const MAX_PIXEL: f64 = u16::MAX as f64;

/// Parameters for [chord_sample].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordParams {
    /// Straight-line spacing between successive samples (meters).
    pub step: f64,

    /// Segments longer than this start a new part (meters).
    pub jump_threshold: f64,

    /// Numerical tolerance.
    pub tolerance: f64,
}

impl Default for ChordParams {
    fn default() -> Self {
        Self {
            step: 5.0,
            jump_threshold: 100.0,
            tolerance: 1e-12,
        }
    }
}

impl ChordParams {
    #[must_use]
    pub fn step(mut self, meters: f64) -> Self {
        self.step = meters;
        self
    }

    #[must_use]
    pub fn jump_threshold(mut self, meters: f64) -> Self {
        self.jump_threshold = meters;
        self
    }

    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<(), DigitizeError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(DigitizeError::Param("step"));
        }
        if self.jump_threshold.is_nan() {
            return Err(DigitizeError::Param("jump_threshold"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(DigitizeError::Param("tolerance"));
        }
        Ok(())
    }
}

/// One element of a [ChordSamples] grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResamplePoint {
    pub x: u16,
    pub part: i32,
    pub distance: f64,
}

/// Output of [chord_sample], three aligned arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChordSamples {
    /// Pixel column per sample, unique.
    pub x: Vec<u16>,

    /// Part label per sample.
    pub part: Vec<i32>,

    /// Cumulative distance per sample (meters).
    pub distance: Vec<f64>,
}

impl ChordSamples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ResamplePoint> + '_ {
        self.x
            .iter()
            .zip(&self.part)
            .zip(&self.distance)
            .map(|((&x, &part), &distance)| ResamplePoint { x, part, distance })
    }
}

/// Position along the track: planar coordinate plus the pixel column
/// interpolated along with it.
#[derive(Debug, Clone, Copy)]
struct Station {
    at: Coord<f64>,
    px: f64,
}

/// Samples emitted before rounding and deduplication.
#[derive(Default)]
struct Emitted {
    px: Vec<f64>,
    part: Vec<i32>,
    distance: Vec<f64>,
}

impl Emitted {
    fn push(&mut self, px: f64, part: i32, distance: f64) {
        self.px.push(px);
        self.part.push(part);
        self.distance.push(distance);
    }
}

/// Returns samples taken every `params.step` meters of straight-line
/// distance along the track described by `x`, `easting` and
/// `northing`.
///
/// A circle of radius `step` centered on the most recent sample is
/// marched along the polyline; each forward intersection becomes the
/// next sample. Segments longer than `params.jump_threshold` split the
/// track into parts, and crossing one adds exactly `step` to the
/// cumulative distance regardless of the gap length.
///
/// Emitted pixel positions are rounded half-to-even and must fit in
/// a `u16`. When several samples round to the same pixel only the
/// first is kept.
pub fn chord_sample(
    x: &[f64],
    easting: &[f64],
    northing: &[f64],
    params: &ChordParams,
) -> Result<ChordSamples, DigitizeError> {
    params.validate()?;
    if x.len() != easting.len() {
        return Err(DigitizeError::Length(x.len(), easting.len()));
    }
    if x.len() != northing.len() {
        return Err(DigitizeError::Length(x.len(), northing.len()));
    }
    if x.is_empty() {
        return Ok(ChordSamples::default());
    }

    let emitted = march(x, easting, northing, params);
    dedup_pixels(emitted)
}

fn march(x: &[f64], easting: &[f64], northing: &[f64], params: &ChordParams) -> Emitted {
    let &ChordParams {
        step,
        jump_threshold,
        tolerance: eps,
    } = params;
    let n = x.len();
    let r2 = step * step;
    let vertex = |i: usize| Station {
        at: Coord {
            x: easting[i],
            y: northing[i],
        },
        px: x[i],
    };

    let mut out = Emitted::default();
    let mut part = 0;
    let mut distance = 0.0;

    // Circle center.
    let mut anchor = vertex(0);
    // Scan position, possibly inside segment `i -> i + 1`.
    let mut cursor = anchor;
    out.push(anchor.px, part, distance);

    let mut i = 0;
    while i + 1 < n {
        let start = vertex(i);
        let end = vertex(i + 1);

        let seg = end.at - start.at;
        if seg.x.hypot(seg.y) > jump_threshold {
            i += 1;
            part += 1;
            distance += step;
            anchor = end;
            cursor = end;
            out.push(anchor.px, part, distance);
            continue;
        }

        let d = end.at - cursor.at;
        let a = d.x * d.x + d.y * d.y;
        if a <= eps {
            i += 1;
            cursor = vertex(i);
            continue;
        }

        let f = cursor.at - anchor.at;
        let b = 2.0 * (d.x * f.x + d.y * f.y);
        let c = f.x * f.x + f.y * f.y - r2;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            i += 1;
            cursor = vertex(i);
            continue;
        }

        let sqrt_disc = disc.sqrt();
        let inv_2a = 1.0 / (2.0 * a);
        let forward = [(-b - sqrt_disc) * inv_2a, (-b + sqrt_disc) * inv_2a]
            .into_iter()
            .filter(|&u| u > eps && u <= 1.0)
            .reduce(f64::min);
        let Some(u) = forward else {
            i += 1;
            cursor = vertex(i);
            continue;
        };

        let q = Station {
            at: cursor.at + d * u,
            px: cursor.px + u * (end.px - cursor.px),
        };
        distance += step;
        out.push(q.px, part, distance);
        anchor = q;
        cursor = q;

        let rest = end.at - q.at;
        if rest.x * rest.x + rest.y * rest.y <= eps {
            i += 1;
            cursor = vertex(i);
        }
    }

    out
}

fn dedup_pixels(emitted: Emitted) -> Result<ChordSamples, DigitizeError> {
    let Emitted {
        px,
        part,
        distance,
    } = emitted;

    let mut seen = HashSet::with_capacity(px.len());
    let mut out = ChordSamples::default();
    for ((px, part), distance) in px.into_iter().zip(part).zip(distance) {
        let rounded = px.round_ties_even();
        if !(0.0..=MAX_PIXEL).contains(&rounded) {
            return Err(DigitizeError::PixelRange(rounded));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pixel = rounded as u16;
        if seen.insert(pixel) {
            out.x.push(pixel);
            out.part.push(part);
            out.distance.push(distance);
        }
    }
    Ok(out)
}
