use crate::{
    math::{chord_sample, ChordParams, ChordSamples, Interp1d, Mode},
    Crs, DigitizeError,
};
use log::debug;
use radargram::{Radargram, C};

/// Interpolation models mapping pixel space of one radargram into
/// physical quantities.
///
/// Every model evaluates to `NaN` outside the pixels it was built
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalModels {
    /// Pixel row -> depth (m). Row 0 is the deepest sample.
    pub depth: Interp1d,

    /// Pixel row -> two-way travel time.
    pub twtt: Interp1d,

    /// Pixel column -> easting in `crs`.
    pub easting: Interp1d,

    /// Pixel column -> northing in `crs`.
    pub northing: Interp1d,

    /// Pixel column -> elevation (m).
    pub elevation: Interp1d,

    /// Pixel column -> along-track distance (m), linear between grid
    /// columns.
    pub distance: Interp1d,

    /// Pixel column -> track part, nearest grid column.
    pub part: Interp1d,

    /// Chord sampling grid the distance and part models are built on.
    pub grid: ChordSamples,

    /// CRS of the `easting`/`northing` models.
    pub crs: Crs,

    /// Antenna frequency label, e.g. `"800 MHz"`.
    pub antenna: String,
}

impl PhysicalModels {
    pub fn builder() -> ModelBuilder {
        ModelBuilder {
            params: ChordParams::default(),
        }
    }
}

pub struct ModelBuilder {
    params: ChordParams,
}

impl ModelBuilder {
    /// Spacing of the sampling grid (meters).
    pub fn step(mut self, meters: C) -> Self {
        self.params = self.params.step(meters);
        self
    }

    /// Track segments longer than this start a new part (meters).
    pub fn jump_threshold(mut self, meters: C) -> Self {
        self.params = self.params.jump_threshold(meters);
        self
    }

    pub fn tolerance(mut self, tolerance: C) -> Self {
        self.params = self.params.tolerance(tolerance);
        self
    }

    pub fn build(&self, radargram: &Radargram) -> Result<PhysicalModels, DigitizeError> {
        let crs: Crs = radargram.attrs().crs.parse()?;

        let now = std::time::Instant::now();
        #[allow(clippy::cast_precision_loss)]
        let rows: Vec<C> = (0..radargram.height()).rev().map(|row| row as C).collect();
        let depth = Interp1d::linear(&rows, radargram.depth())?;
        let twtt = Interp1d::linear(&rows, radargram.return_time())?;

        let x = radargram.x();
        let easting = Interp1d::linear(x, radargram.easting())?;
        let northing = Interp1d::linear(x, radargram.northing())?;
        let elevation = Interp1d::linear(x, radargram.elevation())?;
        let axis_runtime = now.elapsed();

        let (grid, grid_runtime) = {
            let now = std::time::Instant::now();
            let grid = chord_sample(
                radargram.x(),
                radargram.easting(),
                radargram.northing(),
                &self.params,
            )?;
            (grid, now.elapsed())
        };

        let grid_x: Vec<C> = grid.x.iter().map(|&x| C::from(x)).collect();
        let grid_part: Vec<C> = grid.part.iter().map(|&p| C::from(p)).collect();
        let distance = Interp1d::new(&grid_x, &grid.distance, Mode::Linear)?;
        let part = Interp1d::new(&grid_x, &grid_part, Mode::Nearest)?;

        debug!(
            "models; traces: {}, grid: {}, axis_exec: {:?}, grid_exec: {:?}",
            radargram.width(),
            grid.len(),
            axis_runtime,
            grid_runtime
        );

        Ok(PhysicalModels {
            depth,
            twtt,
            easting,
            northing,
            elevation,
            distance,
            part,
            grid,
            crs,
            antenna: antenna_label(&radargram.attrs().antenna),
        })
    }
}

/// Returns the antenna description up to and including its first
/// `MHz`.
pub fn antenna_label(antenna: &str) -> String {
    let head = antenna
        .split_once("MHz")
        .map_or(antenna, |(head, _)| head);
    format!("{head}MHz")
}
