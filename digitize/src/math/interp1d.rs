use crate::DigitizeError;

/// How an [Interp1d] evaluates between knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Straight line between the two surrounding knots.
    Linear,

    /// Value of the closest knot; a query exactly halfway between two
    /// knots takes the lower one.
    Nearest,
}

/// Piecewise 1-D model over scattered knots.
///
/// Queries outside `[min(xs), max(xs)]` evaluate to `NaN`; there is
/// no extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    mode: Mode,
}

impl Interp1d {
    /// Returns a model through (`xs[i]`, `ys[i]`).
    ///
    /// Knots need not be ordered. Knots with a non-finite abscissa
    /// are ignored.
    pub fn new(xs: &[f64], ys: &[f64], mode: Mode) -> Result<Self, DigitizeError> {
        if xs.len() != ys.len() {
            return Err(DigitizeError::Length(xs.len(), ys.len()));
        }
        let mut knots: Vec<(f64, f64)> = xs
            .iter()
            .copied()
            .zip(ys.iter().copied())
            .filter(|(x, _)| x.is_finite())
            .collect();
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys) = knots.into_iter().unzip();
        Ok(Self { xs, ys, mode })
    }

    pub fn linear(xs: &[f64], ys: &[f64]) -> Result<Self, DigitizeError> {
        Self::new(xs, ys, Mode::Linear)
    }

    pub fn nearest(xs: &[f64], ys: &[f64]) -> Result<Self, DigitizeError> {
        Self::new(xs, ys, Mode::Nearest)
    }

    /// Returns the (min, max) abscissa, if there are any knots.
    pub fn domain(&self) -> Option<(f64, f64)> {
        Some((*self.xs.first()?, *self.xs.last()?))
    }

    /// Evaluates the model at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        match self.domain() {
            Some((lo, hi)) if lo <= x && x <= hi => match self.mode {
                Mode::Linear => self.linear_at(x),
                Mode::Nearest => self.nearest_at(x),
            },
            _ => f64::NAN,
        }
    }

    fn linear_at(&self, x: f64) -> f64 {
        // First knot strictly right of `x`.
        let hi = self.xs.partition_point(|&k| k <= x);
        if hi == self.xs.len() {
            return self.ys[hi - 1];
        }
        let lo = hi - 1;
        let (x0, x1) = (self.xs[lo], self.xs[hi]);
        let (y0, y1) = (self.ys[lo], self.ys[hi]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }

    fn nearest_at(&self, x: f64) -> f64 {
        // Number of midpoints strictly left of `x`. Midpoints of sorted
        // knots are sorted too.
        let (mut lo, mut hi) = (0, self.xs.len() - 1);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if (self.xs[mid] + self.xs[mid + 1]) / 2.0 < x {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        self.ys[lo]
    }
}
