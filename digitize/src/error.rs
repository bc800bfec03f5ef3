use radargram::RadargramError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitizeError {
    #[error("invalid parameter '{0}'")]
    Param(&'static str),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Radargram(#[from] RadargramError),

    #[error("input arrays differ in length ({0} vs {1})")]
    Length(usize, usize),

    #[error("pixel index {0} outside [0, 65535]")]
    PixelRange(f64),

    #[error("x must be non-decreasing within feature {0}")]
    NonMonotonic(usize),

    #[error("unknown feature kind {0:?}")]
    Kind(String),

    #[error("feature {0} has neither a kind nor a name")]
    Unlabeled(usize),

    #[error("unsupported CRS {0:?}")]
    Crs(String),

    #[error("cannot determine {0} of submission")]
    Submission(&'static str),
}
