use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadargramError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid radar key {0:?}")]
    Key(String),

    #[error("'{name}' has {len} values, expected {expected}")]
    Shape {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("no processed radargram at {0}")]
    Missing(PathBuf),
}
