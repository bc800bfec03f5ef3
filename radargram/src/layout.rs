//! On-disk layout of the data directory.
//!
//! ```text
//! <root>/processed_radar/<glacier>/<date>/<file_stem>.json
//! <root>/submitted/<user>/<radar_key>/digitized-<radar_key>-<stamp>.json
//! <root>/cache/radargrams/<radar_key>-<hash>/meta.json
//! ```

use crate::RadarKey;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn processed_radar_dir(&self) -> PathBuf {
        self.root.join("processed_radar")
    }

    pub fn submissions_dir(&self) -> PathBuf {
        self.root.join("submitted")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache").join("radargrams")
    }

    /// Returns the path of the processed dataset for `key`.
    pub fn processed_radar_path(&self, key: &RadarKey) -> PathBuf {
        let mut path = self.processed_radar_dir();
        path.push(key.glacier());
        path.push(key.date());
        path.push(format!("{}.json", key.file_stem()));
        path
    }

    pub fn user_dir(&self, user: &str) -> PathBuf {
        self.submissions_dir().join(user)
    }

    /// Directory holding every submission `user` made for `key`.
    pub fn submission_dir(&self, user: &str, key: &RadarKey) -> PathBuf {
        self.user_dir(user).join(key.to_string())
    }
}
