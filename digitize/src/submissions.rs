//! Submitted interpretations on disk.

use crate::{DigitizeError, Submission};
use dashmap::DashMap;
use log::{debug, warn};
use radargram::{Layout, RadarKey};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Every submission file of one user, by radar key.
pub type UserIndex = BTreeMap<RadarKey, Vec<PathBuf>>;

pub struct SubmissionStore {
    layout: Layout,

    /// Per-user indexes which have been scanned on demand.
    index: DashMap<String, Arc<UserIndex>>,
}

impl SubmissionStore {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            index: DashMap::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the name of every user directory, sorted.
    pub fn users(&self) -> Result<Vec<String>, DigitizeError> {
        let mut users: Vec<String> = subdirs(&self.layout.submissions_dir())?
            .into_iter()
            .filter_map(|path| Some(path.file_name()?.to_str()?.to_owned()))
            .collect();
        users.sort();
        Ok(users)
    }

    /// Returns the index of `user`'s submissions.
    ///
    /// The index is read from disk on first use and served from
    /// memory until [SubmissionStore::invalidate] is called for `user`.
    pub fn get(&self, user: &str) -> Result<Arc<UserIndex>, DigitizeError> {
        self.index
            .entry(user.to_owned())
            .or_try_insert_with(|| self.scan_user(user).map(Arc::new))
            .map(|r| r.clone())
    }

    pub fn invalidate(&self, user: &str) {
        self.index.remove(user);
    }

    pub fn invalidate_all(&self) {
        self.index.clear();
    }

    /// Returns every file `user` submitted for `key`.
    pub fn submissions(&self, user: &str, key: &RadarKey) -> Result<Vec<PathBuf>, DigitizeError> {
        Ok(self.get(user)?.get(key).cloned().unwrap_or_default())
    }

    /// Returns `user`'s most recent submission for `key`, if any.
    ///
    /// Recency is decided by the timestamp at the end of the file
    /// name, not by file modification time.
    pub fn latest(&self, user: &str, key: &RadarKey) -> Result<Option<PathBuf>, DigitizeError> {
        Ok(self
            .get(user)?
            .get(key)
            .and_then(|paths| paths.iter().max_by_key(|&path| (stamp_of(path), path)))
            .cloned())
    }

    pub fn read_latest(&self, user: &str, key: &RadarKey) -> Result<Option<Submission>, DigitizeError> {
        self.latest(user, key)?
            .map(Submission::load)
            .transpose()
    }

    /// Returns `(user, latest submission)` for every user who has
    /// submitted for `key`, sorted by user.
    pub fn latest_for_key(&self, key: &RadarKey) -> Result<Vec<(String, PathBuf)>, DigitizeError> {
        let mut latest = Vec::new();
        for user in self.users()? {
            if let Some(path) = self.latest(&user, key)? {
                latest.push((user, path));
            }
        }
        Ok(latest)
    }

    pub fn n_users_submitted(&self, key: &RadarKey) -> Result<usize, DigitizeError> {
        let mut n = 0;
        for user in self.users()? {
            if self.get(&user)?.get(key).is_some_and(|paths| !paths.is_empty()) {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Returns every radar key that someone has submitted for and that
    /// has a processed dataset, sorted.
    pub fn interpreted_radar_keys(&self) -> Result<Vec<RadarKey>, DigitizeError> {
        let mut keys = BTreeSet::new();
        for user in self.users()? {
            for key in self.get(&user)?.keys() {
                if self.layout.processed_radar_path(key).is_file() {
                    keys.insert(key.clone());
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Stores `submission` as made by `user` and returns its path.
    pub fn write(&self, user: &str, submission: &Submission) -> Result<PathBuf, DigitizeError> {
        let key: RadarKey = submission
            .radar_key
            .as_deref()
            .ok_or(DigitizeError::Submission("radar_key"))?
            .parse()?;
        if user.is_empty() || user.contains(['/', '\\']) || user.starts_with('.') {
            return Err(DigitizeError::Submission("user"));
        }
        if submission.date_modified.is_empty() {
            return Err(DigitizeError::Submission("date_modified"));
        }

        let dir = self.layout.submission_dir(user, &key);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name(&key, &submission.date_modified));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, submission)?;
        writer.flush()?;
        debug!("stored {path:?}");

        self.invalidate(user);
        Ok(path)
    }
}

/// Private API.
impl SubmissionStore {
    fn scan_user(&self, user: &str) -> Result<UserIndex, DigitizeError> {
        let user_dir = self.layout.user_dir(user);
        debug!("scanning {user_dir:?}");
        let mut index = UserIndex::new();
        for key_dir in subdirs(&user_dir)? {
            let Some(name) = key_dir.file_name().and_then(std::ffi::OsStr::to_str) else {
                continue;
            };
            let key: RadarKey = match name.parse() {
                Ok(key) => key,
                Err(e) => {
                    warn!("ignoring {key_dir:?}: {e}");
                    continue;
                }
            };
            let mut paths = Vec::new();
            for entry in fs::read_dir(&key_dir)? {
                let path = entry?.path();
                if path.is_file() && Some("json") == path.extension().and_then(std::ffi::OsStr::to_str) {
                    paths.push(path);
                }
            }
            paths.sort();
            index.insert(key, paths);
        }
        Ok(index)
    }
}

/// Returns the file name a submission made at `date_modified` is
/// stored under.
pub fn file_name(key: &RadarKey, date_modified: &str) -> String {
    let stamp = date_modified.replace(':', "-").replace('-', "_");
    format!("digitized-{key}-{stamp}.json")
}

/// Returns the ordering token of a submission file, the last
/// `-`-separated part of its stem.
fn stamp_of(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()?.rsplit('-').next()
}

/// Returns the subdirectories of `dir`; a missing `dir` has none.
fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, DigitizeError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}
