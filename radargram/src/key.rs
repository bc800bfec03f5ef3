use crate::RadargramError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifies one processed survey line.
///
/// Keys have the form `<glacier>-<date>-<file_stem>`, for example
/// `rugaasfonna-20220222-DAT_0738_A1_9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RadarKey {
    glacier: String,
    date: String,
    file_stem: String,
}

impl RadarKey {
    pub fn glacier(&self) -> &str {
        &self.glacier
    }

    /// Survey date as written in the key (`YYYYMMDD`).
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Survey year, the leading four characters of the date.
    pub fn year(&self) -> &str {
        self.date.get(..4).unwrap_or(&self.date)
    }
}

impl FromStr for RadarKey {
    type Err = RadargramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mk_err = || RadargramError::Key(s.to_owned());
        let mut parts = s.split('-');
        let (Some(glacier), Some(date), Some(file_stem), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(mk_err());
        };
        if glacier.is_empty() || file_stem.is_empty() {
            return Err(mk_err());
        }
        if date.len() < 4 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(mk_err());
        }
        Ok(Self {
            glacier: glacier.to_owned(),
            date: date.to_owned(),
            file_stem: file_stem.to_owned(),
        })
    }
}

impl TryFrom<String> for RadarKey {
    type Error = RadargramError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RadarKey> for String {
    fn from(key: RadarKey) -> String {
        key.to_string()
    }
}

impl fmt::Display for RadarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.glacier, self.date, self.file_stem)
    }
}
