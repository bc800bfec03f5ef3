use crate::DigitizeError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Category of a digitized polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    BedUnspecified,
    BedCold,
    BedMissing,
    TemperateIce,
}

/// Feature names written by older versions of the digitizing tool.
const LEGACY_NAMES: [(&str, Kind); 4] = [
    ("Glacier bed", Kind::BedUnspecified),
    ("Cold glacier bed", Kind::BedCold),
    ("Glacier bed missing", Kind::BedMissing),
    ("Temperate ice", Kind::TemperateIce),
];

impl Kind {
    pub const ALL: [Self; 4] = [
        Self::BedUnspecified,
        Self::BedCold,
        Self::BedMissing,
        Self::TemperateIce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BedUnspecified => "bed_unspecified",
            Self::BedCold => "bed_cold",
            Self::BedMissing => "bed_missing",
            Self::TemperateIce => "temperate_ice",
        }
    }

    /// Returns the kind a legacy `properties.name` stands for.
    pub fn from_legacy_name(name: &str) -> Result<Self, DigitizeError> {
        LEGACY_NAMES
            .iter()
            .find(|(legacy, _)| *legacy == name)
            .map(|&(_, kind)| kind)
            .ok_or_else(|| DigitizeError::Kind(name.to_owned()))
    }
}

impl FromStr for Kind {
    type Err = DigitizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DigitizeError::Kind(s.to_owned()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
