//! The handful of coordinate reference systems radargram tracks come
//! in, and conversion between them.

use crate::{
    math::{from_utm, to_utm},
    DigitizeError,
};
use geo::geometry::Coord;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// WGS84 longitude/latitude in degrees (`EPSG:4326`).
    Geographic,

    /// WGS84 UTM zone (`EPSG:326zz` north, `EPSG:327zz` south).
    Utm { zone: u8, north: bool },
}

impl Crs {
    /// CRS of every exported point, UTM zone 33N.
    pub const TARGET: Self = Self::Utm {
        zone: 33,
        north: true,
    };

    pub fn epsg(&self) -> u32 {
        match *self {
            Self::Geographic => 4326,
            Self::Utm { zone, north: true } => 32600 + u32::from(zone),
            Self::Utm { zone, north: false } => 32700 + u32::from(zone),
        }
    }

    /// Returns `coord` expressed in `to`.
    pub fn transform(&self, to: &Self, coord: Coord<f64>) -> Coord<f64> {
        if self == to {
            return coord;
        }
        let lonlat = match *self {
            Self::Geographic => coord,
            Self::Utm { zone, north } => from_utm(coord, zone, north),
        };
        match *to {
            Self::Geographic => lonlat,
            Self::Utm { zone, north } => to_utm(lonlat, zone, north),
        }
    }
}

impl FromStr for Crs {
    type Err = DigitizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mk_err = || DigitizeError::Crs(s.to_owned());
        let code = match s.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => &s[5..],
            _ => return Err(mk_err()),
        };
        let code: u32 = code.trim().parse().map_err(|_| mk_err())?;
        let (north, zone) = match code {
            4326 => return Ok(Self::Geographic),
            32601..=32660 => (true, code - 32600),
            32701..=32760 => (false, code - 32700),
            _ => return Err(mk_err()),
        };
        let zone = u8::try_from(zone).map_err(|_| mk_err())?;
        Ok(Self::Utm { zone, north })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
