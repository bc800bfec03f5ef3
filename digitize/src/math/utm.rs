//! Universal Transverse Mercator on the WGS84 ellipsoid.
//!
//! Third order Krüger series as given in
//! [Wikipedia](https://en.wikipedia.org/wiki/Universal_Transverse_Mercator_coordinate_system#Simplified_formulae),
//! good to well under a millimeter inside a zone.

use geo::geometry::Coord;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Series coefficients derived from the third flattening.
struct Series {
    /// Rectifying radius.
    a: f64,
    /// First eccentricity.
    e: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

fn series() -> Series {
    let n = WGS84_F / (2.0 - WGS84_F);
    let n2 = n * n;
    let n3 = n2 * n;
    Series {
        a: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
        e: 2.0 * n.sqrt() / (1.0 + n),
        alpha: [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
            61.0 * n3 / 240.0,
        ],
        beta: [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ],
        delta: [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ],
    }
}

/// Central meridian of `zone`, in degrees.
fn central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

fn false_northing(north: bool) -> f64 {
    if north {
        0.0
    } else {
        FALSE_NORTHING_SOUTH
    }
}

/// Projects geographic `lonlat` (degrees, x = longitude) into
/// (easting, northing) meters of the given zone.
pub fn to_utm(lonlat: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let s = series();
    let phi = lonlat.y.to_radians();
    let dlambda = (lonlat.x - central_meridian(zone)).to_radians();

    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - s.e * (s.e * sin_phi).atanh()).sinh();
    let xi_p = t.atan2(dlambda.cos());
    let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let (mut xi, mut eta) = (xi_p, eta_p);
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    Coord {
        x: FALSE_EASTING + K0 * s.a * eta,
        y: false_northing(north) + K0 * s.a * xi,
    }
}

/// Inverse of [to_utm].
pub fn from_utm(en: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let s = series();
    let xi = (en.y - false_northing(north)) / (K0 * s.a);
    let eta = (en.x - FALSE_EASTING) / (K0 * s.a);

    let (mut xi_p, mut eta_p) = (xi, eta);
    for (j, beta) in s.beta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in s.delta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        phi += delta * (k * chi).sin();
    }
    let dlambda = eta_p.sinh().atan2(xi_p.cos());

    Coord {
        x: central_meridian(zone) + dlambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::{from_utm, to_utm, Coord};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_central_meridian_equator() {
        let en = to_utm(Coord { x: 15.0, y: 0.0 }, 33, true);
        assert_abs_diff_eq!(en.x, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(en.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_southern_false_northing() {
        let en = to_utm(Coord { x: 15.0, y: 0.0 }, 33, false);
        assert_abs_diff_eq!(en.y, 10_000_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // Meridian arc from the equator to 1°N is ~110.574 km, scaled
        // by the central meridian scale factor.
        let en = to_utm(Coord { x: 15.0, y: 1.0 }, 33, true);
        assert_abs_diff_eq!(en.x, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(en.y, 110_574.389 * 0.9996, epsilon = 1.0);
    }

    #[test]
    fn test_reference_points() {
        // (lon, lat, zone) -> (easting, northing), from a sixth order
        // series checked against the meridian arc integral.
        let cases = [
            (17.5, 78.9, 33, 553_714.862_690, 8_759_963.378_510),
            (11.9, 78.9, 33, 433_404.092_292, 8_760_581.581_745),
            (11.9, 78.9, 32, 562_302.912_921, 8_760_360.804_294),
            (20.5, 77.0, 33, 637_921.771_388, 8_553_228.728_693),
        ];
        for (lon, lat, zone, easting, northing) in cases {
            let en = to_utm(Coord { x: lon, y: lat }, zone, true);
            assert_abs_diff_eq!(en.x, easting, epsilon = 1e-3);
            assert_abs_diff_eq!(en.y, northing, epsilon = 1e-3);

            let lonlat = from_utm(
                Coord {
                    x: easting,
                    y: northing,
                },
                zone,
                true,
            );
            assert_abs_diff_eq!(lonlat.x, lon, epsilon = 1e-8);
            assert_abs_diff_eq!(lonlat.y, lat, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_roundtrip_svalbard() {
        for lonlat in [
            Coord { x: 15.6, y: 78.22 },
            Coord { x: 11.9, y: 78.9 },
            Coord { x: 17.1, y: 77.5 },
        ] {
            let en = to_utm(lonlat, 33, true);
            let back = from_utm(en, 33, true);
            assert_abs_diff_eq!(back.x, lonlat.x, epsilon = 1e-8);
            assert_abs_diff_eq!(back.y, lonlat.y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_roundtrip_meters() {
        let en = Coord {
            x: 512_345.678,
            y: 8_690_123.456,
        };
        let again = to_utm(from_utm(en, 33, true), 33, true);
        assert_abs_diff_eq!(again.x, en.x, epsilon = 1e-3);
        assert_abs_diff_eq!(again.y, en.y, epsilon = 1e-3);
    }
}
