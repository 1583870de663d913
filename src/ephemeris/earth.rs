//! Low-precision heliocentric position of the Earth.
//!
//! The geocentric Sun follows the classical mean-element solar theory (mean longitude, mean
//! anomaly, equation of the centre, radius vector). Its accuracy is about 0.01° in longitude,
//! well below what rise/set times or a naked-eye comet position need.
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::{AstronomicalUnit, Radian, RADEG},
    ref_system::ecliptic_to_equatorial_j2000,
    time::centuries_since_j2000,
};

/// Semi-major axis of the Earth orbit (AU).
const EARTH_SEMI_MAJOR_AXIS: f64 = 1.000001018;

/// General precession in longitude, degrees per Julian century.
const PRECESSION_IN_LONGITUDE: f64 = 1.397;

/// Geometric ecliptic longitude of the Sun, referred to the J2000 equinox, and Sun–Earth
/// distance.
///
/// Arguments
/// -----------------
/// * `t`: Julian centuries of TT since J2000.0.
///
/// Return
/// ----------
/// * `(λ, R)` with `λ` in radians in [0, 2π) and `R` in AU.
pub fn sun_ecliptic_j2000(t: f64) -> (Radian, AstronomicalUnit) {
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = 357.52911 + 35999.05029 * t - 0.0001537 * t * t;
    let m_rad = m * RADEG;
    let e = 0.016708634 - 0.000042037 * t - 0.0000001267 * t * t;

    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m_rad.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m_rad).sin()
        + 0.000289 * (3.0 * m_rad).sin();

    let true_longitude = l0 + c;
    let true_anomaly = (m + c) * RADEG;
    let radius = EARTH_SEMI_MAJOR_AXIS * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    let longitude_j2000 = (true_longitude - PRECESSION_IN_LONGITUDE * t).rem_euclid(360.0);
    (longitude_j2000 * RADEG, radius)
}

/// Heliocentric position of the Earth in the equatorial J2000 frame (AU).
pub fn earth_heliocentric_equatorial(epoch: &Epoch) -> Vector3<f64> {
    let (longitude, radius) = sun_ecliptic_j2000(centuries_since_j2000(epoch));
    let sun_ecliptic = radius * Vector3::new(longitude.cos(), longitude.sin(), 0.0);
    -(ecliptic_to_equatorial_j2000() * sun_ecliptic)
}
