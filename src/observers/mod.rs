//! # Observer location
//!
//! A ground observer given by geodetic latitude, longitude and elevation above the WGS84
//! ellipsoid. The geodetic coordinates are converted once to geocentric parallax constants
//! `(ρ·cosφ, ρ·sinφ)`, from which the observer's geocentric position is obtained at any epoch
//! by applying the Earth rotation angle (GMST).
//!
//! ## Frames & conventions
//!
//! - Longitudes: **degrees**, east positive, normalised to (−180°, 180°].
//! - Elevation: **meters** above the ellipsoid.
//! - Positions: **AU**, in the mean equator and equinox **of date**.
//! - UT1 is approximated by UTC; the resulting error (< 0.9 s of Earth rotation) is invisible at
//!   the precision of rise/set times.
//!
//! ```text
//! Body-fixed  --Rz(GMST)-->  Equatorial of date
//! ```
use std::fmt;

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    almanac_errors::AlmanacError,
    constants::{Degree, Meter, Radian, DPI, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS, ERAU, RADEG},
    ref_system::rotmt,
    time::gmst,
};

/// Immutable ground observer built from command-line coordinates.
///
/// See also
/// ------------
/// * [`geodetic_to_parallax`] – Converts geodetic latitude/elevation to (ρ·cosφ, ρ·sinφ).
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverLocation {
    /// Geodetic latitude in **degrees**, −90..90.
    pub latitude: Degree,

    /// Geodetic longitude in **degrees** east of Greenwich, (−180, 180].
    pub longitude: Degree,

    /// Height above the reference ellipsoid in **meters**.
    pub elevation: Meter,

    rho_cos_phi: f64,
    rho_sin_phi: f64,
}

impl ObserverLocation {
    /// Create an observer from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in **degrees**, within [−90, 90].
    /// * `longitude`: longitude in **degrees**, east positive; any finite value is accepted and
    ///   normalised to (−180, 180].
    /// * `elevation`: height above the ellipsoid in **meters**.
    ///
    /// Return
    /// ----------
    /// * The observer, or [`AlmanacError::InvalidObserver`] for non-finite values or a latitude
    ///   out of range.
    pub fn new(
        latitude: Degree,
        longitude: Degree,
        elevation: Meter,
    ) -> Result<ObserverLocation, AlmanacError> {
        if !latitude.is_finite() || !longitude.is_finite() || !elevation.is_finite() {
            return Err(AlmanacError::InvalidObserver(format!(
                "non-finite coordinates: lat = {latitude}, lon = {longitude}, elev = {elevation}"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AlmanacError::InvalidObserver(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }

        let mut longitude = longitude.rem_euclid(360.0);
        if longitude > 180.0 {
            longitude -= 360.0;
        }

        let (rho_cos_phi, rho_sin_phi) = geodetic_to_parallax(latitude, elevation);
        Ok(ObserverLocation {
            latitude,
            longitude,
            elevation,
            rho_cos_phi,
            rho_sin_phi,
        })
    }

    /// Geocentric parallax constants `(ρ·cosφ, ρ·sinφ)` in Earth radii.
    pub fn parallax(&self) -> (f64, f64) {
        (self.rho_cos_phi, self.rho_sin_phi)
    }

    /// Observer position in the Earth-fixed frame (x towards Greenwich), in AU.
    pub fn body_fixed_coord(&self) -> Vector3<f64> {
        let lon_radians = self.longitude * RADEG;

        Vector3::new(
            ERAU * self.rho_cos_phi * lon_radians.cos(),
            ERAU * self.rho_cos_phi * lon_radians.sin(),
            ERAU * self.rho_sin_phi,
        )
    }

    /// Local mean sidereal time at `epoch`, in radians in [0, 2π).
    pub fn local_sidereal_time(&self, epoch: &Epoch) -> Radian {
        (gmst(epoch.to_mjd_utc_days()) + self.longitude * RADEG).rem_euclid(DPI)
    }

    /// Geocentric position of the observer in the mean equator and equinox of date (AU).
    pub fn geocentric_position_of_date(&self, epoch: &Epoch) -> Vector3<f64> {
        rotmt(gmst(epoch.to_mjd_utc_days()), 2) * self.body_fixed_coord()
    }
}

impl fmt::Display for ObserverLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude < 0.0 { 'S' } else { 'N' };
        let ew = if self.longitude < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{:.4}°{ns} {:.4}°{ew} {:.0} m",
            self.latitude.abs(),
            self.longitude.abs(),
            self.elevation
        )
    }
}

/// Compute normalized geocentric coordinates from geodetic latitude and height.
///
/// Details
/// -------
/// ```text
/// u = atan( (sin φ * (b/a)) / cos φ )
/// ρ_sinφ = (b/a) * sin u + (h/a) * sin φ
/// ρ_cosφ = cos u + (h/a) * cos φ
/// ```
///
/// where `a` and `b` are the Earth's semi-major and semi-minor axes,
/// and `h` is the height above the ellipsoid.
pub fn lat_alt_to_parallax(lat: Radian, height: Meter) -> (f64, f64) {
    let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;

    // parametric latitude
    let u = (lat.sin() * axis_ratio).atan2(lat.cos());

    let rho_sin_phi = axis_ratio * u.sin() + (height / EARTH_MAJOR_AXIS) * lat.sin();
    let rho_cos_phi = u.cos() + (height / EARTH_MAJOR_AXIS) * lat.cos();

    (rho_cos_phi, rho_sin_phi)
}

/// Convert geodetic latitude (degrees) and height (meters) into normalized parallax
/// coordinates `(ρ·cosφ, ρ·sinφ)`.
pub fn geodetic_to_parallax(lat: Degree, height: Meter) -> (f64, f64) {
    lat_alt_to_parallax(lat * RADEG, height)
}
