//! # Position query
//!
//! Geocentric and topocentric position of a catalog comet at one instant.
//!
//! - **Geocentric**: astrometric right ascension and declination in the equatorial mean J2000
//!   frame, with the light-time correction of [`Ephemeris::geocentric_position`].
//! - **Topocentric** (when an observer is given): the geocentric vector is precessed to the
//!   mean equator of date, the observer's geocentric position is removed, and the hour angle
//!   is converted into altitude and azimuth. Azimuth runs from the north through the east.
//!   Neither refraction nor nutation is applied to the reported altitude.
use std::fmt;

use hifitime::Epoch;

use crate::{
    almanac_errors::AlmanacError,
    catalog::CatalogRecord,
    constants::{AstronomicalUnit, Degree, Radian, RADEG},
    conversion::{format_degrees, format_hours, format_radians},
    ephemeris::Ephemeris,
    observers::ObserverLocation,
    orbit_type::cometary_element::CometaryElements,
    ref_system::{cartesian_to_radec, hadec_to_altaz, precession_j2000_to_date},
    time::centuries_since_j2000,
};

/// Position of the comet above the local horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    /// Altitude above the geometric horizon (degrees).
    pub altitude: Degree,
    /// Azimuth, north through east, in [0, 360).
    pub azimuth: Degree,
    /// Observer–comet distance (AU).
    pub distance: AstronomicalUnit,
}

/// Sky position of a comet at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    /// Right ascension, equatorial J2000 (radians, [0, 2π)).
    pub right_ascension: Radian,
    /// Declination, equatorial J2000 (radians).
    pub declination: Radian,
    /// Geocentric distance (AU).
    pub distance: AstronomicalUnit,
    /// Present when an observer location was supplied.
    pub horizontal: Option<HorizontalPosition>,
}

/// Altitude, azimuth and distance of `elements` seen from `observer` at `epoch`.
pub fn horizontal_position<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    elements: &CometaryElements,
    epoch: &Epoch,
    observer: &ObserverLocation,
) -> Result<HorizontalPosition, AlmanacError> {
    let geocentric = ephemeris.geocentric_position(elements, epoch)?;
    let of_date = precession_j2000_to_date(centuries_since_j2000(epoch)) * geocentric;
    let topocentric = of_date - observer.geocentric_position_of_date(epoch);

    let (ra, dec, distance) = cartesian_to_radec(&topocentric);
    let hour_angle = observer.local_sidereal_time(epoch) - ra;
    let (altitude, azimuth) = hadec_to_altaz(hour_angle, dec, observer.latitude * RADEG);

    Ok(HorizontalPosition {
        altitude: altitude / RADEG,
        azimuth: azimuth / RADEG,
        distance,
    })
}

/// Compute the sky position of `record` at `epoch`.
///
/// Arguments
/// -----------------
/// * `ephemeris`: propagation and Earth position service.
/// * `record`: the catalog comet.
/// * `epoch`: the instant of interest.
/// * `observer`: optional ground location; adds the horizontal position.
///
/// Return
/// ----------
/// * The [`SkyPosition`], or the ephemeris error (typically
///   [`AlmanacError::PropagationFailed`]) unchanged.
pub fn compute_position<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    record: &CatalogRecord,
    epoch: &Epoch,
    observer: Option<&ObserverLocation>,
) -> Result<SkyPosition, AlmanacError> {
    let geocentric = ephemeris.geocentric_position(&record.elements, epoch)?;
    let (right_ascension, declination, distance) = cartesian_to_radec(&geocentric);

    let horizontal = observer
        .map(|obs| horizontal_position(ephemeris, &record.elements, epoch, obs))
        .transpose()?;

    Ok(SkyPosition {
        right_ascension,
        declination,
        distance,
        horizontal,
    })
}

impl fmt::Display for HorizontalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Altitude {} Azimuth {} distance {:.4} au",
            format_degrees(self.altitude, false),
            format_degrees(self.azimuth, false),
            self.distance
        )
    }
}

impl fmt::Display for SkyPosition {
    /// RA, DEC and distance on the first line, then altitude, azimuth and distance when an
    /// observer was given.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RA {} DEC {} distance {:.4} au",
            format_hours(self.right_ascension),
            format_radians(self.declination, true),
            self.distance
        )?;
        if let Some(horizontal) = &self.horizontal {
            write!(f, "\n{horizontal}")?;
        }
        Ok(())
    }
}
