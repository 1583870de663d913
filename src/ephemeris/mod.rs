//! # Ephemeris capability
//!
//! The position and rise/set computations only need two services: the heliocentric position
//! of the comet and the heliocentric position of the Earth. They are behind the
//! [`Ephemeris`] trait so that a higher-precision source can replace the default
//! [`TwoBodyEphemeris`] without touching the callers.
//!
//! All vectors are expressed in the **equatorial mean J2000** frame, in AU.
use hifitime::{Epoch, Unit};
use nalgebra::Vector3;

use crate::{
    almanac_errors::AlmanacError,
    constants::{GAUSS_GRAV_SQUARED, VLIGHT_AU},
    orbit_type::cometary_element::CometaryElements,
};

/// Low-precision solar theory for the Earth position.
pub mod earth;

/// Number of light-time iterations.
const LIGHT_TIME_ITERATIONS: usize = 3;

pub trait Ephemeris {
    /// Heliocentric position of the body described by `elements` at `epoch`.
    fn heliocentric_position(
        &self,
        elements: &CometaryElements,
        epoch: &Epoch,
    ) -> Result<Vector3<f64>, AlmanacError>;

    /// Heliocentric position of the Earth's centre at `epoch`.
    fn earth_heliocentric_position(&self, epoch: &Epoch) -> Vector3<f64>;

    /// Astrometric geocentric position of the body: the comet is taken at the emission time,
    /// the Earth at the reception time `epoch`.
    ///
    /// Return
    /// ----------
    /// * The vector from the Earth's centre to the comet (AU).
    fn geocentric_position(
        &self,
        elements: &CometaryElements,
        epoch: &Epoch,
    ) -> Result<Vector3<f64>, AlmanacError> {
        let earth = self.earth_heliocentric_position(epoch);
        let mut rho = self.heliocentric_position(elements, epoch)? - earth;

        for _ in 0..LIGHT_TIME_ITERATIONS {
            let light_time = rho.norm() / VLIGHT_AU;
            let emission = *epoch - light_time * Unit::Day;
            rho = self.heliocentric_position(elements, &emission)? - earth;
        }
        Ok(rho)
    }
}

/// Keplerian motion around the Sun, unperturbed, with the low-precision Earth of [`earth`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoBodyEphemeris {
    /// Gravitational parameter of the Sun (AU³/day²).
    pub mu: f64,
}

impl Default for TwoBodyEphemeris {
    fn default() -> Self {
        TwoBodyEphemeris {
            mu: GAUSS_GRAV_SQUARED,
        }
    }
}

impl Ephemeris for TwoBodyEphemeris {
    fn heliocentric_position(
        &self,
        elements: &CometaryElements,
        epoch: &Epoch,
    ) -> Result<Vector3<f64>, AlmanacError> {
        elements.position_at(epoch, self.mu)
    }

    fn earth_heliocentric_position(&self, epoch: &Epoch) -> Vector3<f64> {
        earth::earth_heliocentric_equatorial(epoch)
    }
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;
    use crate::constants::{RADEG, T2000};
    use approx::assert_relative_eq;
    use hifitime::TimeScale;

    #[test]
    fn test_light_time_moves_comet_backwards() {
        let t0 = Epoch::from_mjd_in_time_scale(T2000, TimeScale::TT);
        let elements = CometaryElements {
            perihelion_time: t0,
            perihelion_distance: 1.2,
            eccentricity: 1.0,
            inclination: 80.0 * RADEG,
            ascending_node_longitude: 10.0 * RADEG,
            periapsis_argument: 20.0 * RADEG,
        };
        let ephem = TwoBodyEphemeris::default();

        let epoch = t0 + 30.0 * Unit::Day;
        let rho = ephem.geocentric_position(&elements, &epoch).unwrap();
        let geometric = ephem.heliocentric_position(&elements, &epoch).unwrap()
            - ephem.earth_heliocentric_position(&epoch);

        // a comet moves ~0.02 AU/day near 1 AU: the correction is tiny but not zero
        let shift = (rho - geometric).norm();
        assert!(shift > 1e-6 && shift < 1e-3);

        let emission = epoch - rho.norm() / VLIGHT_AU * Unit::Day;
        let expected = ephem.heliocentric_position(&elements, &emission).unwrap()
            - ephem.earth_heliocentric_position(&epoch);
        assert_relative_eq!(rho, expected, epsilon = 1e-10);
    }
}
