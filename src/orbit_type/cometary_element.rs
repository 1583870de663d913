use std::fmt;

use hifitime::Epoch;
use nalgebra::{Matrix3, Vector3};

use crate::{
    almanac_errors::AlmanacError,
    constants::{AstronomicalUnit, Radian, RADEG},
    kepler::propagate_position,
    ref_system::{ecliptic_to_equatorial_j2000, rotmt},
};

/// Shape of a conic, from its eccentricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConicKind {
    Elliptic,
    Parabolic,
    Hyperbolic,
}

/// # Cometary orbital elements
///
/// Perihelion-based elements `(q, e, i, Ω, ω, T)` as published by the Minor Planet Center.
/// Unlike Keplerian elements they stay finite for parabolic (`e = 1`) and hyperbolic (`e > 1`)
/// orbits, which make up a large share of the comet catalog.
///
/// Units & conventions
/// --------------------
/// - Distances in **AU**; angles in **radians**.
/// - Angles are referred to the **mean ecliptic and equinox of J2000**.
/// - The time of perihelion passage `T` is a TT [`Epoch`].
///
/// See also
/// ------------
/// * [`crate::kepler::propagate_position`] – Universal-variable propagation used by
///   [`CometaryElements::position_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct CometaryElements {
    /// Time of perihelion passage `T` (TT).
    pub perihelion_time: Epoch,

    /// Perihelion distance `q` (AU).
    pub perihelion_distance: AstronomicalUnit,

    /// Eccentricity `e`.
    pub eccentricity: f64,

    /// Inclination `i` (rad).
    pub inclination: Radian,

    /// Longitude of the ascending node `Ω` (rad).
    pub ascending_node_longitude: Radian,

    /// Argument of perihelion `ω` (rad).
    pub periapsis_argument: Radian,
}

impl CometaryElements {
    /// Eccentricities closer than this to 1 are treated as parabolic.
    pub const PARABOLIC_TOLERANCE: f64 = 1e-9;

    pub fn conic_kind(&self) -> ConicKind {
        let de = self.eccentricity - 1.0;
        if de.abs() < Self::PARABOLIC_TOLERANCE {
            ConicKind::Parabolic
        } else if de < 0.0 {
            ConicKind::Elliptic
        } else {
            ConicKind::Hyperbolic
        }
    }

    /// Rotation from the orbital plane (x towards perihelion, z along the angular momentum)
    /// to the ecliptic J2000 frame: `Rz(Ω) · Rx(i) · Rz(ω)`.
    fn orbital_plane_to_ecliptic(&self) -> Matrix3<f64> {
        rotmt(self.ascending_node_longitude, 2)
            * rotmt(self.inclination, 0)
            * rotmt(self.periapsis_argument, 2)
    }

    /// Heliocentric state at perihelion, in the **equatorial** J2000 frame.
    ///
    /// At perihelion the velocity is perpendicular to the radius vector, with modulus
    /// `sqrt(μ (1 + e) / q)` (vis-viva).
    ///
    /// Arguments
    /// -----------------
    /// * `mu`: gravitational parameter of the Sun (AU³/day²).
    ///
    /// Return
    /// ----------
    /// * `(position, velocity)` in AU and AU/day.
    pub fn perihelion_state(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let q = self.perihelion_distance;
        let speed = (mu * (1.0 + self.eccentricity) / q).sqrt();

        let rotation = ecliptic_to_equatorial_j2000() * self.orbital_plane_to_ecliptic();
        (
            rotation * Vector3::new(q, 0.0, 0.0),
            rotation * Vector3::new(0.0, speed, 0.0),
        )
    }

    /// Heliocentric equatorial J2000 position at `epoch`.
    ///
    /// Arguments
    /// -----------------
    /// * `epoch`: instant of interest (any time scale, converted to TT).
    /// * `mu`: gravitational parameter of the Sun (AU³/day²).
    ///
    /// Return
    /// ----------
    /// * The position in AU, or [`AlmanacError::PropagationFailed`] for degenerate elements
    ///   or a non-convergent Kepler solution.
    pub fn position_at(&self, epoch: &Epoch, mu: f64) -> Result<Vector3<f64>, AlmanacError> {
        if !(self.perihelion_distance > 0.0) || !(self.eccentricity >= 0.0) {
            return Err(AlmanacError::PropagationFailed(format!(
                "degenerate elements: q = {}, e = {}",
                self.perihelion_distance, self.eccentricity
            )));
        }

        let (r0, v0) = self.perihelion_state(mu);
        let dt = epoch.to_mjd_tt_days() - self.perihelion_time.to_mjd_tt_days();
        propagate_position(&r0, &v0, dt, mu)
    }
}

impl fmt::Display for CometaryElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cometary Elements @ perihelion (MJD TT): {:.6}",
            self.perihelion_time.to_mjd_tt_days()
        )?;
        writeln!(f, "------------------------------------------------")?;
        writeln!(
            f,
            "  q   (perihelion distance)     = {:.6} AU",
            self.perihelion_distance
        )?;
        writeln!(
            f,
            "  e   (eccentricity)            = {:.6}",
            self.eccentricity
        )?;
        writeln!(
            f,
            "  i   (inclination)             = {:.4}°",
            self.inclination / RADEG
        )?;
        writeln!(
            f,
            "  Ω   (longitude of node)       = {:.4}°",
            self.ascending_node_longitude / RADEG
        )?;
        writeln!(
            f,
            "  ω   (argument of perihelion)  = {:.4}°",
            self.periapsis_argument / RADEG
        )
    }
}

#[cfg(test)]
mod cometary_element_test {
    use super::*;
    use crate::constants::{GAUSS_GRAV_SQUARED, T2000};
    use approx::assert_relative_eq;
    use hifitime::TimeScale;

    fn elements(e: f64) -> CometaryElements {
        CometaryElements {
            perihelion_time: Epoch::from_mjd_in_time_scale(T2000, TimeScale::TT),
            perihelion_distance: 0.8,
            eccentricity: e,
            inclination: 30.0 * RADEG,
            ascending_node_longitude: 40.0 * RADEG,
            periapsis_argument: 50.0 * RADEG,
        }
    }

    #[test]
    fn test_conic_kind() {
        assert_eq!(elements(0.5).conic_kind(), ConicKind::Elliptic);
        assert_eq!(elements(1.0).conic_kind(), ConicKind::Parabolic);
        assert_eq!(elements(1.2).conic_kind(), ConicKind::Hyperbolic);
    }

    #[test]
    fn test_perihelion_state_geometry() {
        let el = elements(0.9);
        let (r, v) = el.perihelion_state(GAUSS_GRAV_SQUARED);
        assert_relative_eq!(r.norm(), 0.8, epsilon = 1e-14);
        assert_relative_eq!(r.dot(&v), 0.0, epsilon = 1e-16);
        assert_relative_eq!(
            v.norm_squared(),
            GAUSS_GRAV_SQUARED * 1.9 / 0.8,
            epsilon = 1e-16
        );

        // the angular momentum keeps its inclination w.r.t. the ecliptic pole
        let h = r.cross(&v).normalize();
        let ecliptic_pole = ecliptic_to_equatorial_j2000() * Vector3::z();
        assert_relative_eq!(h.dot(&ecliptic_pole).acos(), 30.0 * RADEG, epsilon = 1e-12);
    }

    #[test]
    fn test_position_at_perihelion_time() {
        let el = elements(1.0);
        let (r0, _) = el.perihelion_state(GAUSS_GRAV_SQUARED);
        let r = el
            .position_at(&el.perihelion_time, GAUSS_GRAV_SQUARED)
            .unwrap();
        assert_relative_eq!(r, r0, epsilon = 1e-12);
    }

    #[test]
    fn test_position_is_symmetric_around_perihelion() {
        let el = elements(0.97);
        let before = el.perihelion_time - 40.0 * hifitime::Unit::Day;
        let after = el.perihelion_time + 40.0 * hifitime::Unit::Day;
        let r1 = el.position_at(&before, GAUSS_GRAV_SQUARED).unwrap();
        let r2 = el.position_at(&after, GAUSS_GRAV_SQUARED).unwrap();
        assert_relative_eq!(r1.norm(), r2.norm(), epsilon = 1e-10);
        assert!(r1.norm() > 0.8);
    }

    #[test]
    fn test_degenerate_elements() {
        let mut el = elements(0.5);
        el.perihelion_distance = 0.0;
        assert!(matches!(
            el.position_at(&el.perihelion_time, GAUSS_GRAV_SQUARED),
            Err(AlmanacError::PropagationFailed(_))
        ));
    }
}
