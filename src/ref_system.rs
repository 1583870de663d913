//! # Reference frames
//!
//! Rotations between the frames used when observing a comet:
//!
//! - **ECLM J2000**: mean ecliptic and equinox of J2000, the frame of MPC orbital elements,
//! - **EQUM J2000**: mean equator and equinox of J2000, the frame of the reported RA/DEC,
//! - **EQUM of date**: mean equator and equinox of the observation epoch, the frame in which
//!   the Earth rotation angle is applied for altitude/azimuth.
//!
//! All matrices are **active** rotations acting on column vectors.
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI, OBLIQUITY_J2000, RADEG};

/// Active rotation of angle `alpha` around the coordinate axis `k` (0 = x, 1 = y, 2 = z).
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
pub fn rotmt(alpha: Radian, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation from the ecliptic J2000 frame to the equatorial J2000 frame.
pub fn ecliptic_to_equatorial_j2000() -> Matrix3<f64> {
    rotmt(OBLIQUITY_J2000, 0)
}

/// Precession matrix from the mean equator of J2000 to the mean equator of date (IAU 1976).
///
/// Arguments
/// ---------
/// * `t`: Julian centuries of TT since J2000.0.
///
/// Details
/// -------
/// The classical angles are
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// θ(T) = (0.5567530 − 0.0001185·T − 0.0000116·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// ```
/// and the transformation is `Rz(z) · Ry(−θ) · Rz(ζ)` with active rotations.
pub fn precession_j2000_to_date(t: f64) -> Matrix3<f64> {
    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

/// Convert a 3D Cartesian position vector to right ascension and declination.
///
/// Returns
/// --------
/// * Tuple `(α, δ, ρ)`:
///     - `α`: right ascension in radians, in the range [0, 2π).
///     - `δ`: declination in radians, in the range [−π/2, +π/2].
///     - `ρ`: Euclidean norm of the vector (distance to the origin).
///
/// Remarks
/// -------
/// * If the input vector has zero norm, the result is `(0.0, 0.0, 0.0)`.
pub fn cartesian_to_radec(cartesian_position: &Vector3<f64>) -> (Radian, Radian, f64) {
    let pos_norm = cartesian_position.norm();
    if pos_norm == 0. {
        return (0.0, 0.0, pos_norm);
    }

    let delta = (cartesian_position.z / pos_norm).clamp(-1.0, 1.0).asin();
    let alpha = cartesian_position
        .y
        .atan2(cartesian_position.x)
        .rem_euclid(DPI);
    (alpha, delta, pos_norm)
}

/// Altitude and azimuth from hour angle and declination for an observer at latitude `phi`.
///
/// Azimuth is measured from the north towards the east, in [0, 2π).
pub fn hadec_to_altaz(hour_angle: Radian, dec: Radian, phi: Radian) -> (Radian, Radian) {
    let (sin_h, cos_h) = hour_angle.sin_cos();
    let (sin_d, cos_d) = dec.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();

    let altitude = (sin_p * sin_d + cos_p * cos_d * cos_h).clamp(-1.0, 1.0).asin();
    let azimuth = (-cos_d * sin_h)
        .atan2(sin_d * cos_p - cos_d * cos_h * sin_p)
        .rem_euclid(DPI);
    (altitude, azimuth)
}
