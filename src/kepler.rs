//! Universal-variable solution of the two-body problem.
//!
//! The formulation works for elliptic (`alpha < 0`), parabolic (`alpha = 0`) and hyperbolic
//! (`alpha > 0`) motion alike, which is what comet orbits require: a large part of the MPC
//! comet list is parabolic or slightly hyperbolic.
//!
//! Notation
//! --------
//! * `r0`: heliocentric distance at the initial epoch (AU)
//! * `sig0`: `r0 · ṙ0`, i.e. the dot product of position and velocity (AU²/day)
//! * `mu`: gravitational parameter (AU³/day²)
//! * `alpha`: twice the specific energy, `v0² − 2μ/r0`
//! * `psi`: universal anomaly
use nalgebra::Vector3;

use crate::almanac_errors::AlmanacError;
use crate::constants::DPI;
use std::f64::consts::PI;

/// Stumpff-like functions `(s0, s1, s2, s3)` of the universal anomaly.
///
/// Small `alpha·psi²` values use the power series directly; large ones are halved until the
/// series converges, then rebuilt with the duplication formulas.
pub(crate) fn s_funct(psi: f64, alpha: f64) -> (f64, f64, f64, f64) {
    const JMAX: usize = 70;
    const HALFMAX: usize = 30;
    const BETACONTR: f64 = 100.0;

    let epsilon = f64::EPSILON;
    let contr = 100.0 * epsilon;
    let overfl = 1.0 / epsilon;

    let beta = alpha * psi.powi(2);
    let mut s0: f64;
    let mut s1: f64;
    let s2: f64;
    let s3: f64;

    if beta.abs() < BETACONTR {
        let mut term2 = psi.powi(2) / 2.0;
        let mut term3 = term2 * psi / 3.0;
        let mut sum2 = term2;
        let mut sum3 = term3;

        for j in 1..=JMAX {
            term2 *= beta / ((2.0 * j as f64 + 1.0) * (2.0 * j as f64 + 2.0));
            sum2 += term2;
            if term2.abs() < contr || term2.abs() > overfl {
                break;
            }
        }

        for j in 1..=JMAX {
            term3 *= beta / ((2.0 * j as f64 + 2.0) * (2.0 * j as f64 + 3.0));
            sum3 += term3;
            if term3.abs() < contr || term3.abs() > overfl {
                break;
            }
        }

        s2 = sum2;
        s3 = sum3;
        s1 = psi + alpha * s3;
        s0 = 1.0 + alpha * s2;
    } else {
        let mut psi2 = psi;
        let mut nhalf = 0;

        for _ in 0..HALFMAX {
            psi2 *= 0.5;
            nhalf += 1;
            if (alpha * psi2.powi(2)).abs() < BETACONTR {
                break;
            }
        }

        let beta_half = alpha * psi2.powi(2);
        let mut term0 = 1.0;
        let mut term1 = psi2;
        s0 = 1.0;
        s1 = psi2;

        for j in 1..=JMAX {
            term0 *= beta_half / ((2 * j - 1) as f64 * (2 * j) as f64);
            s0 += term0;
            if term0.abs() < contr || term0.abs() > overfl {
                break;
            }
        }

        for j in 1..=JMAX {
            term1 *= beta_half / ((2 * j) as f64 * (2 * j + 1) as f64);
            s1 += term1;
            if term1.abs() < contr || term1.abs() > overfl {
                break;
            }
        }

        for _ in 0..nhalf {
            let s02 = 2.0 * s0.powi(2) - 1.0;
            let s12 = 2.0 * s0 * s1;
            s0 = s02;
            s1 = s12;
        }

        s3 = (s1 - psi) / alpha;
        s2 = (s0 - 1.0) / alpha;
    }

    (s0, s1, s2, s3)
}

/// Principal value of an angle in [0, 2π).
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Principal difference between two angles, in [-π, π].
fn angle_diff(a: f64, b: f64) -> f64 {
    let mut diff = principal_angle(a) - principal_angle(b);
    if diff > PI {
        diff -= DPI;
    } else if diff < -PI {
        diff += DPI;
    }
    diff
}

/// Below this value of `|alpha|·r0/μ` the orbit is treated as a parabola.
const PARABOLIC_ALPHA: f64 = 1e-12;

/// Initial guess of the universal anomaly from the classical anomalies.
///
/// The parabolic branch solves the cubic `dt = r0·ψ + σ0·ψ²/2 + μ·ψ³/6` exactly when the
/// epoch is the perihelion passage (`σ0 = 0`), which is how comet elements are given.
fn prelim_kepuni(dt: f64, r0: f64, sig0: f64, mu: f64, alpha: f64, e0: f64, contr: f64) -> f64 {
    const ITX: usize = 20;

    if alpha.abs() < PARABOLIC_ALPHA * mu / r0 {
        // parabolic: Cardano on μ/6·ψ³ + r0·ψ − dt = 0
        let p = 6.0 * r0 / mu;
        let q = -6.0 * dt / mu;
        let sq = ((q / 2.0).powi(2) + (p / 3.0).powi(3)).sqrt();
        return (-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt() - sig0 / r0;
    }

    if alpha < 0.0 {
        // elliptic
        let a0 = -mu / alpha;
        let enne = (-alpha.powi(3)).sqrt() / mu;
        let (u0, u) = if e0 < contr {
            (0.0, enne * dt)
        } else {
            let cosu0 = (1.0 - r0 / a0) / e0;
            let mut u0 = if cosu0.abs() <= 1.0 {
                cosu0.acos()
            } else if cosu0 >= 1.0 {
                0.0
            } else {
                PI
            };

            if sig0 < 0.0 {
                u0 = -u0;
            }

            u0 = principal_angle(u0);
            let ell0 = principal_angle(u0 - e0 * u0.sin());
            let ell = principal_angle(ell0 + enne * dt);
            let mut u = PI;

            for _ in 0..ITX {
                let du = -(u - e0 * u.sin() - ell) / (1.0 - e0 * u.cos());
                u += du;
                if du.abs() < contr * 1e3 {
                    break;
                }
            }
            (u0, u)
        };

        // the principal difference loses whole revolutions; recover them from the mean motion
        let diff = angle_diff(u, u0);
        let revolutions = ((enne * dt - diff) / DPI).round();
        (diff + revolutions * DPI) / (-alpha).sqrt()
    } else {
        // hyperbolic
        let a0 = -mu / alpha;
        let enne = alpha.powi(3).sqrt() / mu;
        let coshf0 = (1.0 - r0 / a0) / e0;
        let mut f0 = if coshf0 > 1.0 {
            (coshf0 + (coshf0.powi(2) - 1.0).sqrt()).ln()
        } else {
            0.0
        };

        if sig0 < 0.0 {
            f0 = -f0;
        }

        let ell0 = e0 * f0.sinh() - f0;
        let ell = ell0 + enne * dt;
        let mut f: f64 = 0.0;

        for _ in 0..ITX {
            if f.abs() < 15.0 {
                let df = -(e0 * f.sinh() - f - ell) / (e0 * f.cosh() - 1.0);
                let ff = f + df;
                f = if f * ff < 0.0 { f / 2.0 } else { ff };
                if df.abs() < contr * 1e3 {
                    break;
                }
            } else {
                f /= 2.0;
            }
        }

        (f - f0) / alpha.sqrt()
    }
}

/// Solve the universal Kepler equation with a Newton iteration.
///
/// Return
/// ----------
/// * `(psi, s0, s1, s2, s3)` at convergence, or `None` if the iteration diverges.
pub(crate) fn solve_kepuni(
    dt: f64,
    r0: f64,
    sig0: f64,
    mu: f64,
    alpha: f64,
    e0: f64,
) -> Option<(f64, f64, f64, f64, f64)> {
    const JMAX: usize = 100;
    let epsilon = f64::EPSILON;
    let contr = 100.0 * epsilon;

    let mut psi = prelim_kepuni(dt, r0, sig0, mu, alpha, e0, contr);
    if !psi.is_finite() {
        return None;
    }

    for _ in 0..JMAX {
        let (s0, s1, s2, s3) = s_funct(psi, alpha);

        let fun = r0 * s1 + sig0 * s2 + mu * s3 - dt;
        let funp = r0 * s0 + sig0 * s1 + mu * s2;

        if s3.abs() > 1e-2 / epsilon || funp == 0.0 {
            return None;
        }

        let dpsi = -fun / funp;
        let psi1 = psi + dpsi;
        psi = if psi1 * psi < 0.0 { psi / 2.0 } else { psi1 };

        if dpsi.abs() < contr || dpsi.abs() < contr * 10.0 * psi.abs() {
            let (s0, s1, s2, s3) = s_funct(psi, alpha);
            return Some((psi, s0, s1, s2, s3));
        }
    }

    None
}

/// Propagate a heliocentric state `(r0, v0)` by `dt` days using Lagrange f and g coefficients.
///
/// Arguments
/// -----------------
/// * `r0`, `v0`: initial position (AU) and velocity (AU/day).
/// * `dt`: elapsed time in days (may be negative).
/// * `mu`: gravitational parameter (AU³/day²).
///
/// Return
/// ----------
/// * The position at `t0 + dt`, or [`AlmanacError::PropagationFailed`] if the universal
///   Kepler equation does not converge.
pub fn propagate_position(
    r0: &Vector3<f64>,
    v0: &Vector3<f64>,
    dt: f64,
    mu: f64,
) -> Result<Vector3<f64>, AlmanacError> {
    let r0_norm = r0.norm();
    let sig0 = r0.dot(v0);
    let alpha = v0.norm_squared() - 2.0 * mu / r0_norm;

    let h = r0.cross(v0);
    let ecc = (v0.cross(&h) / mu - r0 / r0_norm).norm();

    let (_, _, _, s2, s3) = solve_kepuni(dt, r0_norm, sig0, mu, alpha, ecc).ok_or_else(|| {
        AlmanacError::PropagationFailed(format!(
            "universal Kepler equation did not converge (dt = {dt} d, e = {ecc})"
        ))
    })?;

    let f = 1.0 - mu * s2 / r0_norm;
    let g = dt - mu * s3;
    Ok(f * r0 + g * v0)
}
