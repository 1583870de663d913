//! Sexagesimal formatting of angles for display.
use crate::constants::{Degree, Radian, RADEG, RADH};

/// Split a non-negative quantity into `(units, minutes, seconds)` after rounding the seconds
/// to `places` decimals, carrying into minutes and units when the rounding overflows.
fn split_sexagesimal(value: f64, places: usize) -> (u64, u64, f64) {
    let scale = 10f64.powi(places as i32);
    let ticks = (value * 3600.0 * scale).round() as u64;
    let ticks_per_minute = (60.0 * scale) as u64;
    let ticks_per_unit = 60 * ticks_per_minute;

    let units = ticks / ticks_per_unit;
    let minutes = (ticks % ticks_per_unit) / ticks_per_minute;
    let seconds = (ticks % ticks_per_minute) as f64 / scale;
    (units, minutes, seconds)
}

/// Format a right ascension as `HHh MMm SS.SSs`.
///
/// Arguments
/// ---------
/// * `ra`: right ascension in radians, any value (wrapped into [0, 24h)).
pub fn format_hours(ra: Radian) -> String {
    let hours = (ra / RADH).rem_euclid(24.0);
    let (h, m, s) = split_sexagesimal(hours, 2);
    format!("{:02}h {:02}m {:05.2}s", h % 24, m, s)
}

/// Format an angle in degrees as `DDdeg MM' SS.S"`.
///
/// Arguments
/// ---------
/// * `angle`: the angle in degrees.
/// * `signed`: always print the sign (declinations), otherwise only a minus sign is shown.
pub fn format_degrees(angle: Degree, signed: bool) -> String {
    let sign = if angle < 0.0 {
        "-"
    } else if signed {
        "+"
    } else {
        ""
    };
    let (d, m, s) = split_sexagesimal(angle.abs(), 1);
    format!("{sign}{d:02}deg {m:02}' {s:04.1}\"")
}

/// [`format_degrees`] for an angle given in radians.
pub fn format_radians(angle: Radian, signed: bool) -> String {
    format_degrees(angle / RADEG, signed)
}
