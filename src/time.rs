//! # Time conversions
//!
//! Two time representations coexist in the crate:
//!
//! - [`hifitime::Epoch`] for everything astronomical (TT for the dynamics, UTC as an
//!   approximation of UT1 for Earth rotation),
//! - [`chrono::DateTime`] for everything calendar-related (time zones, local dates, display).
//!
//! This module converts between them, parses user supplied date strings and computes the
//! Greenwich mean sidereal time.
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use hifitime::{Epoch, TimeScale, Unit};
use tracing::debug;

use crate::{
    almanac_errors::AlmanacError,
    constants::{DAYS_PER_CENTURY, DPI, MJD, T2000},
};

/// Convert a UTC calendar instant into a hifitime [`Epoch`].
pub fn utc_to_epoch(instant: &DateTime<Utc>) -> Epoch {
    let seconds =
        instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    Epoch::from_unix_seconds(seconds)
}

/// Convert a hifitime [`Epoch`] into a UTC calendar instant.
///
/// The conversion is rounded to the nearest microsecond, which is far below the
/// resolution of anything displayed by the crate.
///
/// Return
/// ----------
/// * The instant, or [`AlmanacError::InvalidTime`] if it falls outside chrono's range.
pub fn epoch_to_utc(epoch: &Epoch) -> Result<DateTime<Utc>, AlmanacError> {
    let micros = (epoch.to_unix_seconds() * 1e6).round() as i64;
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| AlmanacError::InvalidTime(format!("{epoch} is out of range")))
}

/// Naive formats tried in order when the input carries no zone information.
const NAIVE_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%b %d %Y"];

const ZONED_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%dT%H:%M%z",
];

/// Parse a user supplied date/time string.
///
/// Inputs carrying an explicit offset (RFC 3339, RFC 2822, `… +0200`) are taken as is.
/// Zone-less inputs are interpreted as wall-clock time in `zone`; bare dates mean midnight
/// in that zone. As a last resort the string is handed to hifitime, which understands
/// explicit time scales such as `2020-07-10T00:00:00 TT`.
///
/// Arguments
/// -----------------
/// * `text`: the string given on the command line.
/// * `zone`: zone used for inputs without offset (the process local zone in the CLI).
///
/// Return
/// ----------
/// * The corresponding UTC instant, or [`AlmanacError::InvalidTime`].
pub fn parse_datetime<Tz: TimeZone>(text: &str, zone: &Tz) -> Result<DateTime<Utc>, AlmanacError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });

    if let Some(naive) = naive {
        return localize(&naive, zone);
    }

    let epoch = Epoch::from_str(text)
        .map_err(|e| AlmanacError::InvalidTime(format!("cannot parse '{text}': {e}")))?;
    epoch_to_utc(&epoch)
}

/// Attach `zone` to a wall-clock time.
///
/// Ambiguous times (end of daylight saving) resolve to the earliest instant; times that do
/// not exist in the zone (start of daylight saving) are rejected.
pub fn localize<Tz: TimeZone>(
    naive: &NaiveDateTime,
    zone: &Tz,
) -> Result<DateTime<Utc>, AlmanacError> {
    zone.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AlmanacError::InvalidTime(format!("{naive} does not exist in the requested zone"))
        })
}

/// IANA zone of the process, when it has one.
///
/// A non-empty `TZ` variable wins (`Europe/Paris`, `:Europe/Paris` or a path under a
/// `zoneinfo` directory); a `TZ` rule that names no IANA zone (`<+03>-3`) gives `None`.
/// Without `TZ`, the system zone is asked for its name.
///
/// Return
/// ----------
/// * `None` when the zone has no IANA name, in which case [`chrono::Local`] is the fallback.
pub fn local_zone() -> Option<chrono_tz::Tz> {
    match std::env::var("TZ") {
        Ok(tz) if !tz.is_empty() => zone_from_tz_variable(&tz),
        _ => match iana_time_zone::get_timezone() {
            Ok(name) => name.parse().ok(),
            Err(e) => {
                debug!(error = %e, "system time zone has no IANA name");
                None
            }
        },
    }
}

fn zone_from_tz_variable(tz: &str) -> Option<chrono_tz::Tz> {
    let name = tz.trim_start_matches(':');
    let name = name.split_once("zoneinfo/").map_or(name, |(_, zone)| zone);
    name.parse().ok()
}

/// Build a TT epoch from a calendar date with a fractional day (`YYYY MM DD.ddddd`).
///
/// MPC element files give perihelion passages and osculation epochs this way, in TT.
///
/// Return
/// ----------
/// * `None` if the date does not exist in the Gregorian calendar.
pub fn frac_date_tt_to_epoch(year: i32, month: u8, day_fraction: f64) -> Option<Epoch> {
    if !(1.0..32.0).contains(&day_fraction) {
        return None;
    }
    let day = day_fraction.trunc();
    let midnight =
        Epoch::maybe_from_gregorian(year, month, day as u8, 0, 0, 0, 0, TimeScale::TT).ok()?;
    Some(midnight + (day_fraction - day) * Unit::Day)
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982/2000 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # References
/// * IAU 1982, IERS Conventions 1996/2000.
/// * Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: MJD) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / DAYS_PER_CENTURY;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    let h = (tjm - itjm) * DPI;
    (gmst0 + h * RAP).rem_euclid(DPI)
}

/// Julian centuries of TT elapsed since J2000.0.
pub fn centuries_since_j2000(epoch: &Epoch) -> f64 {
    (epoch.to_mjd_tt_days() - T2000) / DAYS_PER_CENTURY
}
