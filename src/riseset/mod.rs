//! # Rise and set of a comet
//!
//! Two stages:
//!
//! 1. [`find_rise_set_events`] samples the altitude of the comet every
//!    [`RISE_SET_STEP_DAYS`] over the interval and refines every crossing of the apparent
//!    horizon ([`HORIZON_DEGREES`]) with Brent's method.
//! 2. [`aggregator::aggregate`] groups the resulting events by local calendar day.
//!
//! [`schedule`] chains both, widening the search start by [`SCHEDULE_LOOKBACK_HOURS`] so that
//! a rising just before the requested start still pairs with the same evening's setting.
use chrono::TimeZone;
use hifitime::{Epoch, Unit};
use roots::{find_root_brent, SimpleConvergency};
use tracing::debug;

use crate::{
    almanac_errors::AlmanacError,
    catalog::CatalogRecord,
    constants::{Degree, HORIZON_DEGREES, RISE_SET_STEP_DAYS, SCHEDULE_LOOKBACK_HOURS},
    ephemeris::Ephemeris,
    observers::ObserverLocation,
    position::horizontal_position,
};

pub mod aggregator;

use aggregator::{aggregate, Crossing, DayRow};

/// A crossing of the horizon: `is_rise` is the new value of the "above the horizon" predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiseSetEvent {
    pub epoch: Epoch,
    pub is_rise: bool,
}

/// Convergence tolerance of the refinement, in days (~10 ms).
const ROOT_TOLERANCE_DAYS: f64 = 1e-7;

/// Find the horizon crossings of `altitude` in `[start, end]`.
///
/// Arguments
/// -----------------
/// * `altitude`: altitude of the body (degrees) at an epoch.
/// * `start`, `end`: search interval.
///
/// Return
/// ----------
/// * The events in ascending order, or the first error of `altitude` or of the root finder.
///
/// Remarks
/// -------
/// * Two crossings closer than the sampling step are missed; with a one-hour step this only
///   affects bodies grazing the horizon.
pub fn find_rise_set_events<F>(
    mut altitude: F,
    start: Epoch,
    end: Epoch,
) -> Result<Vec<RiseSetEvent>, AlmanacError>
where
    F: FnMut(&Epoch) -> Result<Degree, AlmanacError>,
{
    let span = (end - start).to_unit(Unit::Day);
    if span <= 0.0 {
        return Ok(Vec::new());
    }

    let steps = (span / RISE_SET_STEP_DAYS).ceil() as usize;
    let at = |offset: f64| start + offset * Unit::Day;
    let mut above_horizon = |offset: f64| -> Result<f64, AlmanacError> {
        Ok(altitude(&at(offset))? - HORIZON_DEGREES)
    };

    let mut events = Vec::new();
    let mut previous = (0.0, above_horizon(0.0)?);

    for k in 1..=steps {
        let offset = (k as f64 * RISE_SET_STEP_DAYS).min(span);
        let value = above_horizon(offset)?;
        let (prev_offset, prev_value) = previous;
        previous = (offset, value);

        if (prev_value > 0.0) == (value > 0.0) {
            continue;
        }

        let mut failure = None;
        let mut convergency = SimpleConvergency {
            eps: ROOT_TOLERANCE_DAYS,
            max_iter: 60,
        };
        let root = find_root_brent(
            prev_offset,
            offset,
            |x: f64| match above_horizon(x) {
                Ok(v) => v,
                Err(e) => {
                    failure.get_or_insert(e);
                    f64::NAN
                }
            },
            &mut convergency,
        );
        if let Some(e) = failure {
            return Err(e);
        }

        events.push(RiseSetEvent {
            epoch: at(root?),
            is_rise: value > 0.0,
        });
    }

    debug!(count = events.len(), "horizon crossings found");
    Ok(events)
}

/// Rise/set schedule of `record` for `days` days from `start`, grouped by day in `zone`.
///
/// Return
/// ----------
/// * One [`DayRow`] per local date holding at least one crossing.
pub fn schedule<E, Tz>(
    ephemeris: &E,
    record: &CatalogRecord,
    observer: &ObserverLocation,
    start: &Epoch,
    days: u32,
    zone: &Tz,
) -> Result<Vec<DayRow>, AlmanacError>
where
    E: Ephemeris + ?Sized,
    Tz: TimeZone,
{
    let search_start = *start - SCHEDULE_LOOKBACK_HOURS as f64 * Unit::Hour;
    let end = *start + f64::from(days) * Unit::Day;

    let horizontal =
        |epoch: &Epoch| horizontal_position(ephemeris, &record.elements, epoch, observer);
    let events =
        find_rise_set_events(|t| horizontal(t).map(|h| h.altitude), search_start, end)?;

    aggregate(events, zone.clone(), |event| {
        horizontal(&event.epoch).map(|h| h.azimuth)
    })
    .collect()
}

/// Text table of a schedule, one line per day, blank cells for missing crossings.
pub fn format_schedule(rows: &[DayRow]) -> String {
    let cell = |crossing: &Option<Crossing>| match crossing {
        Some(c) => format!("{:<7}  {:>7.1}", c.time.format("%H:%M"), c.azimuth),
        None => format!("{:<7}  {:>7}", "", ""),
    };

    let header = format!(
        "{:<10}  {:<7}  {:>7}  {:<7}  {:>7}",
        "Date", "Rise", "Azimuth", "Set", "Azimuth"
    );
    let lines = rows.iter().map(|row| {
        format!(
            "{}  {}  {}",
            row.date.format("%Y-%m-%d"),
            cell(&row.rise),
            cell(&row.set)
        )
        .trim_end()
        .to_string()
    });

    std::iter::once(header)
        .chain(lines)
        .map(|line| line + "\n")
        .collect()
}
