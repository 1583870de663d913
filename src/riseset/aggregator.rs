//! Grouping of rise/set events into one row per local calendar day.
//!
//! Events arrive in ascending time order. A single in-progress [`DayRow`] is kept in a
//! [`DayAccumulator`]; when an event falls on another local date, the in-progress row is
//! emitted as is, even with only one of rise/set filled, and a new row starts. At the end of
//! the stream the last row is emitted if any field is filled.
//!
//! Two events of the same kind on the same date: the later one wins.
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::{
    almanac_errors::AlmanacError, constants::Degree, riseset::RiseSetEvent, time::epoch_to_utc,
};

/// Local time and azimuth of one horizon crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub time: DateTime<FixedOffset>,
    pub azimuth: Degree,
}

/// Rise and set of one local calendar day; either may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub date: NaiveDate,
    pub rise: Option<Crossing>,
    pub set: Option<Crossing>,
}

impl DayRow {
    pub fn new(date: NaiveDate) -> Self {
        DayRow {
            date,
            rise: None,
            set: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.rise.is_none() && self.set.is_none()
    }
}

/// In-progress row keyed by the date of the last event.
#[derive(Debug, Default)]
pub struct DayAccumulator {
    current: Option<DayRow>,
}

impl DayAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one crossing on local date `date`.
    ///
    /// Return
    /// ----------
    /// * The previous row when `date` differs from its date, `None` otherwise.
    pub fn push(&mut self, date: NaiveDate, is_rise: bool, crossing: Crossing) -> Option<DayRow> {
        let finished = match &self.current {
            Some(row) if row.date != date => self.current.take(),
            _ => None,
        };

        let row = self.current.get_or_insert_with(|| DayRow::new(date));
        if is_rise {
            row.rise = Some(crossing);
        } else {
            row.set = Some(crossing);
        }

        finished
    }

    /// Emit the in-progress row if it holds anything; the accumulator is empty afterwards.
    pub fn flush(&mut self) -> Option<DayRow> {
        self.current.take().filter(|row| !row.is_blank())
    }
}

/// Lazy iterator of [`DayRow`]s over a stream of [`RiseSetEvent`]s.
///
/// The azimuth of each crossing is recomputed at the event instant by the `azimuth` closure.
/// The first error ends the iteration.
pub struct DayRows<I, F, Tz: TimeZone> {
    events: I,
    azimuth: F,
    zone: Tz,
    accumulator: DayAccumulator,
    done: bool,
}

impl<I, F, Tz> DayRows<I, F, Tz>
where
    I: Iterator<Item = RiseSetEvent>,
    F: FnMut(&RiseSetEvent) -> Result<Degree, AlmanacError>,
    Tz: TimeZone,
{
    fn crossing(&mut self, event: &RiseSetEvent) -> Result<(NaiveDate, Crossing), AlmanacError> {
        let azimuth = (self.azimuth)(event)?;
        let local = epoch_to_utc(&event.epoch)?.with_timezone(&self.zone);
        Ok((
            local.date_naive(),
            Crossing {
                time: local.fixed_offset(),
                azimuth,
            },
        ))
    }
}

impl<I, F, Tz> Iterator for DayRows<I, F, Tz>
where
    I: Iterator<Item = RiseSetEvent>,
    F: FnMut(&RiseSetEvent) -> Result<Degree, AlmanacError>,
    Tz: TimeZone,
{
    type Item = Result<DayRow, AlmanacError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(event) = self.events.next() {
            let (date, crossing) = match self.crossing(&event) {
                Ok(found) => found,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if let Some(row) = self.accumulator.push(date, event.is_rise, crossing) {
                return Some(Ok(row));
            }
        }

        self.done = true;
        self.accumulator.flush().map(Ok)
    }
}

/// Group `events` by calendar day in `zone`.
///
/// Arguments
/// -----------------
/// * `events`: rise/set events in ascending time order.
/// * `zone`: display time zone defining the calendar days.
/// * `azimuth`: azimuth of the body at an event instant (degrees).
///
/// Return
/// ----------
/// * A lazy iterator consuming `events` once.
pub fn aggregate<E, F, Tz>(events: E, zone: Tz, azimuth: F) -> DayRows<E::IntoIter, F, Tz>
where
    E: IntoIterator<Item = RiseSetEvent>,
    F: FnMut(&RiseSetEvent) -> Result<Degree, AlmanacError>,
    Tz: TimeZone,
{
    DayRows {
        events: events.into_iter(),
        azimuth,
        zone,
        accumulator: DayAccumulator::new(),
        done: false,
    }
}
