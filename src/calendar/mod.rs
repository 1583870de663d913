//! # Calendar event extraction
//!
//! Reads one event out of an iCalendar file and converts its times to the local zone.
//!
//! The document is parsed into its component tree by [`ics_parser`], every `VEVENT`
//! encountered during a pre-order walk is read into the same [`CalendarEvent`], so a file
//! holding several events yields the **last** one. A warning is logged before an event is
//! overwritten.
//!
//! ## Time values
//!
//! | `DTSTART`/`DTEND` form              | zone used                                          |
//! |-------------------------------------|----------------------------------------------------|
//! | `20240105T160000Z`                  | UTC                                                |
//! | `TZID=America/Denver:20240105T090000` | IANA zone, else the `VTIMEZONE` of that id       |
//! |                                     | (observance in effect at that wall time)           |
//! | `20240105T090000` (floating)        | local zone                                         |
//! | `VALUE=DATE:20240105`               | local midnight                                     |
//!
//! Without `DTEND`, the end is `DTSTART + DURATION`, else one day after a date start, else
//! the start itself.
//!
//! ## See also
//! ------------
//! * [`render`] – Text and `remind(1)` renderings of the extracted event.
use std::{collections::HashMap, fmt, fs};

use camino::Utf8Path;
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use tracing::{debug, warn};

use crate::{almanac_errors::AlmanacError, time::local_zone};
use ics_parser::{Component, ContentLine};
use vtimezone::DeclaredZone;

/// Content lines, component tree, durations.
pub mod ics_parser;
/// Output formats of an event.
pub mod render;
/// Zones defined by `VTIMEZONE` observances.
pub mod vtimezone;

pub use render::{render_reminder, render_text};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";
/// Length of a `YYYYMMDD` value.
const DATE_LENGTH: usize = 8;

/// An instant with the label of the zone it is expressed in.
///
/// Two values compare equal when they denote the same instant with the same zone label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedTime {
    pub time: DateTime<FixedOffset>,
    /// Abbreviation (`MST`, `UTC`) or offset (`+02:00`) of the zone.
    pub zone: String,
}

impl ZonedTime {
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        ZonedTime {
            time: datetime.fixed_offset(),
            zone: datetime.format("%Z").to_string(),
        }
    }

    /// The same instant expressed in `zone`.
    pub fn in_zone<Tz: TimeZone>(&self, zone: &Tz) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        ZonedTime::from_datetime(&self.time.with_timezone(zone))
    }

    /// Whether both values are written in the same zone.
    ///
    /// The offsets must agree, and so must the labels unless one of them is a bare offset
    /// (`+02:00`), which carries no zone name to compare.
    pub fn same_zone(&self, other: &ZonedTime) -> bool {
        self.time.offset() == other.time.offset()
            && (self.zone == other.zone || self.is_numeric_zone() || other.is_numeric_zone())
    }

    fn is_numeric_zone(&self) -> bool {
        self.zone.starts_with(['+', '-'])
    }

    fn shifted(&self, delta: TimeDelta) -> Result<Self, AlmanacError> {
        let time = self.time.checked_add_signed(delta).ok_or_else(|| {
            AlmanacError::InvalidTime(format!("{} + {delta} is out of range", self.time))
        })?;
        Ok(ZonedTime {
            time,
            zone: self.zone.clone(),
        })
    }
}

impl fmt::Display for ZonedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time.format("%a, %d %b %Y %H:%M"), self.zone)
    }
}

/// The event of a calendar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub location: String,
    /// Start in the zone of the file.
    pub start: ZonedTime,
    /// End in the zone of the file.
    pub end: ZonedTime,
    pub local_start: ZonedTime,
    pub local_end: ZonedTime,
}

/// `DTSTART`/`DTEND` value before zone resolution.
#[derive(Debug, Clone, PartialEq)]
enum DateValue {
    Utc(NaiveDateTime),
    Zoned(NaiveDateTime, String),
    Floating(NaiveDateTime),
    Date(NaiveDate),
}

fn date_value(line: &ContentLine) -> Result<DateValue, AlmanacError> {
    let value = line.value.trim();
    let invalid = || AlmanacError::MalformedCalendar(format!("invalid {} '{value}'", line.name));

    let is_date = line
        .param("VALUE")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("DATE"))
        || value.len() == DATE_LENGTH;
    if is_date {
        return NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(DateValue::Date)
            .map_err(|_| invalid());
    }

    let (text, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(text) => (text, true),
        None => (value, false),
    };
    let naive = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).map_err(|_| invalid())?;

    Ok(match (is_utc, line.param("TZID")) {
        (true, _) => DateValue::Utc(naive),
        (false, Some(tzid)) => DateValue::Zoned(naive, tzid.to_string()),
        (false, None) => DateValue::Floating(naive),
    })
}

/// `VTIMEZONE`s of the document by `TZID`.
///
/// A malformed `VTIMEZONE` is skipped: the IANA database may still resolve its `TZID`.
fn declared_zones(calendar: &Component) -> HashMap<String, DeclaredZone> {
    let mut zones = HashMap::new();

    for vtimezone in calendar.walk().filter(|c| c.name == "VTIMEZONE") {
        match DeclaredZone::from_component(vtimezone) {
            Ok(Some(zone)) => {
                zones.insert(zone.tzid.clone(), zone);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring VTIMEZONE"),
        }
    }
    zones
}

fn localize_zoned<Tz: TimeZone>(
    naive: &NaiveDateTime,
    zone: &Tz,
) -> Result<ZonedTime, AlmanacError>
where
    Tz::Offset: fmt::Display,
{
    zone.from_local_datetime(naive)
        .earliest()
        .map(|datetime| ZonedTime::from_datetime(&datetime))
        .ok_or_else(|| {
            AlmanacError::InvalidTime(format!("{naive} does not exist in the event zone"))
        })
}

fn resolve<Tz: TimeZone>(
    value: &DateValue,
    zones: &HashMap<String, DeclaredZone>,
    local: &Tz,
) -> Result<ZonedTime, AlmanacError>
where
    Tz::Offset: fmt::Display,
{
    match value {
        DateValue::Utc(naive) => Ok(ZonedTime::from_datetime(&Utc.from_utc_datetime(naive))),
        DateValue::Zoned(naive, tzid) => {
            if let Ok(zone) = tzid.trim_start_matches('/').parse::<chrono_tz::Tz>() {
                return localize_zoned(naive, &zone);
            }
            let observance = zones
                .get(tzid)
                .and_then(|declared| declared.observance_at(naive))
                .ok_or_else(|| AlmanacError::UnknownTimeZone(tzid.clone()))?;
            let mut zoned = localize_zoned(naive, &observance.offset)?;
            zoned.zone = observance.name.clone();
            Ok(zoned)
        }
        DateValue::Floating(naive) => localize_zoned(naive, local),
        DateValue::Date(date) => localize_zoned(&date.and_time(NaiveTime::MIN), local),
    }
}

fn read_event<Tz: TimeZone>(
    event: &Component,
    zones: &HashMap<String, DeclaredZone>,
    local: &Tz,
) -> Result<CalendarEvent, AlmanacError>
where
    Tz::Offset: fmt::Display,
{
    let dtstart = event
        .property("DTSTART")
        .ok_or_else(|| AlmanacError::MalformedCalendar("VEVENT without DTSTART".into()))?;
    let start_value = date_value(dtstart)?;
    let start = resolve(&start_value, zones, local)?;

    let end = match (event.property("DTEND"), event.property("DURATION")) {
        (Some(dtend), _) => resolve(&date_value(dtend)?, zones, local)?,
        (None, Some(duration)) => start.shifted(ics_parser::duration(&duration.value)?)?,
        (None, None) if matches!(start_value, DateValue::Date(_)) => {
            start.shifted(TimeDelta::days(1))?
        }
        (None, None) => start.clone(),
    };

    Ok(CalendarEvent {
        summary: event.text("SUMMARY").unwrap_or_default(),
        description: event.text("DESCRIPTION").unwrap_or_default(),
        location: event.text("LOCATION").unwrap_or_default(),
        local_start: start.in_zone(local),
        local_end: end.in_zone(local),
        start,
        end,
    })
}

/// Extract the event of an iCalendar document, local times expressed in `local`.
///
/// Arguments
/// -----------------
/// * `bytes`: raw content of the file (UTF-8, optional BOM).
/// * `local`: zone of the `local_*` fields and of floating times.
///
/// Return
/// ----------
/// * The last `VEVENT` of the document, or [`AlmanacError::MalformedCalendar`] when the
///   document cannot be parsed or holds no event.
pub fn extract_with_zone<Tz: TimeZone>(
    bytes: &[u8],
    local: &Tz,
) -> Result<CalendarEvent, AlmanacError>
where
    Tz::Offset: fmt::Display,
{
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AlmanacError::MalformedCalendar(format!("not UTF-8 text: {e}")))?;
    let calendar = ics_parser::parse_calendar(text.trim_start_matches('\u{feff}'))?;
    let zones = declared_zones(&calendar);

    let mut extracted: Option<CalendarEvent> = None;
    for component in calendar.walk().filter(|c| c.name == "VEVENT") {
        if let Some(previous) = &extracted {
            warn!(
                previous = %previous.summary,
                "more than one VEVENT in the calendar, keeping the last one"
            );
        }
        extracted = Some(read_event(component, &zones, local)?);
    }

    let event =
        extracted.ok_or_else(|| AlmanacError::MalformedCalendar("no VEVENT component".into()))?;
    debug!(summary = %event.summary, start = %event.start, "calendar event extracted");
    Ok(event)
}

/// [`extract_with_zone`] in the process local zone.
///
/// The zone is looked up in the IANA database (see [`local_zone`]) so that local times carry
/// their abbreviation (`MST`, `UTC`); an unnamed system zone falls back to [`Local`] and its
/// numeric offset.
pub fn extract(bytes: &[u8]) -> Result<CalendarEvent, AlmanacError> {
    match local_zone() {
        Some(zone) => extract_with_zone(bytes, &zone),
        None => extract_with_zone(bytes, &Local),
    }
}

/// Read and extract the event of the file at `path`.
///
/// Return
/// ----------
/// * [`AlmanacError::FileAccess`] if the file cannot be read, otherwise the result of
///   [`extract_with_zone`].
pub fn extract_file_with_zone<Tz: TimeZone>(
    path: &Utf8Path,
    local: &Tz,
) -> Result<CalendarEvent, AlmanacError>
where
    Tz::Offset: fmt::Display,
{
    let bytes = fs::read(path).map_err(|source| AlmanacError::FileAccess {
        path: path.to_string(),
        source,
    })?;
    extract_with_zone(&bytes, local)
}

/// [`extract_file_with_zone`] in the process local zone, resolved as in [`extract`].
pub fn extract_file(path: &Utf8Path) -> Result<CalendarEvent, AlmanacError> {
    match local_zone() {
        Some(zone) => extract_file_with_zone(path, &zone),
        None => extract_file_with_zone(path, &Local),
    }
}

#[cfg(test)]
mod calendar_test {
    use super::*;
    use chrono::Timelike;

    fn calendar(event_lines: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{event_lines}END:VCALENDAR\r\n")
    }

    fn event(lines: &str) -> String {
        calendar(&format!("BEGIN:VEVENT\r\n{lines}END:VEVENT\r\n"))
    }

    #[test]
    fn test_iana_zone_to_utc() {
        let text = event(
            "SUMMARY:Standup\r\n\
             DTSTART;TZID=America/Denver:20240105T090000\r\n\
             DTEND;TZID=America/Denver:20240105T091500\r\n",
        );
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();

        assert_eq!(extracted.summary, "Standup");
        assert_eq!(extracted.description, "");
        assert_eq!(extracted.location, "");
        assert_eq!(extracted.start.zone, "MST");
        assert_eq!(extracted.start.time.hour(), 9);
        assert_eq!(extracted.local_start.zone, "UTC");
        assert_eq!(extracted.local_start.time.hour(), 16);
        assert_eq!(extracted.local_end.time.minute(), 15);
        assert_eq!(extracted.local_start.time, extracted.start.time);
        assert!(!extracted.start.same_zone(&extracted.local_start));
    }

    #[test]
    fn test_utc_and_floating_values() {
        let denver = chrono_tz::America::Denver;
        let text = event("DTSTART:20240705T150000Z\r\nDTEND:20240705T160000\r\n");
        let extracted = extract_with_zone(text.as_bytes(), &denver).unwrap();

        assert_eq!(extracted.start.zone, "UTC");
        assert_eq!(extracted.local_start.zone, "MDT");
        assert_eq!(extracted.local_start.time.hour(), 9);

        // Floating end: wall clock of the local zone
        assert_eq!(extracted.end.zone, "MDT");
        assert_eq!(extracted.local_end.time.hour(), 16);
        assert!(extracted.end.same_zone(&extracted.local_end));
    }

    #[test]
    fn test_end_from_duration_or_date() {
        let text = event("DTSTART:20240105T090000Z\r\nDURATION:PT1H30M\r\n");
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(
            extracted.end.time - extracted.start.time,
            TimeDelta::minutes(90)
        );

        let text = event("DTSTART;VALUE=DATE:20240105\r\n");
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.start.time.hour(), 0);
        assert_eq!(extracted.end.time - extracted.start.time, TimeDelta::days(1));

        let text = event("DTSTART:20240105T090000Z\r\n");
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.end, extracted.start);
    }

    const OBSERVATORY: &str = "BEGIN:VTIMEZONE\r\n\
        TZID:Observatory Time\r\n\
        BEGIN:DAYLIGHT\r\n\
        DTSTART:19900325T020000\r\n\
        RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU\r\n\
        TZOFFSETFROM:+0200\r\n\
        TZOFFSETTO:+0300\r\n\
        TZNAME:OBDT\r\n\
        END:DAYLIGHT\r\n\
        BEGIN:STANDARD\r\n\
        DTSTART:19901028T030000\r\n\
        RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU\r\n\
        TZOFFSETFROM:+0300\r\n\
        TZOFFSETTO:+0200\r\n\
        TZNAME:OBST\r\n\
        END:STANDARD\r\n\
        END:VTIMEZONE\r\n";

    #[test]
    fn test_declared_vtimezone() {
        let text = calendar(&format!(
            "{OBSERVATORY}BEGIN:VEVENT\r\n\
             DTSTART;TZID=Observatory Time:20240105T090000\r\n\
             END:VEVENT\r\n"
        ));
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.start.zone, "OBST");
        assert_eq!(extracted.start.time.offset().local_minus_utc(), 7200);
        assert_eq!(extracted.local_start.time.hour(), 7);

        let text = calendar(&format!(
            "{OBSERVATORY}BEGIN:VEVENT\r\n\
             DTSTART;TZID=Observatory Time:20240705T090000\r\n\
             END:VEVENT\r\n"
        ));
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.start.zone, "OBDT");
        assert_eq!(extracted.start.time.offset().local_minus_utc(), 10800);
        assert_eq!(extracted.local_start.time.hour(), 6);
    }

    #[test]
    fn test_windows_zone_name_in_summer() {
        let text = calendar(
            "BEGIN:VTIMEZONE\r\n\
             TZID:Pacific Standard Time\r\n\
             BEGIN:STANDARD\r\n\
             DTSTART:16010101T020000\r\n\
             TZOFFSETFROM:-0700\r\n\
             TZOFFSETTO:-0800\r\n\
             RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=1SU;BYMONTH=11\r\n\
             END:STANDARD\r\n\
             BEGIN:DAYLIGHT\r\n\
             DTSTART:16010101T020000\r\n\
             TZOFFSETFROM:-0800\r\n\
             TZOFFSETTO:-0700\r\n\
             RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=2SU;BYMONTH=3\r\n\
             END:DAYLIGHT\r\n\
             END:VTIMEZONE\r\n\
             BEGIN:VEVENT\r\n\
             DTSTART;TZID=Pacific Standard Time:20240710T090000\r\n\
             DTEND;TZID=Pacific Standard Time:20240710T100000\r\n\
             END:VEVENT\r\n",
        );
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.start.time.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(extracted.local_start.time.hour(), 16);
        assert_eq!(extracted.local_end.time.hour(), 17);
    }

    #[test]
    fn test_same_zone_with_numeric_label() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap();
        let named = ZonedTime::from_datetime(&instant);
        let numeric = ZonedTime::from_datetime(&instant.fixed_offset());
        assert_eq!(numeric.zone, "+00:00");
        assert!(named.same_zone(&numeric));
        assert!(numeric.same_zone(&named));

        let denver = named.in_zone(&chrono_tz::America::Denver);
        let minus_seven = named.in_zone(&FixedOffset::west_opt(7 * 3600).unwrap());
        assert!(denver.same_zone(&minus_seven));
        assert!(!denver.same_zone(&named));
        assert!(!minus_seven.same_zone(&numeric));
    }

    #[test]
    fn test_unknown_zone() {
        let text = event("DTSTART;TZID=Nowhere/Special:20240105T090000\r\n");
        assert_eq!(
            extract_with_zone(text.as_bytes(), &Utc).unwrap_err(),
            AlmanacError::UnknownTimeZone("Nowhere/Special".into())
        );
    }

    #[test]
    fn test_last_event_wins() {
        let text = calendar(
            "BEGIN:VEVENT\r\nSUMMARY:First\r\nDTSTART:20240105T090000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nSUMMARY:Second\r\nDTSTART:20240106T090000Z\r\nEND:VEVENT\r\n",
        );
        let extracted = extract_with_zone(text.as_bytes(), &Utc).unwrap();
        assert_eq!(extracted.summary, "Second");
    }

    #[test]
    fn test_malformed_documents() {
        let no_event = calendar("");
        assert!(matches!(
            extract_with_zone(no_event.as_bytes(), &Utc),
            Err(AlmanacError::MalformedCalendar(_))
        ));

        let no_start = event("SUMMARY:Nothing\r\n");
        assert!(matches!(
            extract_with_zone(no_start.as_bytes(), &Utc),
            Err(AlmanacError::MalformedCalendar(_))
        ));

        let bad_date = event("DTSTART:2024-01-05\r\n");
        assert!(matches!(
            extract_with_zone(bad_date.as_bytes(), &Utc),
            Err(AlmanacError::MalformedCalendar(_))
        ));

        assert!(matches!(
            extract_with_zone(&[0xff, 0xfe, 0x00], &Utc),
            Err(AlmanacError::MalformedCalendar(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let res = extract_file(Utf8Path::new("/definitely/not/here.ics"));
        assert_eq!(
            res.unwrap_err(),
            AlmanacError::FileAccess {
                path: "/definitely/not/here.ics".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
        );
    }

    #[test]
    fn test_zoned_time_display() {
        let time = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 5, 16, 0, 0)
            .unwrap();
        let zoned = ZonedTime::from_datetime(&time.with_timezone(&Utc));
        assert_eq!(zoned.to_string(), "Fri, 05 Jan 2024 16:00 UTC");
    }
}
