use std::collections::BTreeSet;

use almanac::{
    almanac::Almanac,
    observers::ObserverLocation,
    position::horizontal_position,
    riseset::{
        aggregator::{aggregate, DayAccumulator, DayRow},
        format_schedule, schedule, RiseSetEvent,
    },
    time::utc_to_epoch,
};
use approx::assert_relative_eq;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use hifitime::Unit;

mod common;

fn event(year: i32, month: u32, day: u32, hour: u32, minute: u32, is_rise: bool) -> RiseSetEvent {
    let instant = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap();
    RiseSetEvent {
        epoch: utc_to_epoch(&instant),
        is_rise,
    }
}

fn rows<Tz: TimeZone>(events: Vec<RiseSetEvent>, zone: Tz) -> Vec<DayRow> {
    aggregate(events, zone, |e| Ok(if e.is_rise { 60.0 } else { 300.0 }))
        .collect::<Result<_, _>>()
        .unwrap()
}

/// Events every `step_minutes`, alternating rise and set, starting with a rise.
fn regular_stream(count: usize, step_minutes: u32) -> Vec<RiseSetEvent> {
    let first = event(2021, 1, 1, 3, 17, true);
    (0..count)
        .map(|i| RiseSetEvent {
            epoch: first.epoch + (i as f64 * f64::from(step_minutes)) * Unit::Minute,
            is_rise: i % 2 == 0,
        })
        .collect()
}

#[test]
fn test_three_events_two_days() {
    let events = vec![
        event(2021, 1, 5, 22, 0, true),
        event(2021, 1, 6, 4, 0, false),
        event(2021, 1, 6, 23, 30, true),
    ];
    let rows = rows(events, Utc);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
    assert_eq!(
        rows[0].rise.as_ref().unwrap().time.format("%H:%M").to_string(),
        "22:00"
    );
    assert!(rows[0].set.is_none());

    assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2021, 1, 6).unwrap());
    assert_eq!(
        rows[1].set.as_ref().unwrap().time.format("%H:%M").to_string(),
        "04:00"
    );
    assert_eq!(
        rows[1].rise.as_ref().unwrap().time.format("%H:%M").to_string(),
        "23:30"
    );
}

#[test]
fn test_one_row_per_local_date() {
    let zones = [
        FixedOffset::east_opt(0).unwrap(),
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap(),
        FixedOffset::west_opt(8 * 3600).unwrap(),
        FixedOffset::east_opt(14 * 3600).unwrap(),
    ];

    for step in [50, 419, 720, 1500] {
        let events = regular_stream(40, step);
        for zone in zones {
            let dates: BTreeSet<NaiveDate> = events
                .iter()
                .map(|e| {
                    let utc = almanac::time::epoch_to_utc(&e.epoch).unwrap();
                    utc.with_timezone(&zone).date_naive()
                })
                .collect();

            let rows = rows(events.clone(), zone);
            assert_eq!(rows.len(), dates.len(), "step {step} zone {zone}");

            for row in &rows {
                for crossing in row.rise.iter().chain(row.set.iter()) {
                    assert_eq!(crossing.time.date_naive(), row.date);
                }
            }
            assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}

#[test]
fn test_trailing_row_flushed_once() {
    let mut accumulator = DayAccumulator::new();
    let day = NaiveDate::from_ymd_opt(2021, 1, 5).unwrap();
    let crossing = rows(vec![event(2021, 1, 5, 22, 0, true)], Utc)[0]
        .rise
        .clone()
        .unwrap();

    assert_eq!(accumulator.push(day, true, crossing), None);
    let flushed = accumulator.flush().unwrap();
    assert!(!flushed.is_blank());
    assert_eq!(accumulator.flush(), None);

    // Nothing pushed: nothing emitted
    assert_eq!(DayAccumulator::new().flush(), None);
    assert!(rows(Vec::new(), Utc).is_empty());
}

#[test]
fn test_neowise_schedule_from_los_alamos() {
    let almanac = Almanac::new(&common::fixture_source()).unwrap();
    let neowise = almanac.lookup("NEOWISE").unwrap().unwrap();
    let los_alamos = ObserverLocation::new(35.8876, -106.3069, 2231.0).unwrap();
    let start = utc_to_epoch(&Utc.with_ymd_and_hms(2020, 7, 23, 0, 0, 0).unwrap());

    let rows = schedule(almanac.ephemeris(), neowise, &los_alamos, &start, 3, &Utc).unwrap();
    assert!((3..=4).contains(&rows.len()), "{rows:?}");
    assert!(rows.windows(2).all(|w| w[0].date < w[1].date));

    for row in &rows {
        // Dec about +45° at latitude 36°N: rises in the north-east, sets in the north-west
        if let Some(rise) = &row.rise {
            assert!(rise.azimuth > 0.0 && rise.azimuth < 90.0, "{row:?}");
            let epoch = utc_to_epoch(&rise.time.with_timezone(&Utc));
            let at_rise =
                horizontal_position(almanac.ephemeris(), &neowise.elements, &epoch, &los_alamos)
                    .unwrap();
            assert_relative_eq!(at_rise.altitude, -34.0 / 60.0, epsilon = 1e-3);
        }
        if let Some(set) = &row.set {
            assert!(set.azimuth > 270.0 && set.azimuth < 360.0, "{row:?}");
        }
    }

    let table = format_schedule(&rows);
    assert_eq!(table.lines().count(), rows.len() + 1);
    assert!(table.starts_with("Date        Rise     Azimuth  Set      Azimuth\n"));
}
