use almanac::{
    almanac_errors::AlmanacError,
    calendar::{extract_file_with_zone, extract_with_zone, render_reminder, render_text},
};
use chrono::{TimeDelta, Timelike, Utc};
use chrono_tz::America::{Denver, Los_Angeles};

mod common;

#[test]
fn test_same_zone_has_no_source_line() {
    let event = extract_file_with_zone(&common::ics("standup_utc.ics"), &Utc).unwrap();
    assert_eq!(
        render_text(&event),
        "START: Fri, 05 Jan 2024 16:00 UTC\n\
         \x20 END: Fri, 05 Jan 2024 16:15 UTC\n\
         SUMMARY Standup\n\
         LOCATION Room 4\n\
         DESCRIPTION Daily sync of the observing team\n"
    );

    let event = extract_file_with_zone(&common::ics("standup_denver.ics"), &Denver).unwrap();
    let text = render_text(&event);
    assert!(text.starts_with("START: Fri, 05 Jan 2024 09:00 MST\n  END: "));
    assert!(!text.contains('('));
}

#[test]
fn test_other_zone_adds_source_line() {
    let event = extract_file_with_zone(&common::ics("standup_denver.ics"), &Utc).unwrap();
    assert_eq!(event.summary, "Standup");
    assert_eq!(event.location, "Room 4, second floor");

    let text = render_text(&event);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "START: Fri, 05 Jan 2024 16:00 UTC");
    assert_eq!(lines[1], "      (Fri, 05 Jan 2024 09:00 MST)");
    assert_eq!(lines[2], "  END: Fri, 05 Jan 2024 16:15 UTC");
    assert_eq!(lines[3], "      (Fri, 05 Jan 2024 09:15 MST)");
    assert_eq!(lines[4], "SUMMARY Standup");
}

#[test]
fn test_windows_zone_follows_daylight_saving() {
    let event = extract_file_with_zone(&common::ics("outlook_pacific.ics"), &Utc).unwrap();
    assert_eq!(event.summary, "Mirror recoating review");
    assert_eq!(event.location, "Dome B");
    assert_eq!(event.start.time.offset().local_minus_utc(), -7 * 3600);

    let lines: Vec<String> = render_text(&event).lines().map(String::from).collect();
    assert_eq!(lines[0], "START: Wed, 10 Jul 2024 16:00 UTC");
    assert_eq!(lines[1], "      (Wed, 10 Jul 2024 09:00 Pacific Standard Time)");
    assert_eq!(lines[2], "  END: Wed, 10 Jul 2024 17:00 UTC");

    let path = common::ics("outlook_pacific.ics");
    let event = extract_file_with_zone(&path, &Los_Angeles).unwrap();
    assert_eq!(event.local_start.to_string(), "Wed, 10 Jul 2024 09:00 PDT");
    assert_eq!(event.local_start.time, event.start.time);
}

#[test]
fn test_reminder_collapses_blank_lines() {
    let event = extract_file_with_zone(&common::ics("standup_denver.ics"), &Denver).unwrap();
    assert_eq!(event.description, "line1\n\nline2\nline3");
    assert_eq!(
        render_reminder(&event),
        "REM 05 Jan 2024 +1 MSG Standup ||| LOCATION Room 4, second floor ||| DESCRIPTION: ||| \
         line1 ||| line2 ||| line3"
    );
}

#[test]
fn test_extraction_is_idempotent() {
    let bytes = std::fs::read(common::ics("standup_denver.ics")).unwrap();
    let first = extract_with_zone(&bytes, &Denver).unwrap();
    let second = extract_with_zone(&bytes, &Denver).unwrap();
    assert_eq!(first, second);
    assert_eq!(render_text(&first), render_text(&second));
}

#[test]
fn test_last_event_of_the_file() {
    let event = extract_file_with_zone(&common::ics("two_events.ics"), &Utc).unwrap();
    assert_eq!(event.summary, "Cleanup");
    assert_eq!(event.description, "");
    assert_eq!(event.location, "");
    assert_eq!(event.local_start.time.hour(), 0);
    assert_eq!(event.end.time - event.start.time, TimeDelta::days(1));
}

#[test]
fn test_folded_description_is_joined() {
    let text = std::fs::read_to_string(common::ics("two_events.ics")).unwrap();
    let first_event = text.split("BEGIN:VEVENT\r\nSUMMARY:Cleanup").next().unwrap();
    let single = format!("{first_event}END:VCALENDAR\r\n");

    let event = extract_with_zone(single.as_bytes(), &Utc).unwrap();
    assert_eq!(event.summary, "Star party");
    assert_eq!(
        event.description,
        "Perseids watch. Bring a chair, a red light and warm clothes. The sky is expected to be \
         clear after midnight."
    );
    assert_eq!(event.end.time - event.start.time, TimeDelta::hours(4));
}

#[test]
fn test_file_errors() {
    assert!(matches!(
        extract_file_with_zone(&common::ics("malformed.ics"), &Utc),
        Err(AlmanacError::MalformedCalendar(_))
    ));
    assert!(matches!(
        extract_file_with_zone(&common::ics("missing.ics"), &Utc),
        Err(AlmanacError::FileAccess { .. })
    ));
    assert!(matches!(
        extract_file_with_zone(&common::ics("CometEls.txt"), &Utc),
        Err(AlmanacError::MalformedCalendar(_))
    ));
}
