use super::{CalendarEvent, ZonedTime};

/// Longest description printed by [`render_text`], in characters.
pub const DESCRIPTION_LIMIT: usize = 300;

/// Separator replacing line breaks in a reminder line.
pub const REMIND_SEPARATOR: &str = " ||| ";

fn time_lines(label: &str, local: &ZonedTime, source: &ZonedTime) -> Vec<String> {
    let mut lines = vec![format!("{label}: {local}")];
    if !source.same_zone(local) {
        lines.push(format!("      ({source})"));
    }
    lines
}

/// Human readable block: local start and end (with the file's own zone when it differs),
/// summary, location and a description cut after [`DESCRIPTION_LIMIT`] characters.
///
/// Every line, the last one included, ends with `\n`.
pub fn render_text(event: &CalendarEvent) -> String {
    let mut lines = time_lines("START", &event.local_start, &event.start);
    lines.extend(time_lines("  END", &event.local_end, &event.end));
    lines.push(format!("SUMMARY {}", event.summary));
    lines.push(format!("LOCATION {}", event.location));

    if event.description.chars().count() > DESCRIPTION_LIMIT {
        let cut: String = event.description.chars().take(DESCRIPTION_LIMIT).collect();
        lines.push(format!("DESCRIPTION {cut} ..."));
    } else {
        lines.push(format!("DESCRIPTION {}", event.description));
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

/// One `remind(1)` line, without trailing newline.
///
/// Blank lines of the description are dropped before the remaining line breaks become
/// [`REMIND_SEPARATOR`].
pub fn render_reminder(event: &CalendarEvent) -> String {
    let description = event
        .description
        .replace("\r\n", "\n")
        .replace("\n\n", "\n")
        .replace('\n', REMIND_SEPARATOR);

    format!(
        "REM {} +1 MSG {}{REMIND_SEPARATOR}LOCATION {}{REMIND_SEPARATOR}DESCRIPTION:{REMIND_SEPARATOR}{}",
        event.local_start.time.format("%d %b %Y"),
        event.summary,
        event.location,
        description
    )
}
