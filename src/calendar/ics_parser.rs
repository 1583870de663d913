//! Minimal iCalendar (RFC 5545) reader.
//!
//! Only what single-event extraction needs:
//!
//! * unfolding of continuation lines,
//! * content lines `NAME *(;PARAM=VALUE[,VALUE]) : VALUE`,
//! * the `BEGIN`/`END` component tree,
//! * TEXT unescaping, UTC offsets and durations.
//!
//! Recurrence rules, attachments and every other value type are left as raw text.
use chrono::{FixedOffset, TimeDelta};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, rest},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser,
};

use crate::almanac_errors::AlmanacError;

/// One unfolded content line.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentLine {
    /// Property name, upper-cased.
    pub name: String,
    /// Parameters in order of appearance, names upper-cased, quotes removed.
    pub params: Vec<(String, Vec<String>)>,
    /// Raw value, still escaped.
    pub value: String,
}

impl ContentLine {
    /// First value of the parameter `name` (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// A `BEGIN:…`/`END:…` block with its properties and nested components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    pub name: String,
    pub properties: Vec<ContentLine>,
    pub components: Vec<Component>,
}

impl Component {
    fn new(name: &str) -> Self {
        Component {
            name: name.to_ascii_uppercase(),
            ..Default::default()
        }
    }

    /// First property called `name` (case-insensitive).
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties
            .iter()
            .find(|line| line.name.eq_ignore_ascii_case(name))
    }

    /// Unescaped TEXT value of the property `name`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.property(name).map(|line| unescape_text(&line.value))
    }

    /// Pre-order traversal: the component itself, then its descendants in document order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Iterator returned by [`Component::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Component>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        let component = self.stack.pop()?;
        self.stack.extend(component.components.iter().rev());
        Some(component)
    }
}

/// Join folded lines: a line starting with a space or a tab continues the previous one.
pub fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for raw in text.lines() {
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(continuation), Some(previous)) => previous.push_str(continuation),
            _ => lines.push(raw.to_string()),
        }
    }

    lines.retain(|line| !line.trim().is_empty());
    lines
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_safe_char(c: char) -> bool {
    !matches!(c, ';' | ':' | ',' | '"') && !c.is_control()
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

fn parse_param_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        take_while(is_safe_char),
    ))
    .parse(input)
}

fn parse_param(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    preceded(
        char(';'),
        separated_pair(
            parse_name,
            char('='),
            separated_list1(char(','), parse_param_value),
        ),
    )
    .parse(input)
}

fn parse_content_line(input: &str) -> IResult<&str, ContentLine> {
    map(
        (parse_name, many0(parse_param), preceded(char(':'), rest)),
        |(name, params, value): (&str, Vec<(&str, Vec<&str>)>, &str)| ContentLine {
            name: name.to_ascii_uppercase(),
            params: params
                .into_iter()
                .map(|(key, values)| {
                    (
                        key.to_ascii_uppercase(),
                        values.into_iter().map(str::to_string).collect(),
                    )
                })
                .collect(),
            value: value.to_string(),
        },
    )
    .parse(input)
}

/// Parse one unfolded content line.
pub fn content_line(line: &str) -> Result<ContentLine, AlmanacError> {
    parse_content_line(line)
        .map(|(_, parsed)| parsed)
        .map_err(|_| AlmanacError::MalformedCalendar(format!("invalid content line '{line}'")))
}

/// Build the component tree of an iCalendar document.
///
/// Return
/// ----------
/// * The top-level `VCALENDAR` component, or [`AlmanacError::MalformedCalendar`] for invalid
///   content lines, unbalanced `BEGIN`/`END`, properties outside any component, or a
///   document without calendar.
pub fn parse_calendar(text: &str) -> Result<Component, AlmanacError> {
    let mut stack: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;

    for line in unfold(text) {
        let line = content_line(&line)?;
        let name = line.name.clone();

        match name.as_str() {
            "BEGIN" => {
                if root.is_some() {
                    return Err(AlmanacError::MalformedCalendar(
                        "content after the end of the calendar".into(),
                    ));
                }
                stack.push(Component::new(line.value.trim()));
            }
            "END" => {
                let component = stack.pop().ok_or_else(|| {
                    AlmanacError::MalformedCalendar(format!("END:{} without BEGIN", line.value))
                })?;
                if !component.name.eq_ignore_ascii_case(line.value.trim()) {
                    return Err(AlmanacError::MalformedCalendar(format!(
                        "END:{} closes BEGIN:{}",
                        line.value, component.name
                    )));
                }
                match stack.last_mut() {
                    Some(parent) => parent.components.push(component),
                    None => root = Some(component),
                }
            }
            _ => match stack.last_mut() {
                Some(current) => current.properties.push(line),
                None => {
                    return Err(AlmanacError::MalformedCalendar(format!(
                        "property {} outside of any component",
                        line.name
                    )))
                }
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(AlmanacError::MalformedCalendar(format!(
            "BEGIN:{} is never closed",
            open.name
        )));
    }

    match root {
        Some(calendar) if calendar.name == "VCALENDAR" => Ok(calendar),
        Some(other) => Err(AlmanacError::MalformedCalendar(format!(
            "top-level component is {}, expected VCALENDAR",
            other.name
        ))),
        None => Err(AlmanacError::MalformedCalendar(
            "no VCALENDAR component".into(),
        )),
    }
}

/// Decode the escapes of a TEXT value (`\n`, `\N`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn two_digits(input: &str) -> IResult<&str, i32> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        |digits: &str| digits.parse::<i32>(),
    )
    .parse(input)
}

fn parse_utc_offset(input: &str) -> IResult<&str, i32> {
    map(
        (one_of("+-"), two_digits, two_digits, opt(two_digits)),
        |(sign, hours, minutes, seconds)| {
            let total = hours * 3600 + minutes * 60 + seconds.unwrap_or(0);
            if sign == '-' {
                -total
            } else {
                total
            }
        },
    )
    .parse(input)
}

/// Parse a UTC-OFFSET value such as `-0700` or `+053000`.
pub fn utc_offset(value: &str) -> Result<FixedOffset, AlmanacError> {
    all_consuming(parse_utc_offset)
        .parse(value.trim())
        .ok()
        .and_then(|(_, seconds)| FixedOffset::east_opt(seconds))
        .ok_or_else(|| AlmanacError::MalformedCalendar(format!("invalid UTC offset '{value}'")))
}

fn duration_part<'a>(
    units: &'static str,
) -> impl Parser<&'a str, Output = (i64, char), Error = nom::error::Error<&'a str>> {
    (map_res(digit1, str::parse::<i64>), one_of(units))
}

fn unit_seconds(unit: char) -> i64 {
    match unit {
        'W' => 7 * 86_400,
        'D' => 86_400,
        'H' => 3_600,
        'M' => 60,
        _ => 1,
    }
}

fn parse_duration(input: &str) -> IResult<&str, Option<TimeDelta>> {
    map(
        (
            opt(one_of("+-")),
            tag("P"),
            many0(duration_part("WD")),
            opt(preceded(char('T'), many1(duration_part("HMS")))),
        ),
        |(sign, _, date_part, time_part)| {
            if date_part.is_empty() && time_part.is_none() {
                return None;
            }
            let seconds = date_part
                .into_iter()
                .chain(time_part.unwrap_or_default())
                .try_fold(0i64, |acc, (count, unit)| {
                    count
                        .checked_mul(unit_seconds(unit))
                        .and_then(|s| acc.checked_add(s))
                })?;
            let seconds = if sign == Some('-') { -seconds } else { seconds };
            TimeDelta::try_seconds(seconds)
        },
    )
    .parse(input)
}

/// Parse a DURATION value (`P1W`, `PT1H30M`, `-P2DT12H`, …).
pub fn duration(value: &str) -> Result<TimeDelta, AlmanacError> {
    all_consuming(parse_duration)
        .parse(value.trim())
        .ok()
        .and_then(|(_, delta)| delta)
        .ok_or_else(|| AlmanacError::MalformedCalendar(format!("invalid duration '{value}'")))
}
