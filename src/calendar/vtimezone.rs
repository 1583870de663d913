//! Time zones declared inline by a `VTIMEZONE` component.
//!
//! Calendars exported by Outlook/Exchange name their zones `Pacific Standard Time`,
//! `W. Europe Standard Time`, … which no IANA database knows. The zone is then only defined
//! by its observances:
//!
//! ```text
//! BEGIN:STANDARD                         BEGIN:DAYLIGHT
//! DTSTART:16011104T020000                DTSTART:16010311T020000
//! RRULE:FREQ=YEARLY;BYDAY=1SU;BYMONTH=11 RRULE:FREQ=YEARLY;BYDAY=2SU;BYMONTH=3
//! TZOFFSETFROM:-0700                     TZOFFSETFROM:-0800
//! TZOFFSETTO:-0800                       TZOFFSETTO:-0700
//! END:STANDARD                           END:DAYLIGHT
//! ```
//!
//! Every observance starts at its local `DTSTART` and repeats at the `RRULE` occurrences and
//! `RDATE` values. The observance in effect at a wall-clock time is the one whose latest onset
//! is not after it. Only yearly rules are evaluated, which covers every daylight-saving
//! scheme in use; `COUNT` is counted in years.
use chrono::{Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use nom::{
    bytes::complete::{take_while1, take_while_m_n},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map_opt, map_res, opt},
    multi::separated_list1,
    sequence::separated_pair,
    IResult, Parser,
};

use super::{
    ics_parser::{self, Component},
    DATE_FORMAT, DATE_TIME_FORMAT,
};
use crate::almanac_errors::AlmanacError;

/// `FREQ=YEARLY` recurrence of an observance onset.
#[derive(Debug, Clone, Default, PartialEq)]
struct YearlyRule {
    /// `BYMONTH`, empty for the month of `DTSTART`.
    months: Vec<u32>,
    /// `BYDAY` as `(ordinal, weekday)`, `-1SU` being the last Sunday of the month.
    weekday: Option<(i32, Weekday)>,
    /// `BYMONTHDAY`, negative values count from the end of the month.
    month_day: Option<i32>,
    until: Option<NaiveDateTime>,
    count: Option<u32>,
}

/// One `STANDARD` or `DAYLIGHT` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Observance {
    /// Offset from UTC while the observance is in effect.
    pub offset: FixedOffset,
    /// `TZNAME`, or the `TZID` of the zone when absent.
    pub name: String,
    start: NaiveDateTime,
    rule: Option<YearlyRule>,
    extra_onsets: Vec<NaiveDateTime>,
}

/// A `VTIMEZONE` with at least one observance.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredZone {
    pub tzid: String,
    observances: Vec<Observance>,
}

fn invalid(what: &str, value: &str) -> AlmanacError {
    AlmanacError::MalformedCalendar(format!("invalid {what} '{value}'"))
}

/// Local date-time (`YYYYMMDDTHHMMSS`, a trailing `Z` ignored) or date at midnight.
fn local_datetime(value: &str) -> Result<NaiveDateTime, AlmanacError> {
    let value = value.trim();
    let text = value.strip_suffix(['Z', 'z']).unwrap_or(value);

    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, DATE_FORMAT).map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| invalid("date-time", value))
}

fn weekday(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_rule_parts(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    separated_list1(
        char(';'),
        separated_pair(
            take_while1(|c: char| c.is_ascii_alphabetic()),
            char('='),
            take_while1(|c: char| c != ';'),
        ),
    )
    .parse(input)
}

fn parse_by_day(input: &str) -> IResult<&str, (i32, Weekday)> {
    map_opt(
        (
            opt(one_of("+-")),
            opt(map_res(digit1, str::parse::<i32>)),
            take_while_m_n(2, 2, |c: char| c.is_ascii_alphabetic()),
        ),
        |(sign, ordinal, code)| {
            let ordinal = ordinal.unwrap_or(1);
            let ordinal = if sign == Some('-') { -ordinal } else { ordinal };
            Some((ordinal, weekday(code)?))
        },
    )
    .parse(input)
}

/// `n`-th `weekday` of the month, counted from the end when `n` is negative.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: i32) -> Option<NaiveDate> {
    if n > 0 {
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, u8::try_from(n).ok()?);
    }
    if n == 0 {
        return None;
    }

    let last = last_day_of_month(year, month)?;
    let back = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back + 7 * (n.unsigned_abs() - 1))))
        .filter(|date| date.month() == month)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next?.pred_opt()
}

fn month_day(year: i32, month: u32, day: i32) -> Option<NaiveDate> {
    if day > 0 {
        return NaiveDate::from_ymd_opt(year, month, u32::try_from(day).ok()?);
    }
    last_day_of_month(year, month)?
        .checked_sub_days(Days::new(u64::from(day.unsigned_abs().checked_sub(1)?)))
        .filter(|date| date.month() == month)
}

impl YearlyRule {
    /// Parse an `RRULE` value; `None` for frequencies other than `YEARLY`.
    fn parse(value: &str) -> Result<Option<YearlyRule>, AlmanacError> {
        let (_, parts) = all_consuming(parse_rule_parts)
            .parse(value.trim())
            .map_err(|_| invalid("RRULE", value))?;

        let mut rule = YearlyRule::default();
        let mut yearly = false;

        for (key, part) in parts {
            match key.to_ascii_uppercase().as_str() {
                "FREQ" => yearly = part.eq_ignore_ascii_case("YEARLY"),
                "BYMONTH" => {
                    rule.months = part
                        .split(',')
                        .map(|month| month.parse().ok().filter(|m| (1..=12).contains(m)))
                        .collect::<Option<Vec<u32>>>()
                        .ok_or_else(|| invalid("RRULE", value))?;
                }
                "BYDAY" => {
                    let first = part.split(',').next().unwrap_or_default();
                    let (_, by_day) = all_consuming(parse_by_day)
                        .parse(first)
                        .map_err(|_| invalid("RRULE", value))?;
                    rule.weekday = Some(by_day);
                }
                "BYMONTHDAY" => {
                    rule.month_day = Some(part.parse().map_err(|_| invalid("RRULE", value))?);
                }
                "UNTIL" => rule.until = Some(local_datetime(part)?),
                "COUNT" => rule.count = Some(part.parse().map_err(|_| invalid("RRULE", value))?),
                _ => {}
            }
        }

        Ok(yearly.then_some(rule))
    }

    /// Onsets falling in `year`, before the `UNTIL`/`COUNT` limits are applied.
    fn occurrences_in(&self, year: i32, start: &NaiveDateTime) -> Vec<NaiveDateTime> {
        let months = if self.months.is_empty() {
            vec![start.month()]
        } else {
            self.months.clone()
        };

        months
            .into_iter()
            .filter_map(|month| {
                let date = match (self.weekday, self.month_day) {
                    (Some((n, day)), _) => nth_weekday(year, month, day, n),
                    (None, Some(day)) => month_day(year, month, day),
                    (None, None) => NaiveDate::from_ymd_opt(year, month, start.day()),
                }?;
                Some(date.and_time(start.time()))
            })
            .collect()
    }

    fn allows(&self, onset: &NaiveDateTime, start: &NaiveDateTime) -> bool {
        onset >= start
            && self.until.map_or(true, |until| *onset <= until)
            && self
                .count
                .map_or(true, |count| i64::from(onset.year() - start.year()) < i64::from(count))
    }
}

impl Observance {
    fn from_component(component: &Component, tzid: &str) -> Result<Observance, AlmanacError> {
        let missing = |name: &str| {
            AlmanacError::MalformedCalendar(format!("{} of {tzid} without {name}", component.name))
        };

        let start = local_datetime(
            &component
                .property("DTSTART")
                .ok_or_else(|| missing("DTSTART"))?
                .value,
        )?;
        let offset = ics_parser::utc_offset(
            &component
                .property("TZOFFSETTO")
                .ok_or_else(|| missing("TZOFFSETTO"))?
                .value,
        )?;
        let rule = component
            .property("RRULE")
            .map(|line| YearlyRule::parse(&line.value))
            .transpose()?
            .flatten();
        let extra_onsets = component
            .properties
            .iter()
            .filter(|line| line.name == "RDATE")
            .flat_map(|line| line.value.split(','))
            .map(local_datetime)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Observance {
            offset,
            name: component.text("TZNAME").unwrap_or_else(|| tzid.to_string()),
            start,
            rule,
            extra_onsets,
        })
    }

    /// Latest onset of the observance at or before `local`.
    fn latest_onset(&self, local: &NaiveDateTime) -> Option<NaiveDateTime> {
        let listed = self
            .extra_onsets
            .iter()
            .chain(std::iter::once(&self.start))
            .filter(|onset| *onset <= local)
            .max()
            .copied();

        let recurring = self.rule.as_ref().and_then(|rule| {
            (local.year() - 1..=local.year())
                .flat_map(|year| rule.occurrences_in(year, &self.start))
                .filter(|onset| onset <= local && rule.allows(onset, &self.start))
                .max()
        });

        listed.max(recurring)
    }
}

impl DeclaredZone {
    /// Read a `VTIMEZONE`; `None` when it has no `TZID` or no observance.
    pub fn from_component(vtimezone: &Component) -> Result<Option<DeclaredZone>, AlmanacError> {
        let Some(tzid) = vtimezone.property("TZID") else {
            return Ok(None);
        };
        let tzid = tzid.value.trim().to_string();

        let observances = vtimezone
            .components
            .iter()
            .filter(|c| c.name == "STANDARD" || c.name == "DAYLIGHT")
            .map(|c| Observance::from_component(c, &tzid))
            .collect::<Result<Vec<_>, _>>()?;

        if observances.is_empty() {
            return Ok(None);
        }
        Ok(Some(DeclaredZone { tzid, observances }))
    }

    /// Observance in effect at the wall-clock time `local`.
    ///
    /// Before the first onset of the zone, its earliest observance is used.
    pub fn observance_at(&self, local: &NaiveDateTime) -> Option<&Observance> {
        self.observances
            .iter()
            .filter_map(|observance| Some((observance.latest_onset(local)?, observance)))
            .max_by_key(|(onset, _)| *onset)
            .map(|(_, observance)| observance)
            .or_else(|| self.observances.iter().min_by_key(|o| o.start))
    }
}
