//! # Reader for the MPC comet element file (`CometEls.txt`)
//!
//! The Minor Planet Center publishes the orbital elements of all comets in a fixed-column text
//! file, one comet per line. Angles are J2000 ecliptic degrees, the perihelion time is in TT.
//!
//! Field layout (0-based, end-exclusive)
//! -----------------
//! * `0..4` – periodic comet number
//! * `4..5` – orbit type (`C`, `P`, `D`, `X`, `I`, `A`)
//! * `5..12` – packed provisional designation
//! * `14..18`, `19..21`, `22..29` – perihelion year, month, fractional day (TT)
//! * `30..39` – perihelion distance `q` (AU)
//! * `41..49` – eccentricity
//! * `51..59` – argument of perihelion (deg)
//! * `61..69` – longitude of the ascending node (deg)
//! * `71..79` – inclination (deg)
//! * `81..85`, `85..87`, `87..89` – epoch of osculation (optional)
//! * `91..95` – absolute magnitude `G` (optional)
//! * `96..100` – slope parameter `K` (optional)
//! * `102..158` – designation and name
//! * `159..` – reference
use std::{ops::Range, str::FromStr};

use thiserror::Error;

use crate::{
    almanac_errors::AlmanacError, catalog::CatalogRecord, constants::RADEG,
    orbit_type::cometary_element::CometaryElements, time::frac_date_tt_to_epoch,
};

/// Line-level parsing errors for `CometEls.txt`.
#[derive(Error, Debug, PartialEq)]
pub enum ParseCometError {
    #[error("The line is too short ({0} characters)")]
    TooShortLine(usize),
    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
    #[error("Invalid perihelion date: {0}")]
    InvalidPerihelionDate(String),
    #[error("The line has no designation")]
    MissingDesignation,
}

/// The designation field starts at column 102.
const MIN_LINE_LENGTH: usize = 103;

/// Trimmed content of a column range, empty when the line is shorter.
fn column(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line.get(start..end).unwrap_or("").trim()
}

fn parse_field<T: FromStr>(
    line: &str,
    range: Range<usize>,
    field: &'static str,
) -> Result<T, ParseCometError> {
    let raw = column(line, range);
    raw.parse().map_err(|_| ParseCometError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

fn parse_optional_field<T: FromStr>(
    line: &str,
    range: Range<usize>,
    field: &'static str,
) -> Result<Option<T>, ParseCometError> {
    if column(line, range.clone()).is_empty() {
        Ok(None)
    } else {
        parse_field(line, range, field).map(Some)
    }
}

/// Parse one line of `CometEls.txt` into a [`CatalogRecord`].
///
/// Return
/// ----------
/// * The record, or the first [`ParseCometError`] met while reading the fixed columns.
pub fn parse_comet_line(line: &str) -> Result<CatalogRecord, ParseCometError> {
    let length = line.trim_end().len();
    if length < MIN_LINE_LENGTH {
        return Err(ParseCometError::TooShortLine(length));
    }

    let designation = column(line, 102..158);
    if designation.is_empty() {
        return Err(ParseCometError::MissingDesignation);
    }

    let year: i32 = parse_field(line, 14..18, "perihelion year")?;
    let month: u8 = parse_field(line, 19..21, "perihelion month")?;
    let day: f64 = parse_field(line, 22..29, "perihelion day")?;
    let perihelion_time = frac_date_tt_to_epoch(year, month, day).ok_or_else(|| {
        ParseCometError::InvalidPerihelionDate(column(line, 14..29).to_string())
    })?;

    let elements = CometaryElements {
        perihelion_time,
        perihelion_distance: parse_field(line, 30..39, "perihelion distance")?,
        eccentricity: parse_field(line, 41..49, "eccentricity")?,
        periapsis_argument: parse_field::<f64>(line, 51..59, "argument of perihelion")? * RADEG,
        ascending_node_longitude: parse_field::<f64>(line, 61..69, "ascending node")? * RADEG,
        inclination: parse_field::<f64>(line, 71..79, "inclination")? * RADEG,
    };

    let epoch = if column(line, 81..89).is_empty() {
        None
    } else {
        let epoch_year: i32 = parse_field(line, 81..85, "epoch year")?;
        let epoch_month: u8 = parse_field(line, 85..87, "epoch month")?;
        let epoch_day: u8 = parse_field(line, 87..89, "epoch day")?;
        Some(
            frac_date_tt_to_epoch(epoch_year, epoch_month, f64::from(epoch_day)).ok_or_else(
                || ParseCometError::InvalidField {
                    field: "epoch",
                    value: column(line, 81..89).to_string(),
                },
            )?,
        )
    };

    Ok(CatalogRecord {
        designation: designation.to_string(),
        number: parse_optional_field(line, 0..4, "comet number")?,
        orbit_type: column(line, 4..5).chars().next(),
        packed_designation: column(line, 5..12).to_string(),
        elements,
        epoch,
        absolute_magnitude: parse_optional_field(line, 91..95, "absolute magnitude")?,
        slope_parameter: parse_optional_field(line, 96..100, "slope parameter")?,
        reference: column(line, 159..line.len()).to_string(),
    })
}

/// Parse the whole content of a `CometEls.txt` file, skipping blank lines.
///
/// Return
/// ----------
/// * One item per non-blank line in file order: the record, or [`AlmanacError::CatalogParse`]
///   carrying the 1-based line number of the malformed line.
pub fn parse_comet_els(
    text: &str,
) -> impl Iterator<Item = Result<CatalogRecord, AlmanacError>> + '_ {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse_comet_line(line).map_err(|source| AlmanacError::CatalogParse {
                line: idx + 1,
                source,
            })
        })
}

#[cfg(test)]
mod mpc_comet_reader_test {
    use super::*;
    use approx::assert_relative_eq;

    const NEOWISE: &str = "    CK20F030  2020 07  3.6773  0.294707  0.999181   37.2790   61.0107  128.9375  20200720  12.5  3.2  C/2020 F3 (NEOWISE)                                      MPC137305";
    const HALLEY: &str = "0001P         1986 02  9.4589  0.574522  0.967923  111.8657   59.3965  162.1845  20241215   4.0  6.0  1P/Halley                                                MPC 75630";

    #[test]
    fn test_parse_non_periodic() {
        let record = parse_comet_line(NEOWISE).unwrap();
        assert_eq!(record.designation, "C/2020 F3 (NEOWISE)");
        assert_eq!(record.number, None);
        assert_eq!(record.orbit_type, Some('C'));
        assert_eq!(record.packed_designation, "K20F030");
        assert_eq!(record.reference, "MPC137305");
        assert_eq!(record.absolute_magnitude, Some(12.5));
        assert_eq!(record.slope_parameter, Some(3.2));

        let el = &record.elements;
        assert_relative_eq!(el.perihelion_time.to_mjd_tt_days(), 59033.6773, epsilon = 1e-8);
        assert_relative_eq!(el.perihelion_distance, 0.294707);
        assert_relative_eq!(el.eccentricity, 0.999181);
        assert_relative_eq!(el.periapsis_argument, 37.2790 * RADEG);
        assert_relative_eq!(el.ascending_node_longitude, 61.0107 * RADEG);
        assert_relative_eq!(el.inclination, 128.9375 * RADEG);

        let epoch = record.epoch.unwrap();
        assert_relative_eq!(epoch.to_mjd_tt_days(), 59050.0, epsilon = 1e-8);
    }

    #[test]
    fn test_parse_periodic() {
        let record = parse_comet_line(HALLEY).unwrap();
        assert_eq!(record.designation, "1P/Halley");
        assert_eq!(record.number, Some(1));
        assert_eq!(record.orbit_type, Some('P'));
        assert_eq!(record.packed_designation, "");
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let mut line = NEOWISE.to_string();
        line.replace_range(81..100, &" ".repeat(19));
        let record = parse_comet_line(&line).unwrap();
        assert_eq!(record.epoch, None);
        assert_eq!(record.absolute_magnitude, None);
        assert_eq!(record.slope_parameter, None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_comet_line("    CK20F030  2020 07  3.6773"),
            Err(ParseCometError::TooShortLine(29))
        );

        let mut line = NEOWISE.to_string();
        line.replace_range(41..49, "0.99x181");
        assert_eq!(
            parse_comet_line(&line),
            Err(ParseCometError::InvalidField {
                field: "eccentricity",
                value: "0.99x181".into()
            })
        );

        let mut line = NEOWISE.to_string();
        line.replace_range(19..21, "13");
        assert!(matches!(
            parse_comet_line(&line),
            Err(ParseCometError::InvalidPerihelionDate(_))
        ));
    }

    #[test]
    fn test_parse_file_reports_line_number() {
        let text = format!("{HALLEY}\n\n{NEOWISE}\ngarbage\n");
        let parsed: Vec<_> = parse_comet_els(&text).collect();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].is_ok());
        assert!(parsed[1].is_ok());
        assert_eq!(
            parsed[2],
            Err(AlmanacError::CatalogParse {
                line: 4,
                source: ParseCometError::TooShortLine(7)
            })
        );
    }
}
