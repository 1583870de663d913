use almanac::{
    almanac::Almanac,
    catalog::{Catalog, LookupOutcome},
    observers::ObserverLocation,
    position::compute_position,
    time::utc_to_epoch,
};
use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};

mod common;

#[test]
fn test_unique_partial_name() {
    let catalog = Catalog::from_records([common::renamed(
        "C/2020 F3 (NEOWISE)",
        "2020 F3 (NEOWISE)",
    )]);

    let record = catalog.lookup("2020 F3").unwrap();
    assert_eq!(record.designation, "2020 F3 (NEOWISE)");
}

#[test]
fn test_ambiguous_name_lists_matches() {
    let catalog = Catalog::from_records([
        common::renamed("C/2020 F3 (NEOWISE)", "C/2020 F3"),
        common::renamed("C/2020 F8 (SWAN)", "C/2020 F8"),
    ]);

    let mut listing = Vec::new();
    let found = catalog.lookup_with_writer("2020 F", &mut listing).unwrap();

    assert_eq!(found, None);
    assert_eq!(
        String::from_utf8(listing).unwrap(),
        "2 comets in catalog\nC/2020 F3\nC/2020 F8\n"
    );
}

#[test]
fn test_lookup_matches_substring_count() {
    let catalog = common::fixture_catalog();

    for pattern in ["Halley", "P/", "C/20", "2020", "NEOWISE", "neowise", "X", "", "/"] {
        let matching = catalog
            .iter()
            .filter(|r| r.designation.contains(pattern))
            .count();

        let mut listing = Vec::new();
        let found = catalog.lookup_with_writer(pattern, &mut listing).unwrap();

        assert_eq!(found.is_some(), matching == 1, "pattern {pattern:?}");
        if matching > 1 {
            assert_eq!(
                String::from_utf8(listing).unwrap().lines().count(),
                matching + 1,
                "pattern {pattern:?}"
            );
        } else {
            assert!(listing.is_empty(), "pattern {pattern:?}");
        }

        match catalog.find(pattern) {
            LookupOutcome::Found(_) => assert_eq!(matching, 1),
            LookupOutcome::NotFound => assert_eq!(matching, 0),
            LookupOutcome::Ambiguous(records) => assert_eq!(records.len(), matching),
        }
    }
}

#[test]
fn test_almanac_from_file_source() {
    let almanac = Almanac::new(&common::fixture_source()).unwrap();

    let halley = almanac.lookup("Halley").unwrap().unwrap();
    assert_eq!(halley.designation, "1P/Halley");
    assert_eq!(halley.number, Some(1));

    assert_eq!(almanac.lookup("Hale-Bopp").unwrap(), None);
    assert_eq!(almanac.lookup("P/").unwrap(), None);
}

#[test]
fn test_neowise_at_closest_approach() {
    let almanac = Almanac::new(&common::fixture_source()).unwrap();
    let neowise = almanac.lookup("NEOWISE").unwrap().unwrap();
    let epoch = utc_to_epoch(&Utc.with_ymd_and_hms(2020, 7, 23, 0, 0, 0).unwrap());

    let position = compute_position(almanac.ephemeris(), neowise, &epoch, None).unwrap();
    assert_relative_eq!(position.distance, 0.6918, epsilon = 1e-3);
    assert_relative_eq!(
        position.right_ascension.to_degrees() / 15.0,
        10.451,
        epsilon = 0.02
    );
    assert_relative_eq!(position.declination.to_degrees(), 44.75, epsilon = 0.1);
    assert!(position.horizontal.is_none());

    let los_alamos = ObserverLocation::new(35.8876, -106.3069, 2231.0).unwrap();
    let position =
        compute_position(almanac.ephemeris(), neowise, &epoch, Some(&los_alamos)).unwrap();
    let horizontal = position.horizontal.unwrap();
    assert!((-90.0..=90.0).contains(&horizontal.altitude));
    assert!((0.0..360.0).contains(&horizontal.azimuth));
    assert_relative_eq!(horizontal.distance, position.distance, epsilon = 1e-4);

    let printed = position.to_string();
    assert!(printed.starts_with("RA 10h "));
    assert!(printed.contains("\nAltitude "));
}
