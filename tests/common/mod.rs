#![allow(dead_code)]

use std::fs;

use almanac::catalog::{Catalog, CatalogRecord};
use camino::Utf8PathBuf;

pub const COMET_ELS: &str = "tests/data/CometEls.txt";

pub fn fixture_catalog() -> Catalog {
    let text = fs::read_to_string(COMET_ELS).unwrap();
    Catalog::from_mpc_text(&text).unwrap()
}

pub fn fixture_source() -> String {
    format!("file:{COMET_ELS}")
}

/// A fixture record under another designation.
pub fn renamed(designation: &str, new_designation: &str) -> CatalogRecord {
    let catalog = fixture_catalog();
    let mut record = catalog.get(designation).unwrap().clone();
    record.designation = new_designation.to_string();
    record
}

pub fn ics(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("tests/data/{name}"))
}
