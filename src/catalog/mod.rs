//! # Comet catalog and name lookup
//!
//! The catalog is an ordered table of [`CatalogRecord`]s keyed by their designation
//! (`"C/2020 F3 (NEOWISE)"`, `"1P/Halley"`, …). It is loaded once per run and never mutated.
//!
//! Users rarely type a full designation, so [`Catalog::lookup`] resolves a **case-sensitive
//! substring** of it:
//!
//! | matches | result                                                               |
//! |---------|----------------------------------------------------------------------|
//! | 1       | the record                                                           |
//! | 0       | `None`, nothing printed                                              |
//! | ≥ 2     | `None`, the catalog size and every match are printed in catalog order |
//!
//! ## See also
//! ------------
//! * [`mpc_comet_reader`] – Parser of the MPC `CometEls.txt` fixed-column format.
//! * [`download`] – Where the catalog text comes from (MPC download with a local cache, or file).
use std::{
    collections::HashMap,
    io::{self, Write},
};

use hifitime::Epoch;
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    almanac_errors::AlmanacError, constants::Designation,
    orbit_type::cometary_element::CometaryElements,
};

/// Catalog sources and local cache.
pub mod download;
/// Fixed-column reader of the MPC comet element file.
pub mod mpc_comet_reader;

/// One comet of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    /// Unique catalog key, e.g. `"C/2020 F3 (NEOWISE)"`.
    pub designation: Designation,

    /// Periodic comet number, if numbered.
    pub number: Option<u32>,

    /// Orbit type letter (`C`, `P`, `D`, …).
    pub orbit_type: Option<char>,

    /// Packed provisional designation (`K20F030`), empty for numbered comets.
    pub packed_designation: String,

    /// Perihelion elements consumed by the ephemeris.
    pub elements: CometaryElements,

    /// Epoch of osculation of perturbed solutions.
    pub epoch: Option<Epoch>,

    /// Total absolute magnitude `G`.
    pub absolute_magnitude: Option<f64>,

    /// Slope parameter `K`.
    pub slope_parameter: Option<f64>,

    /// Orbit reference (MPC/MPEC).
    pub reference: String,
}

/// Result of a name lookup, before any printing.
#[derive(Debug, PartialEq)]
pub enum LookupOutcome<'a> {
    Found(&'a CatalogRecord),
    NotFound,
    /// Every matching record, in catalog order.
    Ambiguous(Vec<&'a CatalogRecord>),
}

/// Ordered collection of records with unique designations.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    index: HashMap<Designation, usize>,
}

impl Catalog {
    /// Build a catalog, keeping the first record of each designation.
    ///
    /// Later duplicates are dropped with a warning so that designations stay unique.
    pub fn from_records<I: IntoIterator<Item = CatalogRecord>>(records: I) -> Self {
        let mut catalog = Catalog::default();

        for record in records {
            if catalog.index.contains_key(&record.designation) {
                warn!(
                    designation = %record.designation,
                    "duplicate designation in comet catalog, keeping the first entry"
                );
                continue;
            }
            catalog
                .index
                .insert(record.designation.clone(), catalog.records.len());
            catalog.records.push(record);
        }

        catalog
    }

    /// Parse the content of an MPC `CometEls.txt` file.
    ///
    /// A malformed line is logged with its line number and skipped, the other comets stay
    /// available.
    ///
    /// Return
    /// ----------
    /// * The catalog, or [`AlmanacError::EmptyCatalog`] if the text holds no valid record.
    pub fn from_mpc_text(text: &str) -> Result<Self, AlmanacError> {
        let records: Vec<CatalogRecord> = mpc_comet_reader::parse_comet_els(text)
            .filter_map(|parsed| {
                parsed
                    .map_err(|e| warn!(error = %e, "skipping malformed comet catalog line"))
                    .ok()
            })
            .collect();
        if records.is_empty() {
            return Err(AlmanacError::EmptyCatalog);
        }

        let catalog = Catalog::from_records(records);
        info!(comets = catalog.len(), "comet catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }

    /// Exact designation access.
    pub fn get(&self, designation: &str) -> Option<&CatalogRecord> {
        self.index.get(designation).map(|&idx| &self.records[idx])
    }

    /// Classify the records whose designation contains `pattern`.
    pub fn find(&self, pattern: &str) -> LookupOutcome<'_> {
        let mut matches: Vec<&CatalogRecord> = self
            .records
            .iter()
            .filter(|record| record.designation.contains(pattern))
            .collect();

        match matches.len() {
            0 => LookupOutcome::NotFound,
            1 => LookupOutcome::Found(matches.remove(0)),
            _ => LookupOutcome::Ambiguous(matches),
        }
    }

    /// Resolve `pattern`, writing the disambiguation listing into `out`.
    ///
    /// Arguments
    /// -----------------
    /// * `pattern`: case-sensitive substring of the designation.
    /// * `out`: destination of the listing printed when several records match.
    ///
    /// Return
    /// ----------
    /// * `Some(record)` on a unique match, `None` otherwise; I/O errors of `out` only.
    pub fn lookup_with_writer<W: Write>(
        &self,
        pattern: &str,
        out: &mut W,
    ) -> io::Result<Option<&CatalogRecord>> {
        match self.find(pattern) {
            LookupOutcome::Found(record) => Ok(Some(record)),
            LookupOutcome::NotFound => Ok(None),
            LookupOutcome::Ambiguous(matches) => {
                writeln!(out, "{} comets in catalog", self.len())?;
                writeln!(
                    out,
                    "{}",
                    matches.iter().map(|record| &record.designation).join("\n")
                )?;
                Ok(None)
            }
        }
    }

    /// [`Catalog::lookup_with_writer`] printing to standard output.
    pub fn lookup(&self, pattern: &str) -> Option<&CatalogRecord> {
        // Only the ambiguous case writes, and it returns `None` whatever the write outcome
        self.lookup_with_writer(pattern, &mut io::stdout().lock())
            .ok()
            .flatten()
    }
}
