//! # Almanac: catalog source, lazy catalog and ephemeris
//!
//! [`Almanac`] is the context object handed to every query. It wires together:
//!
//! 1. **Environment state** ([`AlmanacEnv`]) – the HTTP agent used to fetch the catalog.
//! 2. **Catalog source** ([`CatalogSource`]) – where the comet elements come from.
//! 3. **Comet catalog** ([`Catalog`]) – parsed on first use through a [`OnceCell`], then reused
//!    read-only for the rest of the run.
//! 4. **Ephemeris** ([`TwoBodyEphemeris`]) – the propagation service used by positions and
//!    rise/set searches.
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use almanac::almanac::Almanac;
//!
//! let almanac = Almanac::new("mpc").unwrap();
//!
//! // The catalog is downloaded (or read from the cache) only here
//! if let Some(record) = almanac.lookup("NEOWISE").unwrap() {
//!     println!("{}", record.designation);
//! }
//! ```
//!
//! ## See also
//! ------------
//! * [`CatalogSource`] – Source descriptor strings (`"mpc"`, `"file:<path>"`).
//! * [`Catalog::lookup`] – Lookup rules and disambiguation listing.
use once_cell::sync::OnceCell;

use crate::{
    almanac_errors::AlmanacError,
    catalog::{download::CatalogSource, Catalog, CatalogRecord},
    env_state::AlmanacEnv,
    ephemeris::TwoBodyEphemeris,
};

#[derive(Debug, Clone)]
pub struct Almanac {
    env_state: AlmanacEnv,
    catalog_source: CatalogSource,
    catalog: OnceCell<Catalog>,
    ephemeris: TwoBodyEphemeris,
}

impl Almanac {
    /// Construct a new [`Almanac`] context.
    ///
    /// The catalog is **not** read yet; it is loaded the first time
    /// [`get_catalog`](Almanac::get_catalog) is called.
    ///
    /// Arguments
    /// -----------------
    /// * `catalog_source`: a descriptor resolvable into a [`CatalogSource`]
    ///   (`"mpc"` or `"file:<path>"`).
    ///
    /// Return
    /// ----------
    /// * The context, or [`AlmanacError::InvalidCatalogSource`].
    pub fn new(catalog_source: &str) -> Result<Self, AlmanacError> {
        Ok(Almanac {
            env_state: AlmanacEnv::new(),
            catalog_source: catalog_source.try_into()?,
            catalog: OnceCell::new(),
            ephemeris: TwoBodyEphemeris::default(),
        })
    }

    /// Context around an already built catalog, nothing is ever downloaded.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Almanac {
            env_state: AlmanacEnv::new(),
            catalog_source: CatalogSource::default(),
            catalog: OnceCell::with_value(catalog),
            ephemeris: TwoBodyEphemeris::default(),
        }
    }

    pub fn catalog_source(&self) -> &CatalogSource {
        &self.catalog_source
    }

    /// Get the lazily-loaded comet catalog.
    ///
    /// Return
    /// ----------
    /// * `&Catalog` on success, or the download/parse error of the first load. A failed load
    ///   is retried on the next call.
    ///
    /// See also
    /// ------------
    /// * [`CatalogSource::read_catalog_text`] – Download and cache handling.
    /// * [`Catalog::from_mpc_text`] – Parsing of the element file.
    pub fn get_catalog(&self) -> Result<&Catalog, AlmanacError> {
        self.catalog.get_or_try_init(|| {
            let text = self.catalog_source.read_catalog_text(&self.env_state)?;
            Catalog::from_mpc_text(&text)
        })
    }

    pub fn ephemeris(&self) -> &TwoBodyEphemeris {
        &self.ephemeris
    }

    /// Resolve a comet name, loading the catalog if needed.
    ///
    /// The ambiguous case prints the listing on standard output, see [`Catalog::lookup`].
    pub fn lookup(&self, pattern: &str) -> Result<Option<&CatalogRecord>, AlmanacError> {
        Ok(self.get_catalog()?.lookup(pattern))
    }
}
