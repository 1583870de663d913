//! # Almanac
//!
//! Where is that comet tonight, and when does it rise? And, on the side, what is in this
//! `.ics` invitation?
//!
//! - [`almanac::Almanac`] loads the MPC comet catalog once and resolves names with
//!   [`catalog::Catalog::lookup`],
//! - [`position::compute_position`] gives RA/DEC and, for a ground observer, altitude and
//!   azimuth,
//! - [`riseset::schedule`] groups the risings and settings of a comet by local calendar day,
//! - [`calendar`] extracts a single event of an iCalendar file and renders it as text or as a
//!   `remind(1)` line.
//!
//! The `comet` and `icalview` binaries are thin command lines over these modules.
pub mod almanac;
pub mod almanac_errors;
pub mod calendar;
pub mod catalog;
pub mod constants;
pub mod conversion;
pub mod env_state;
pub mod ephemeris;
mod kepler;
pub mod logging;
pub mod observers;
pub mod orbit_type;
pub mod position;
pub mod ref_system;
pub mod riseset;
pub mod time;
