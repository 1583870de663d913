//! # Orbital element representations
//!
//! Comet catalogs publish perihelion-based elements, valid for every conic. They are kept in
//! [`cometary_element::CometaryElements`] and propagated with the universal-variable solver of
//! [`crate::kepler`].

/// Cometary (perihelion-based) orbital elements and their propagation.
pub mod cometary_element;
