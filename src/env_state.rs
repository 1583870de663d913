//! # Almanac environment state
//!
//! [`AlmanacEnv`] holds the resources shared by everything that talks to the outside world:
//! for now a single [`ureq::Agent`] used to download the comet catalog.
//!
//! ```text
//! AlmanacEnv
//! └── http_client  (ureq::Agent, 30 s global timeout)
//! ```
use std::convert::TryFrom;
use std::{fmt::Debug, time::Duration};

use tracing::debug;
use ureq::{
    http::{self, Uri},
    Agent,
};

use crate::almanac_errors::AlmanacError;

/// Global timeout of a single HTTP request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AlmanacEnv {
    pub http_client: Agent,
}

impl Default for AlmanacEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl AlmanacEnv {
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .build();
        let agent: Agent = config.into();

        AlmanacEnv { http_client: agent }
    }

    /// Perform a GET request and return the body as text.
    ///
    /// Return
    /// ----------
    /// * The response body, or [`AlmanacError::UreqHttpError`] on transport errors, HTTP error
    ///   statuses and undecodable bodies.
    pub(crate) fn get_from_url<U>(&self, url: U) -> Result<String, AlmanacError>
    where
        U: Debug,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        debug!(?url, "HTTP GET");
        let body = self
            .http_client
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;
        Ok(body)
    }
}
