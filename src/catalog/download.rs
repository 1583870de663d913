//! Catalog sources.
//!
//! A source is described by a short string, parsed with [`TryFrom<&str>`]:
//!
//! * `"mpc"` – the MPC comet element file, downloaded from [`MPC_COMET_URL`] and cached in
//!   `<user cache dir>/almanac_cache/mpc/CometEls.txt` for [`CACHE_MAX_AGE_DAYS`] days;
//! * `"file:<path>"` – a local copy of the same file.
//!
//! The cache root can be moved with the `ALMANAC_CACHE_DIR` environment variable.
use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime},
};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tracing::{debug, info};

use crate::{almanac_errors::AlmanacError, env_state::AlmanacEnv};

pub const MPC_COMET_URL: &str = "https://www.minorplanetcenter.net/iau/MPCORB/CometEls.txt";

/// A cached catalog older than this is downloaded again.
pub const CACHE_MAX_AGE_DAYS: u64 = 7;

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "ALMANAC_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogSource {
    #[default]
    MpcCometEls,
    File(Utf8PathBuf),
}

impl TryFrom<&str> for CatalogSource {
    type Error = AlmanacError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "mpc" | "" => Ok(CatalogSource::MpcCometEls),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(CatalogSource::File(path.into())),
                _ => Err(AlmanacError::InvalidCatalogSource(format!(
                    "'{other}', expected 'mpc' or 'file:<path>'"
                ))),
            },
        }
    }
}

impl CatalogSource {
    /// Text of the catalog file, downloading it if needed.
    pub fn read_catalog_text(&self, env: &AlmanacEnv) -> Result<String, AlmanacError> {
        match self {
            CatalogSource::File(path) => {
                if !path.exists() {
                    return Err(AlmanacError::CatalogFileNotFound(path.to_string()));
                }
                Ok(fs::read_to_string(path)?)
            }
            CatalogSource::MpcCometEls => {
                let cache_file = cache_root()?.join("mpc").join("CometEls.txt");
                let max_age = Duration::from_secs(CACHE_MAX_AGE_DAYS * 86_400);

                if is_fresh(&cache_file, max_age, SystemTime::now()) {
                    debug!(path = %cache_file, "using cached comet catalog");
                    return Ok(fs::read_to_string(&cache_file)?);
                }

                if let Some(dir) = cache_file.parent() {
                    fs::create_dir_all(dir).map_err(|e| {
                        AlmanacError::UnableToCreateCacheDir(format!("{dir}: {e}"))
                    })?;
                }

                info!(url = MPC_COMET_URL, "downloading comet catalog");
                let text = env.get_from_url(MPC_COMET_URL)?;
                fs::write(&cache_file, &text)?;
                debug!(path = %cache_file, bytes = text.len(), "comet catalog cached");
                Ok(text)
            }
        }
    }
}

/// Root of the on-disk cache: `$ALMANAC_CACHE_DIR`, else `<user cache dir>/almanac_cache`.
pub fn cache_root() -> Result<Utf8PathBuf, AlmanacError> {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
        return Utf8PathBuf::from_path_buf(PathBuf::from(dir))
            .map_err(|p| AlmanacError::Utf8PathError(p.display().to_string()));
    }

    let base_dir = BaseDirs::new().ok_or_else(|| {
        AlmanacError::UnableToCreateCacheDir("cannot find the user cache directory".into())
    })?;
    let cache_path = Utf8Path::from_path(base_dir.cache_dir()).ok_or_else(|| {
        AlmanacError::Utf8PathError(base_dir.cache_dir().display().to_string())
    })?;
    Ok(cache_path.join("almanac_cache"))
}

/// Whether `path` exists and was modified less than `max_age` before `now`.
fn is_fresh(path: &Utf8Path, max_age: Duration, now: SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age < max_age)
}
