//! Where the catalogs live and how the merged view is cut.
//!
//! ```toml
//! basedir = "/data/starcatalogs"
//! database = "/data/stars.db"
//! deepsky = "/data/deepsky"
//!
//! [cutover]
//! bsc = 4.5
//! hipparcos = 7.0
//! tycho2 = 10.0
//! ```
//!
//! Every key is optional. A missing `basedir` falls back to
//! `$STARCATALOG_DIR`, then to `/usr/local/starcatalogs`.

use crate::catalogs::CutoverMagnitudes;
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_BASEDIR: &str = "/usr/local/starcatalogs";
pub const BASEDIR_ENV: &str = "STARCATALOG_DIR";
/// Database file name inside the base directory when none is configured.
pub const DEFAULT_DATABASE: &str = "stars.db";

fn basedir_from(env: Option<String>) -> PathBuf {
    env.filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASEDIR))
}

fn default_basedir() -> PathBuf {
    basedir_from(std::env::var(BASEDIR_ENV).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Directory holding `bsc/`, `hipparcos/`, `sao/`, `tycho2/` and `u4/`.
    pub basedir: PathBuf,
    pub database: Option<PathBuf>,
    /// Directory holding `ngcic/`, `pgc/` and `stellarium/`.
    pub deepsky: Option<PathBuf>,
    pub cutover: CutoverMagnitudes,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            basedir: default_basedir(),
            database: None,
            deepsky: None,
            cutover: CutoverMagnitudes::default(),
        }
    }
}

impl CatalogConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::file(path, e))?;
        let config: Self = content.parse()?;
        debug!("configuration read from {:?}: {:?}", path, config);
        Ok(config)
    }

    /// Read `path` if given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.basedir.join(DEFAULT_DATABASE))
    }

    pub fn deepsky_dir(&self) -> PathBuf {
        self.deepsky.clone().unwrap_or_else(|| self.basedir.clone())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CatalogError::Config(e.to_string()))
    }
}

impl FromStr for CatalogConfig {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CatalogError::Config(e.to_string()))
    }
}
