//! Open a star backend by kind.

use crate::catalog::Catalog;
use crate::catalogs::{Bsc, DatabaseBackend, FileBackend, Hipparcos, Sao, Tycho2, Ucac4};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Bsc,
    Hipparcos,
    Sao,
    Tycho2,
    Ucac4,
    /// BSC, Hipparcos, Tycho-2 and UCAC4 merged by magnitude.
    Combined,
    Database,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 7] = [
        Self::Bsc,
        Self::Hipparcos,
        Self::Sao,
        Self::Tycho2,
        Self::Ucac4,
        Self::Combined,
        Self::Database,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Bsc => "bsc",
            Self::Hipparcos => "hipparcos",
            Self::Sao => "sao",
            Self::Tycho2 => "tycho2",
            Self::Ucac4 => "ucac4",
            Self::Combined => "combined",
            Self::Database => "database",
        }
    }

    /// Location of this kind's data relative to the catalog base directory.
    pub fn path_in(self, config: &CatalogConfig) -> PathBuf {
        let basedir = &config.basedir;
        match self {
            Self::Bsc => basedir.join("bsc"),
            Self::Hipparcos => basedir.join("hipparcos"),
            Self::Sao => basedir.join("sao"),
            Self::Tycho2 => basedir.join("tycho2"),
            Self::Ucac4 => basedir.join("u4"),
            Self::Combined => basedir.clone(),
            Self::Database => config.database_path(),
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| CatalogError::not_found(format!("unknown catalog kind '{}'", s)))
    }
}

/// Open the backend of `kind` at `path`.
///
/// `path` is the catalog directory (or data file) for the single-source
/// kinds, the base directory for [`CatalogKind::Combined`] and the SQLite
/// file for [`CatalogKind::Database`].
pub fn open_catalog(kind: CatalogKind, path: impl AsRef<Path>) -> Result<Box<dyn Catalog>> {
    let path = path.as_ref();
    info!("opening {} catalog at {:?}", kind, path);
    Ok(match kind {
        CatalogKind::Bsc => Box::new(Bsc::open(path)?),
        CatalogKind::Hipparcos => Box::new(Hipparcos::open(path)?),
        CatalogKind::Sao => Box::new(Sao::open(path)?),
        CatalogKind::Tycho2 => Box::new(Tycho2::open(path)?),
        CatalogKind::Ucac4 => Box::new(Ucac4::open(path)?),
        CatalogKind::Combined => Box::new(FileBackend::open(path)?),
        CatalogKind::Database => Box::new(DatabaseBackend::open(path)?),
    })
}

/// Open the backend of `kind` where `config` says it lives.
pub fn open_configured(kind: CatalogKind, config: &CatalogConfig) -> Result<Box<dyn Catalog>> {
    match kind {
        CatalogKind::Combined => {
            info!("opening combined catalog at {:?}", config.basedir);
            Ok(Box::new(FileBackend::with_cutover(&config.basedir, config.cutover)?))
        }
        _ => open_catalog(kind, kind.path_in(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in CatalogKind::ALL {
            assert_eq!(kind.to_string().parse::<CatalogKind>().unwrap(), kind);
        }
        assert_eq!("UCAC4".parse::<CatalogKind>().unwrap(), CatalogKind::Ucac4);
        assert!("gaia".parse::<CatalogKind>().is_err());
    }

    #[test]
    fn configured_paths() {
        let config = CatalogConfig {
            basedir: PathBuf::from("/cat"),
            ..CatalogConfig::default()
        };
        assert_eq!(CatalogKind::Ucac4.path_in(&config), PathBuf::from("/cat/u4"));
        assert_eq!(CatalogKind::Combined.path_in(&config), PathBuf::from("/cat"));
        assert_eq!(CatalogKind::Database.path_in(&config), PathBuf::from("/cat/stars.db"));
    }

    #[test]
    fn missing_catalog_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [
            CatalogKind::Bsc,
            CatalogKind::Hipparcos,
            CatalogKind::Ucac4,
            CatalogKind::Combined,
        ] {
            assert!(open_catalog(kind, dir.path().join("nothing")).is_err(), "{}", kind);
        }
    }

    #[test]
    fn database_is_created_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = open_catalog(CatalogKind::Database, dir.path().join("new.db")).unwrap();
        assert_eq!(catalog.name(), "Database");
        assert_eq!(catalog.number_of_stars().unwrap(), 0);
    }
}
