//! Uniform query engine over published star and deep-sky catalogs.
//!
//! Reads the Yale Bright Star Catalogue, Hipparcos, SAO, Tycho-2 and UCAC4 in
//! their distribution formats, merges BSC, Hipparcos, Tycho-2 and UCAC4 into
//! one catalog ordered by limiting magnitude, and serves the merged result
//! from SQLite. Tycho-2 and UCAC4 are memory-mapped and decoded one record
//! at a time; the smaller text catalogs are parsed at open.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | The [`Catalog`] trait every star backend implements |
//! | [`catalogs`] | Backends: [`Bsc`](catalogs::Bsc), [`Hipparcos`](catalogs::Hipparcos), [`Sao`](catalogs::Sao), [`Tycho2`](catalogs::Tycho2), [`Ucac4`](catalogs::Ucac4), [`FileBackend`](catalogs::FileBackend), [`DatabaseBackend`](catalogs::DatabaseBackend) |
//! | [`iterator`] | [`CatalogIterator`] and the [`StarCursor`](iterator::StarCursor) protocol |
//! | [`window`] | [`SkyWindow`] and [`MagnitudeRange`] predicates |
//! | [`deepsky`] | NGC/IC, PGC and Stellarium deep-sky catalogs, [`DeepSkyCatalogCache`](deepsky::DeepSkyCatalogCache), [`PgcDatabase`](deepsky::PgcDatabase) |
//! | [`factory`] | [`open_catalog`] by [`CatalogKind`] |
//! | [`config`] | [`CatalogConfig`] file and defaults |
//! | [`mapped`] | Fixed-record memory-mapped files |
//!
//! # Quick Start
//!
//! ```ignore
//! use celestial_starcatalog::{open_catalog, Angle, CatalogKind, MagnitudeRange, RaDec, SkyWindow};
//!
//! let catalog = open_catalog(CatalogKind::Combined, "/usr/local/starcatalogs")?;
//! let sirius = catalog.find("HIP032349")?;
//!
//! let window = SkyWindow::new(
//!     RaDec::from_hours_degrees(6.75, -16.7),
//!     Angle::from_hours(1.0),
//!     Angle::from_degrees(15.0),
//! );
//! for star in catalog.find_window(&window, &MagnitudeRange::up_to(8.0))? {
//!     println!("{}", star);
//! }
//! ```
//!
//! # Features
//!
//! - **`cli`** (default) enables the `starcatalog` and `buildcatalog` binaries.
//! - **`integration-tests`** runs the tests against real catalog files under
//!   `data/`.

pub mod angle;
pub mod catalog;
pub mod catalogs;
pub mod config;
pub mod deepsky;
pub mod error;
pub mod factory;
pub mod iterator;
pub mod mapped;
pub mod record;
pub mod star;
pub mod window;

pub use angle::{Angle, RaDec};
pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use factory::{open_catalog, open_configured, CatalogKind};
pub use iterator::CatalogIterator;
pub use star::{Star, StarSet};
pub use window::{MagnitudeRange, SkyWindow};
