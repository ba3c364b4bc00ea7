//! Star catalog backends.
//!
//! Every backend implements [`Catalog`](crate::Catalog). The single-source
//! catalogs read one published file format each; [`FileBackend`] merges four
//! of them by magnitude and [`DatabaseBackend`] serves the merged result from
//! SQLite.

pub mod bsc;
pub mod cutover;
pub mod database;
pub mod file_backend;
pub mod hipparcos;
pub mod sao;
pub mod tycho2;
pub mod ucac4;

pub use bsc::{Bsc, BscStar};
pub use cutover::{CutoverCondition, CutoverMagnitudes, CutoverStats};
pub use database::{DatabaseBackend, DatabaseBackendCreator};
pub use file_backend::FileBackend;
pub use hipparcos::{Hipparcos, HipparcosStar};
pub use sao::{Sao, SaoStar};
pub use tycho2::{Tycho2, Tycho2Star};
pub use ucac4::{Ucac4, Ucac4Star, Ucac4StarNumber, Ucac4Zone};
