//! Magnitude hand-over between the merged catalogs.
//!
//! The combined view takes the brightest stars from BSC, then Hipparcos,
//! then Tycho-2, then UCAC4. Each deeper catalog repeats most stars of the
//! shallower ones; a [`CutoverCondition`] decides per star whether it is the
//! catalog's turn to supply it. Conditions count what they reject and are
//! created fresh for every scan.

use crate::star::Star;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Magnitudes at which the combined view switches to the next catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoverMagnitudes {
    /// Stars at least this bright come from BSC.
    pub bsc: f32,
    /// Hipparcos is complete down to this magnitude.
    pub hipparcos: f32,
    /// Tycho-2 is complete down to this magnitude.
    pub tycho2: f32,
}

impl Default for CutoverMagnitudes {
    fn default() -> Self {
        Self {
            bsc: 4.5,
            hipparcos: 7.0,
            tycho2: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CutoverStats {
    pub tried: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub too_bright: u64,
    pub too_faint: u64,
}

#[derive(Debug, Clone)]
pub struct CutoverCondition {
    catalog: char,
    /// Stars at least this bright were supplied by a shallower catalog.
    bright_limit: Option<f32>,
    /// Stars fainter than this are left to a deeper catalog.
    faint_limit: Option<f32>,
    /// Cross-matched entries of this catalog, at least this bright, are
    /// already covered.
    duplicate_of: Option<(char, f32)>,
    stats: CutoverStats,
}

impl CutoverCondition {
    pub fn bsc(magnitudes: &CutoverMagnitudes) -> Self {
        Self {
            catalog: 'B',
            bright_limit: None,
            faint_limit: Some(magnitudes.bsc),
            duplicate_of: None,
            stats: CutoverStats::default(),
        }
    }

    pub fn hipparcos(magnitudes: &CutoverMagnitudes) -> Self {
        Self {
            catalog: 'H',
            bright_limit: Some(magnitudes.bsc),
            faint_limit: Some(magnitudes.hipparcos),
            duplicate_of: None,
            stats: CutoverStats::default(),
        }
    }

    pub fn tycho2(magnitudes: &CutoverMagnitudes) -> Self {
        Self {
            catalog: 'T',
            bright_limit: None,
            faint_limit: Some(magnitudes.tycho2),
            duplicate_of: Some(('H', magnitudes.hipparcos)),
            stats: CutoverStats::default(),
        }
    }

    pub fn ucac4(magnitudes: &CutoverMagnitudes) -> Self {
        Self {
            catalog: 'U',
            bright_limit: None,
            faint_limit: None,
            duplicate_of: Some(('T', magnitudes.tycho2)),
            stats: CutoverStats::default(),
        }
    }

    pub fn catalog(&self) -> char {
        self.catalog
    }

    pub fn stats(&self) -> CutoverStats {
        self.stats
    }

    /// Decide whether `star` belongs to this catalog's slice.
    pub fn accepts(&mut self, star: &Star) -> bool {
        if star.catalog != self.catalog {
            return false;
        }
        self.stats.tried += 1;
        if let Some((catalog, limit)) = self.duplicate_of {
            if star.is_duplicate_of(catalog) && star.mag <= limit {
                self.stats.duplicates += 1;
                return false;
            }
        }
        if self.bright_limit.is_some_and(|limit| star.mag <= limit) {
            self.stats.too_bright += 1;
            return false;
        }
        if self.faint_limit.is_some_and(|limit| star.mag > limit) {
            self.stats.too_faint += 1;
            return false;
        }
        self.stats.accepted += 1;
        true
    }

    pub fn log_stats(&self) {
        debug!("{}", self);
    }
}

impl fmt::Display for CutoverCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "catalog {}: {} tried, {} accepted, {} duplicates, {} too bright, {} too faint",
            self.catalog,
            self.stats.tried,
            self.stats.accepted,
            self.stats.duplicates,
            self.stats.too_bright,
            self.stats.too_faint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(catalog: char, mag: f32, duplicate: Option<char>) -> Star {
        let mut s = Star::new(catalog, 1, "x");
        s.mag = mag;
        if let Some(d) = duplicate {
            s.set_duplicate(d, None);
        }
        s
    }

    #[test]
    fn bsc_takes_the_brightest() {
        let mut c = CutoverCondition::bsc(&CutoverMagnitudes::default());
        assert!(c.accepts(&star('B', -1.46, None)));
        assert!(c.accepts(&star('B', 4.5, None)));
        assert!(!c.accepts(&star('B', 4.51, None)));
        assert_eq!(c.stats().too_faint, 1);
    }

    #[test]
    fn hipparcos_takes_the_middle_slice() {
        let mut c = CutoverCondition::hipparcos(&CutoverMagnitudes::default());
        assert!(!c.accepts(&star('H', 4.5, None)));
        assert!(c.accepts(&star('H', 4.6, None)));
        assert!(c.accepts(&star('H', 7.0, None)));
        assert!(!c.accepts(&star('H', 7.1, None)));
        let stats = c.stats();
        assert_eq!((stats.tried, stats.accepted, stats.too_bright, stats.too_faint), (4, 2, 1, 1));
    }

    #[test]
    fn tycho2_rejects_hipparcos_duplicates() {
        let mut c = CutoverCondition::tycho2(&CutoverMagnitudes::default());
        assert!(!c.accepts(&star('T', 6.0, Some('H'))));
        // fainter than Hipparcos completeness: keep despite the match
        assert!(c.accepts(&star('T', 8.0, Some('H'))));
        assert!(c.accepts(&star('T', 6.0, None)));
        assert!(!c.accepts(&star('T', 10.5, None)));
        assert_eq!(c.stats().duplicates, 1);
    }

    #[test]
    fn ucac4_has_no_faint_limit() {
        let mut c = CutoverCondition::ucac4(&CutoverMagnitudes::default());
        assert!(!c.accepts(&star('U', 9.0, Some('T'))));
        assert!(c.accepts(&star('U', 10.5, Some('T'))));
        assert!(c.accepts(&star('U', 18.0, None)));
    }

    #[test]
    fn foreign_catalog_is_rejected_uncounted() {
        let mut c = CutoverCondition::bsc(&CutoverMagnitudes::default());
        assert!(!c.accepts(&star('H', 1.0, None)));
        assert_eq!(c.stats(), CutoverStats::default());
        assert!(c.to_string().starts_with("catalog B: 0 tried"));
    }

    #[test]
    fn custom_magnitudes() {
        let m = CutoverMagnitudes {
            bsc: 3.0,
            hipparcos: 8.0,
            tycho2: 11.0,
        };
        let mut c = CutoverCondition::hipparcos(&m);
        assert!(c.accepts(&star('H', 7.5, None)));
        assert!(!c.accepts(&star('H', 2.9, None)));
    }
}
