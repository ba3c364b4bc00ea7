//! The catalog-independent star value.
//!
//! Every backend produces [`Star`] values; the catalog-specific types
//! (`BscStar`, `HipparcosStar`, ...) wrap one and add the fields only their
//! source provides. Identity is `(catalog, catalognumber)`: two stars compare
//! equal when they denote the same catalog entry, regardless of position or
//! magnitude, which is what lets result sets collapse duplicates.

use crate::angle::{Angle, RaDec};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Reference epoch of all star positions, as a Julian year.
pub const J2000: f64 = 2000.0;

/// Result set of a window query, in natural star order.
pub type StarSet = BTreeSet<Star>;

/// Marks a star as superseded by an entry of another catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duplicate {
    pub catalog: char,
    /// Name of the superseding entry, when the source cross-references it.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    pub catalog: char,
    pub catalognumber: u64,
    pub name: String,
    pub longname: String,
    pub position: RaDec,
    /// Proper motion as angular rate per Julian year.
    pub pm: RaDec,
    pub mag: f32,
    pub duplicate: Option<Duplicate>,
}

impl Star {
    pub fn new(catalog: char, catalognumber: u64, name: impl Into<String>) -> Self {
        Self {
            catalog,
            catalognumber,
            name: name.into(),
            longname: String::new(),
            position: RaDec::default(),
            pm: RaDec::default(),
            mag: 0.0,
            duplicate: None,
        }
    }

    pub fn ra(&self) -> Angle {
        self.position.ra
    }

    pub fn dec(&self) -> Angle {
        self.position.dec
    }

    pub fn set_duplicate(&mut self, catalog: char, name: Option<String>) {
        self.duplicate = Some(Duplicate { catalog, name });
    }

    /// True if this entry is already supplied by catalog `catalog`.
    pub fn is_duplicate_of(&self, catalog: char) -> bool {
        self.duplicate.as_ref().is_some_and(|d| d.catalog == catalog)
    }

    /// Position at `epoch` (Julian year) by linear proper-motion correction.
    pub fn position_at(&self, epoch: f64) -> RaDec {
        let dt = epoch - J2000;
        RaDec::new(
            self.position.ra + self.pm.ra * dt,
            self.position.dec + self.pm.dec * dt,
        )
    }
}

impl PartialEq for Star {
    fn eq(&self, other: &Self) -> bool {
        self.catalog == other.catalog && self.catalognumber == other.catalognumber
    }
}

impl Eq for Star {}

impl PartialOrd for Star {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Star {
    fn cmp(&self, other: &Self) -> Ordering {
        self.catalog
            .cmp(&other.catalog)
            .then(self.catalognumber.cmp(&other.catalognumber))
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16} {} {:6.2}", self.name, self.position, self.mag)?;
        if !self.longname.is_empty() {
            write!(f, " {}", self.longname)?;
        }
        Ok(())
    }
}

/// Implements the plumbing shared by catalog-specific star types: access to
/// the wrapped [`Star`] and conversion into it.
macro_rules! star_subtype {
    ($ty:ty) => {
        impl $ty {
            pub fn star(&self) -> &$crate::star::Star {
                &self.star
            }
        }

        impl AsRef<$crate::star::Star> for $ty {
            fn as_ref(&self) -> &$crate::star::Star {
                &self.star
            }
        }

        impl From<$ty> for $crate::star::Star {
            fn from(value: $ty) -> Self {
                value.star
            }
        }
    };
}

pub(crate) use star_subtype;

#[cfg(test)]
mod tests {
    use super::*;

    fn star(catalog: char, number: u64, mag: f32) -> Star {
        let mut s = Star::new(catalog, number, format!("{}{}", catalog, number));
        s.mag = mag;
        s
    }

    #[test]
    fn identity_ignores_photometry() {
        assert_eq!(star('H', 7, 1.0), star('H', 7, 9.0));
        assert_ne!(star('H', 7, 1.0), star('T', 7, 1.0));
    }

    #[test]
    fn set_orders_by_catalog_then_number() {
        let set: StarSet = [star('T', 1, 0.0), star('H', 20, 0.0), star('H', 3, 0.0)]
            .into_iter()
            .collect();
        let order: Vec<_> = set.iter().map(|s| (s.catalog, s.catalognumber)).collect();
        assert_eq!(order, vec![('H', 3), ('H', 20), ('T', 1)]);
    }

    #[test]
    fn duplicate_marker() {
        let mut s = star('T', 12, 8.0);
        assert!(!s.is_duplicate_of('H'));
        s.set_duplicate('H', Some("HIP000042".into()));
        assert!(s.is_duplicate_of('H'));
        assert!(!s.is_duplicate_of('T'));
    }

    #[test]
    fn linear_proper_motion() {
        let mut s = star('H', 1, 5.0);
        s.position = RaDec::from_degrees(100.0, 45.0);
        s.pm = RaDec::new(Angle::from_degrees(0.001), Angle::from_degrees(-0.002));
        let p = s.position_at(2010.0);
        assert!((p.ra.degrees() - 100.01).abs() < 1e-9);
        assert!((p.dec.degrees() - 44.98).abs() < 1e-9);
    }
}
