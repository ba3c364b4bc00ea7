//! One forward-only sequence type over every backend.
//!
//! Backends store stars very differently: an ordered map for the text
//! catalogs, a record index for Tycho-2, a (zone, index) pair for UCAC4, a
//! keyset cursor for SQLite. Each implements [`StarCursor`]; callers see only
//! the owning wrapper [`CatalogIterator`], which borrows the backend for its
//! lifetime `'a`, so a backend can never be dropped under a live iterator.
//!
//! Cursors of different kinds cannot be compared; [`CatalogIterator::try_eq`]
//! reports that as [`CatalogError::Logic`]. The end sentinel is the single
//! exception: it equals any exhausted cursor.

use crate::error::{CatalogError, Result};
use crate::star::Star;
use std::collections::btree_map;
use std::fmt;
use tracing::debug;

pub const END_KIND: &str = "end";

/// Where a cursor stands, comparable between cursors of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorPosition {
    /// Map key (catalog number) of the current entry.
    Key(u64),
    /// Record index into a flat file or table.
    Index(u64),
    /// UCAC4 zone and 0-based in-zone index.
    Zone { zone: u16, index: u64 },
    /// Position inside one stage of a multi-stage scan.
    Stage { stage: u8, inner: Box<CursorPosition> },
    End,
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "key {}", k),
            Self::Index(i) => write!(f, "index {}", i),
            Self::Zone { zone, index } => write!(f, "zone {} index {}", zone, index),
            Self::Stage { stage, inner } => write!(f, "stage {} {}", stage, inner),
            Self::End => write!(f, "end"),
        }
    }
}

/// Capability every backend cursor provides.
pub trait StarCursor {
    /// Identifies the concrete cursor type for comparisons.
    fn kind(&self) -> &'static str;

    fn at_end(&self) -> bool;

    /// The star under the cursor.
    ///
    /// # Errors
    /// [`CatalogError::Range`] at the end; parse errors of lazily decoded
    /// records propagate.
    fn current(&self) -> Result<Star>;

    /// Step forward. Advancing an exhausted cursor is a no-op.
    fn advance(&mut self);

    fn position(&self) -> CursorPosition;

    /// Short diagnostic rendering, used in log messages.
    fn describe(&self) -> String {
        format!("{}@{}", self.kind(), self.position())
    }
}

/// Owning handle on one boxed [`StarCursor`].
pub struct CatalogIterator<'a> {
    cursor: Box<dyn StarCursor + 'a>,
}

impl<'a> CatalogIterator<'a> {
    pub fn new(cursor: impl StarCursor + 'a) -> Self {
        Self {
            cursor: Box::new(cursor),
        }
    }

    /// The end sentinel.
    pub fn end() -> Self {
        Self::new(EndCursor)
    }

    pub fn kind(&self) -> &'static str {
        self.cursor.kind()
    }

    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    pub fn get(&self) -> Result<Star> {
        self.cursor.current()
    }

    pub fn advance(&mut self) {
        self.cursor.advance()
    }

    pub fn position(&self) -> CursorPosition {
        self.cursor.position()
    }

    /// Compare positions.
    ///
    /// # Errors
    /// [`CatalogError::Logic`] when the two cursors are of different kinds
    /// and neither is the end sentinel.
    pub fn try_eq(&self, other: &CatalogIterator<'_>) -> Result<bool> {
        if self.kind() == END_KIND || other.kind() == END_KIND {
            return Ok(self.at_end() == other.at_end());
        }
        if self.kind() != other.kind() {
            return Err(CatalogError::Logic(format!(
                "cannot compare {} iterator with {} iterator",
                self.kind(),
                other.kind()
            )));
        }
        Ok(self.position() == other.position())
    }
}

impl fmt::Display for CatalogIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cursor.describe())
    }
}

impl fmt::Debug for CatalogIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogIterator({})", self)
    }
}

/// Yields every element, including records that fail to decode, so a full
/// pass produces exactly `number_of_stars()` items.
impl Iterator for CatalogIterator<'_> {
    type Item = Result<Star>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_end() {
            return None;
        }
        let star = self.get();
        self.advance();
        Some(star)
    }
}

/// Sentinel that is always exhausted.
pub struct EndCursor;

impl StarCursor for EndCursor {
    fn kind(&self) -> &'static str {
        END_KIND
    }

    fn at_end(&self) -> bool {
        true
    }

    fn current(&self) -> Result<Star> {
        Err(CatalogError::Range("end iterator dereferenced".into()))
    }

    fn advance(&mut self) {}

    fn position(&self) -> CursorPosition {
        CursorPosition::End
    }
}

/// Cursor over an in-memory map keyed by catalog number.
pub struct MapCursor<'a, T> {
    kind: &'static str,
    iter: btree_map::Iter<'a, u32, T>,
    current: Option<(&'a u32, &'a T)>,
}

impl<'a, T: AsRef<Star>> MapCursor<'a, T> {
    pub fn new(kind: &'static str, map: &'a btree_map::BTreeMap<u32, T>) -> Self {
        let mut iter = map.iter();
        let current = iter.next();
        Self {
            kind,
            iter,
            current,
        }
    }
}

impl<T: AsRef<Star>> StarCursor for MapCursor<'_, T> {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    fn current(&self) -> Result<Star> {
        self.current
            .map(|(_, star)| star.as_ref().clone())
            .ok_or_else(|| CatalogError::Range(format!("{} iterator past end", self.kind)))
    }

    fn advance(&mut self) {
        if self.current.is_some() {
            self.current = self.iter.next();
        }
    }

    fn position(&self) -> CursorPosition {
        match self.current {
            Some((key, _)) => CursorPosition::Key(*key as u64),
            None => CursorPosition::End,
        }
    }
}

/// Filters another iterator through a predicate.
///
/// Elements whose decoding fails are skipped, not reported.
pub struct ConditionCursor<'a> {
    inner: CatalogIterator<'a>,
    predicate: Box<dyn FnMut(&Star) -> bool + 'a>,
    current: Option<Star>,
}

impl<'a> ConditionCursor<'a> {
    pub fn new(inner: CatalogIterator<'a>, predicate: impl FnMut(&Star) -> bool + 'a) -> Self {
        let mut cursor = Self {
            inner,
            predicate: Box::new(predicate),
            current: None,
        };
        cursor.seek();
        cursor
    }

    fn seek(&mut self) {
        self.current = None;
        while !self.inner.at_end() {
            match self.inner.get() {
                Ok(star) if (self.predicate)(&star) => {
                    self.current = Some(star);
                    return;
                }
                Ok(_) => {}
                Err(e) => debug!("skipping {}: {}", self.inner, e),
            }
            self.inner.advance();
        }
    }
}

impl StarCursor for ConditionCursor<'_> {
    fn kind(&self) -> &'static str {
        "condition"
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    fn current(&self) -> Result<Star> {
        self.current
            .clone()
            .ok_or_else(|| CatalogError::Range("condition iterator past end".into()))
    }

    fn advance(&mut self) {
        if self.current.is_some() {
            self.inner.advance();
            self.seek();
        }
    }

    fn position(&self) -> CursorPosition {
        if self.current.is_some() {
            self.inner.position()
        } else {
            CursorPosition::End
        }
    }
}
