//! Tycho-2 main catalogue (I/259, `tyc2.dat`).
//!
//! 2.5 million 207-byte records, sorted by identifier. Records are decoded
//! lazily from the memory map on every access. Name lookup is a binary
//! search on the 12-byte identifier prefix of each record.

use crate::angle::{Angle, RaDec};
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, CursorPosition, StarCursor};
use crate::mapped::{resolve_catalog_file, MappedFile};
use crate::record::{field, parse_field, parse_optional};
use crate::star::{star_subtype, Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use std::path::Path;
use tracing::debug;

pub const FILENAME: &str = "tyc2.dat";
pub const RECORD_LENGTH: usize = 207;
const KEY_LENGTH: usize = 12;

#[derive(Debug, Clone)]
pub struct Tycho2Star {
    star: Star,
    pub tyc1: u16,
    pub tyc2: u16,
    pub tyc3: u8,
    pub bt: Option<f32>,
    pub vt: f32,
    pub hip: Option<u32>,
}

star_subtype!(Tycho2Star);

impl Tycho2Star {
    /// Decode a complete record including its line terminator.
    pub fn parse(record: &str) -> Result<Self> {
        if field(record, 13, 1) == "X" {
            return Err(CatalogError::parse("record has no position"));
        }
        if record.len() != RECORD_LENGTH {
            return Err(CatalogError::parse(format!("bad record length {}", record.len())));
        }

        let tyc1: u16 = parse_field(record, 0, 4, "TYC1")?;
        let tyc2: u16 = parse_field(record, 5, 5, "TYC2")?;
        let tyc3: u8 = parse_field(record, 11, 1, "TYC3")?;
        let number = format!(
            "{}{}{}",
            field(record, 0, 4),
            field(record, 5, 5),
            field(record, 11, 1)
        );
        let catalognumber = number
            .trim()
            .parse()
            .map_err(|_| CatalogError::parse(format!("bad Tycho-2 identifier '{}'", number)))?;
        let mut star = Star::new('T', catalognumber, format!("T{}", field(record, 0, KEY_LENGTH)));

        let vt: f32 = parse_field(record, 123, 6, "VT")?;
        let bt: Option<f32> = parse_optional(record, 110, 6, "BT").ok().flatten();
        star.mag = vt - 0.090 * (bt.unwrap_or(vt) - vt);

        star.position = RaDec::from_degrees(
            parse_field(record, 15, 12, "RA")?,
            parse_field(record, 28, 12, "Dec")?,
        );

        // mas/yr; pmRA is mu_alpha * cos(dec)
        let pmra: f64 = parse_field(record, 41, 7, "pmRA")?;
        let pmdec: f64 = parse_field(record, 49, 7, "pmDE")?;
        star.pm = RaDec::new(
            Angle::from_arcseconds(pmra / 1000.0 / star.position.dec.cos()),
            Angle::from_arcseconds(pmdec / 1000.0),
        );

        let hip: Option<u32> = parse_optional(record, 142, 6, "HIP")?;
        if let Some(hip) = hip {
            star.set_duplicate('H', Some(format!("HIP{:06}", hip)));
        }

        Ok(Self {
            star,
            tyc1,
            tyc2,
            tyc3,
            bt,
            vt,
            hip,
        })
    }
}

/// Normalize `T<zone> <run> <sequence>` into the 12-byte record key.
fn search_key(name: &str) -> Result<String> {
    let invalid = || CatalogError::not_found(format!("'{}' is not a Tycho2 name", name));
    let rest = name.strip_prefix('T').ok_or_else(invalid)?;
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [zone, run, sequence] = parts.as_slice() else {
        return Err(invalid());
    };
    let zone: u16 = zone.parse().map_err(|_| invalid())?;
    let run: u32 = run.parse().map_err(|_| invalid())?;
    let sequence: u8 = sequence.parse().map_err(|_| invalid())?;
    if zone > 9999 || run > 99999 || sequence > 9 {
        return Err(invalid());
    }
    Ok(format!("{:04} {:05} {}", zone, run, sequence))
}

pub struct Tycho2 {
    file: MappedFile,
}

impl Tycho2 {
    /// Map `tyc2.dat`, given either the file or its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = MappedFile::open(resolve_catalog_file(path, FILENAME)?, RECORD_LENGTH)?;
        debug!("Tycho2 catalog {:?}: {} records", file.path(), file.len());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }

    /// Decode record `index`.
    pub fn get(&self, index: usize) -> Result<Tycho2Star> {
        Tycho2Star::parse(self.file.get_str(index)?)
    }

    fn key(&self, index: usize) -> Result<&str> {
        Ok(field(self.file.get_str(index)?, 0, KEY_LENGTH))
    }

    /// Record index for `name`.
    ///
    /// An identifier that is not in the file yields the index of the nearest
    /// record at or below it rather than an error.
    pub fn index(&self, name: &str) -> Result<usize> {
        let key = search_key(name)?;
        if self.file.is_empty() {
            return Err(CatalogError::not_found(format!("{}: catalog is empty", name)));
        }
        let (mut min, mut max) = (0, self.file.len() - 1);
        if self.key(min)? > key.as_str() {
            debug!("'{}' sorts before the first record", key);
            return Ok(min);
        }
        while max - min > 1 {
            let current = (min + max) / 2;
            if self.key(current)? <= key.as_str() {
                min = current;
            } else {
                max = current;
            }
        }
        let found = if self.key(max)? <= key.as_str() {
            max
        } else {
            min
        };
        if self.key(found)? != key {
            debug!("no exact match for '{}', using record {}", key, found);
        }
        Ok(found)
    }
}

impl Catalog for Tycho2 {
    fn name(&self) -> &str {
        "Tycho2"
    }

    fn find(&self, name: &str) -> Result<Star> {
        debug!("retrieve star '{}'", name);
        Ok(self.get(self.index(name)?)?.into())
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let mut result = StarSet::new();
        for index in 0..self.file.len() {
            // records without a position are expected here
            let Ok(star) = self.get(index) else { continue };
            if magrange.contains(star.star.mag) && window.contains(&star.star.position) {
                result.insert(star.into());
            }
        }
        debug!("Tycho2: {} stars in {} {}", result.len(), window, magrange);
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.file.len() as u64)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(Tycho2Cursor {
            catalog: self,
            index: 0,
        }))
    }
}

struct Tycho2Cursor<'a> {
    catalog: &'a Tycho2,
    index: usize,
}

impl StarCursor for Tycho2Cursor<'_> {
    fn kind(&self) -> &'static str {
        "tycho2"
    }

    fn at_end(&self) -> bool {
        self.index >= self.catalog.len()
    }

    fn current(&self) -> Result<Star> {
        Ok(self.catalog.get(self.index)?.into())
    }

    fn advance(&mut self) {
        self.index = (self.index + 1).min(self.catalog.len());
    }

    fn position(&self) -> CursorPosition {
        if self.at_end() {
            CursorPosition::End
        } else {
            CursorPosition::Index(self.index as u64)
        }
    }
}
