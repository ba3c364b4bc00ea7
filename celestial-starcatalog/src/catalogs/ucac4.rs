//! Fourth U.S. Naval Observatory CCD Astrograph Catalog (UCAC4, I/322A).
//!
//! The catalog directory holds 900 binary zone files `u4b/z001..z900`, one
//! per 0.2° declination band starting at the south pole, plus the index
//! `u4i/u4index.asc`. Every zone file is an array of 78-byte little-endian
//! records sorted by right ascension.
//!
//! Records are decoded on access. The most recently used zone stays mapped
//! in a one-entry cache; the cache sits behind a `RefCell`, so a [`Ucac4`]
//! is confined to one thread.

use crate::angle::{Angle, RaDec, HALF_PI, MAS_TO_RAD};
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, CursorPosition, StarCursor};
use crate::mapped::MappedFile;
use crate::star::{star_subtype, Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use byteorder::{ByteOrder, LittleEndian};
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use tracing::debug;

pub const RECORD_LENGTH: usize = 78;
pub const ZONES: u16 = 900;
/// Declination height of one zone, degrees.
pub const ZONE_HEIGHT: f64 = 0.2;

/// Zone and 1-based in-zone number of a UCAC4 star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ucac4StarNumber {
    zone: u16,
    number: u32,
}

impl Ucac4StarNumber {
    pub fn new(zone: u16, number: u32) -> Result<Self> {
        if !(1..=ZONES).contains(&zone) {
            return Err(CatalogError::Range(format!("UCAC4 zone {} out of range", zone)));
        }
        if number == 0 || number > 999_999 {
            return Err(CatalogError::Range(format!("UCAC4 number {} out of range", number)));
        }
        Ok(Self { zone, number })
    }

    pub fn zone(&self) -> u16 {
        self.zone
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Packed `zone * 1_000_000 + number`.
    pub fn catalognumber(&self) -> u64 {
        self.zone as u64 * 1_000_000 + self.number as u64
    }
}

impl FromStr for Ucac4StarNumber {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || CatalogError::not_found(format!("'{}' is not a UCAC4 name", s));
        let rest = s.trim().strip_prefix("UCAC4-").ok_or_else(malformed)?;
        let (zone, number) = rest.split_once('-').ok_or_else(malformed)?;
        let zone: u16 = zone.parse().map_err(|_| malformed())?;
        let number: u32 = number.parse().map_err(|_| malformed())?;
        Self::new(zone, number).map_err(|_| malformed())
    }
}

impl fmt::Display for Ucac4StarNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UCAC4-{:03}-{:06}", self.zone, self.number)
    }
}

#[derive(Debug, Clone)]
pub struct Ucac4Star {
    star: Star,
    pub number: Ucac4StarNumber,
    /// Aperture magnitude.
    pub mag2: f32,
    pub mag_sigma: f32,
    pub obj_type: u8,
    pub double_star_flag: u8,
    /// Raw proper motion and sigmas, 0.1 mas/yr.
    pub pm_ra: i16,
    pub pm_dec: i16,
    pub pm_ra_sigma: i8,
    pub pm_dec_sigma: i8,
    pub twomass_id: u32,
    pub mag_j: f32,
    pub mag_h: f32,
    pub mag_k: f32,
    /// Matched to a Hipparcos or Tycho-2 star.
    pub hiptyc2: bool,
    pub id_number: u32,
}

star_subtype!(Ucac4Star);

impl Ucac4Star {
    /// Decode one packed record.
    pub fn decode(number: Ucac4StarNumber, record: &[u8]) -> Result<Self> {
        if record.len() < RECORD_LENGTH {
            return Err(CatalogError::parse(format!(
                "{}: short record of {} bytes",
                number,
                record.len()
            )));
        }
        let ra = LittleEndian::read_i32(&record[0..4]);
        let spd = LittleEndian::read_i32(&record[4..8]);
        let mag1 = LittleEndian::read_u16(&record[8..10]);
        let mag2 = LittleEndian::read_u16(&record[10..12]);
        let pm_ra = LittleEndian::read_i16(&record[24..26]);
        let pm_dec = LittleEndian::read_i16(&record[26..28]);
        let catalog_flags = LittleEndian::read_u32(&record[62..66]);

        let mut star = Star::new('U', number.catalognumber(), number.to_string());
        let dec = Angle::from_radians(spd as f64 * MAS_TO_RAD - HALF_PI);
        star.position = RaDec::new(Angle::from_radians(ra as f64 * MAS_TO_RAD), dec);
        // pm_ra is a great-circle rate
        star.pm = RaDec::new(
            Angle::from_radians(pm_ra as f64 * 0.1 * MAS_TO_RAD / dec.cos()),
            Angle::from_radians(pm_dec as f64 * 0.1 * MAS_TO_RAD),
        );
        star.mag = mag1 as f32 * 0.001;

        // leading digit of the nine-digit catalog match flags
        let hiptyc2 = matches!(catalog_flags / 100_000_000, 1 | 3);
        if hiptyc2 {
            star.set_duplicate('T', None);
        }

        Ok(Self {
            star,
            number,
            mag2: mag2 as f32 * 0.001,
            mag_sigma: record[12] as f32 * 0.001,
            obj_type: record[13],
            double_star_flag: record[14],
            pm_ra,
            pm_dec,
            pm_ra_sigma: record[28] as i8,
            pm_dec_sigma: record[29] as i8,
            twomass_id: LittleEndian::read_u32(&record[30..34]),
            mag_j: LittleEndian::read_u16(&record[34..36]) as f32 * 0.001,
            mag_h: LittleEndian::read_u16(&record[36..38]) as f32 * 0.001,
            mag_k: LittleEndian::read_u16(&record[38..40]) as f32 * 0.001,
            hiptyc2,
            id_number: LittleEndian::read_u32(&record[68..72]),
        })
    }
}

/// One mapped zone file.
pub struct Ucac4Zone {
    zone: u16,
    file: MappedFile,
}

impl Ucac4Zone {
    pub fn open(zone: u16, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            zone,
            file: MappedFile::open(path, RECORD_LENGTH)?,
        })
    }

    pub fn zone(&self) -> u16 {
        self.zone
    }

    pub fn len(&self) -> usize {
        self.file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }

    /// Star by 1-based in-zone number.
    pub fn get(&self, number: u32) -> Result<Ucac4Star> {
        if number == 0 {
            return Err(CatalogError::Range("cannot get star number 0".into()));
        }
        self.at(number as usize - 1)
    }

    /// Star by 0-based record index.
    pub fn at(&self, index: usize) -> Result<Ucac4Star> {
        let number = Ucac4StarNumber::new(self.zone, index as u32 + 1)?;
        Ucac4Star::decode(number, self.file.get(index)?)
    }

    fn ra_at(&self, index: usize) -> Result<f64> {
        let record = self.file.get(index)?;
        Ok(LittleEndian::read_i32(&record[0..4]) as f64 * MAS_TO_RAD)
    }

    /// Index of the first record with RA ≥ `ra`, or `len()` if there is none.
    pub fn first(&self, ra: Angle) -> Result<usize> {
        self.partition(|record_ra| record_ra < ra.radians())
    }

    /// Index of the first record with RA > `ra`, or `len()` if there is none.
    pub fn after(&self, ra: Angle) -> Result<usize> {
        self.partition(|record_ra| record_ra <= ra.radians())
    }

    /// First index whose RA fails `before`; records are sorted by RA.
    fn partition(&self, before: impl Fn(f64) -> bool) -> Result<usize> {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if before(self.ra_at(mid)?) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Record index ranges that may hold stars of `window`.
    pub fn candidates(&self, window: &SkyWindow) -> Result<Vec<Range<usize>>> {
        if window.covers_all_ra() {
            return Ok(vec![0..self.len()]);
        }
        let left = self.first(window.leftra())?;
        let right = self.after(window.rightra())?;
        if window.wraps() {
            Ok(vec![0..right, left..self.len()])
        } else {
            Ok(vec![left..right.max(left)])
        }
    }

    /// Insert the stars of this zone that fall in `window` and `magrange`.
    pub fn add(
        &self,
        result: &mut StarSet,
        window: &SkyWindow,
        magrange: &MagnitudeRange,
    ) -> Result<()> {
        let before = result.len();
        for range in self.candidates(window)? {
            for index in range {
                let star = self.at(index)?;
                if magrange.contains(star.star.mag) && window.contains(&star.star.position) {
                    result.insert(star.into());
                }
            }
        }
        debug!("{} stars from zone {}", result.len() - before, self.zone);
        Ok(())
    }

    pub fn find(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let mut result = StarSet::new();
        self.add(&mut result, window, magrange)?;
        Ok(result)
    }
}

/// Zone containing declination `dec`, clamped to `1..=900`.
pub fn zone_of(dec: Angle) -> u16 {
    let zone = 1.0 + ((dec.degrees() + 90.0) / ZONE_HEIGHT).floor();
    zone.clamp(1.0, ZONES as f64) as u16
}

/// Inclusive range of zones touched by the declination extent of `window`.
pub fn zone_interval(window: &SkyWindow) -> (u16, u16) {
    let (bottom, top) = window.decinterval();
    (zone_of(bottom), zone_of(top))
}

pub struct Ucac4 {
    directory: PathBuf,
    zone_sizes: Vec<usize>,
    cache: RefCell<Option<Rc<Ucac4Zone>>>,
}

impl Ucac4 {
    /// Open the catalog directory. The index and all 900 zone files must
    /// exist.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let index = index_path(&directory);
        fs::metadata(&index).map_err(|e| CatalogError::file(&index, e))?;

        let mut zone_sizes = Vec::with_capacity(ZONES as usize);
        for zone in 1..=ZONES {
            let path = zone_path(&directory, zone);
            let meta = fs::metadata(&path).map_err(|e| CatalogError::file(&path, e))?;
            zone_sizes.push(meta.len() as usize / RECORD_LENGTH);
        }
        debug!(
            "UCAC4 catalog {:?}: {} stars",
            directory,
            zone_sizes.iter().sum::<usize>()
        );
        Ok(Self {
            directory,
            zone_sizes,
            cache: RefCell::new(None),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of records in `zone`, 0 for an invalid zone.
    pub fn zone_size(&self, zone: u16) -> usize {
        if (1..=ZONES).contains(&zone) {
            self.zone_sizes[zone as usize - 1]
        } else {
            0
        }
    }

    /// Mapped zone file, served from the one-entry cache when possible.
    pub fn zone(&self, zone: u16) -> Result<Rc<Ucac4Zone>> {
        if !(1..=ZONES).contains(&zone) {
            return Err(CatalogError::Range(format!("UCAC4 zone {} out of range", zone)));
        }
        if let Some(cached) = self.cache.borrow().as_ref() {
            if cached.zone() == zone {
                return Ok(Rc::clone(cached));
            }
        }
        debug!("opening zone {}", zone);
        let opened = Rc::new(Ucac4Zone::open(zone, zone_path(&self.directory, zone))?);
        *self.cache.borrow_mut() = Some(Rc::clone(&opened));
        Ok(opened)
    }

    pub fn get(&self, number: Ucac4StarNumber) -> Result<Ucac4Star> {
        self.zone(number.zone())?.get(number.number())
    }
}

fn zone_path(directory: &Path, zone: u16) -> PathBuf {
    directory.join("u4b").join(format!("z{:03}", zone))
}

fn index_path(directory: &Path) -> PathBuf {
    directory.join("u4i").join("u4index.asc")
}

impl Catalog for Ucac4 {
    fn name(&self) -> &str {
        "UCAC4"
    }

    fn find(&self, name: &str) -> Result<Star> {
        let number: Ucac4StarNumber = name.parse()?;
        match self.get(number) {
            Ok(star) => Ok(star.into()),
            Err(CatalogError::Range(_)) => Err(CatalogError::not_found(name)),
            Err(e) => Err(e),
        }
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let (minzone, maxzone) = zone_interval(window);
        let mut result = StarSet::new();
        for zone in minzone..=maxzone {
            self.zone(zone)?.add(&mut result, window, magrange)?;
        }
        debug!(
            "UCAC4: {} stars from zones {}..={} in {} {}",
            result.len(),
            minzone,
            maxzone,
            window,
            magrange
        );
        Ok(result)
    }

    fn find_iter(
        &self,
        window: &SkyWindow,
        magrange: &MagnitudeRange,
    ) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(Ucac4WindowCursor::new(
            self, *window, *magrange,
        )))
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.zone_sizes.iter().map(|&n| n as u64).sum())
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        let mut cursor = Ucac4Cursor {
            catalog: self,
            zone: 1,
            index: 0,
        };
        cursor.skip_empty_zones();
        Ok(CatalogIterator::new(cursor))
    }
}

/// Full scan in (zone, index) order.
struct Ucac4Cursor<'a> {
    catalog: &'a Ucac4,
    zone: u16,
    index: usize,
}

impl Ucac4Cursor<'_> {
    fn skip_empty_zones(&mut self) {
        while self.zone <= ZONES && self.index >= self.catalog.zone_size(self.zone) {
            self.zone += 1;
            self.index = 0;
        }
    }
}

impl StarCursor for Ucac4Cursor<'_> {
    fn kind(&self) -> &'static str {
        "ucac4"
    }

    fn at_end(&self) -> bool {
        self.zone > ZONES
    }

    fn current(&self) -> Result<Star> {
        if self.at_end() {
            return Err(CatalogError::Range("ucac4 iterator past end".into()));
        }
        Ok(self.catalog.zone(self.zone)?.at(self.index)?.into())
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.index += 1;
            self.skip_empty_zones();
        }
    }

    fn position(&self) -> CursorPosition {
        if self.at_end() {
            CursorPosition::End
        } else {
            CursorPosition::Zone {
                zone: self.zone,
                index: self.index as u64,
            }
        }
    }
}

/// Window scan restricted to the zones and RA ranges the window touches.
struct Ucac4WindowCursor<'a> {
    catalog: &'a Ucac4,
    window: SkyWindow,
    magrange: MagnitudeRange,
    next_zone: u16,
    last_zone: u16,
    zone: Option<Rc<Ucac4Zone>>,
    ranges: Vec<Range<usize>>,
    current: Option<(u16, usize, Star)>,
}

impl<'a> Ucac4WindowCursor<'a> {
    fn new(catalog: &'a Ucac4, window: SkyWindow, magrange: MagnitudeRange) -> Self {
        let (first_zone, last_zone) = zone_interval(&window);
        let mut cursor = Self {
            catalog,
            window,
            magrange,
            next_zone: first_zone,
            last_zone,
            zone: None,
            ranges: Vec::new(),
            current: None,
        };
        cursor.seek();
        cursor
    }

    fn load_next_zone(&mut self) {
        let number = self.next_zone;
        self.next_zone += 1;
        self.ranges.clear();
        match self
            .catalog
            .zone(number)
            .and_then(|zone| Ok((zone.candidates(&self.window)?, zone)))
        {
            Ok((ranges, zone)) => {
                self.ranges = ranges;
                self.zone = Some(zone);
            }
            Err(e) => {
                debug!("zone {} skipped: {}", number, e);
                self.zone = None;
            }
        }
    }

    fn seek(&mut self) {
        self.current = None;
        loop {
            if let Some(zone) = &self.zone {
                while let Some(range) = self.ranges.first_mut() {
                    while range.start < range.end {
                        let index = range.start;
                        range.start += 1;
                        match zone.at(index) {
                            Ok(star)
                                if self.magrange.contains(star.star.mag)
                                    && self.window.contains(&star.star.position) =>
                            {
                                self.current = Some((zone.zone(), index, star.into()));
                                return;
                            }
                            Ok(_) => {}
                            Err(e) => debug!("zone {} record {}: {}", zone.zone(), index, e),
                        }
                    }
                    self.ranges.remove(0);
                }
            }
            if self.next_zone > self.last_zone {
                self.zone = None;
                return;
            }
            self.load_next_zone();
        }
    }
}

impl StarCursor for Ucac4WindowCursor<'_> {
    fn kind(&self) -> &'static str {
        "ucac4-window"
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    fn current(&self) -> Result<Star> {
        self.current
            .as_ref()
            .map(|(_, _, star)| star.clone())
            .ok_or_else(|| CatalogError::Range("ucac4 window iterator past end".into()))
    }

    fn advance(&mut self) {
        if self.current.is_some() {
            self.seek();
        }
    }

    fn position(&self) -> CursorPosition {
        match &self.current {
            Some((zone, index, _)) => CursorPosition::Zone {
                zone: *zone,
                index: *index as u64,
            },
            None => CursorPosition::End,
        }
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    use super::*;

    /// A packed record at the given position and model magnitude.
    pub fn ucac4_record(ra_deg: f64, dec_deg: f64, mag: f32, catalog_flags: u32) -> [u8; 78] {
        let mut record = [0u8; RECORD_LENGTH];
        LittleEndian::write_i32(&mut record[0..4], (ra_deg * 3_600_000.0).round() as i32);
        LittleEndian::write_i32(&mut record[4..8], ((dec_deg + 90.0) * 3_600_000.0).round() as i32);
        LittleEndian::write_u16(&mut record[8..10], (mag * 1000.0).round() as u16);
        LittleEndian::write_u16(&mut record[10..12], (mag * 1000.0).round() as u16 + 50);
        record[12] = 20;
        LittleEndian::write_i16(&mut record[24..26], -123);
        LittleEndian::write_i16(&mut record[26..28], 45);
        LittleEndian::write_u32(&mut record[62..66], catalog_flags);
        record
    }

    /// A complete catalog directory; `zones` lists the non-empty zones.
    pub fn ucac4_tree(dir: &Path, zones: &[(u16, Vec<[u8; 78]>)]) {
        fs::create_dir_all(dir.join("u4b")).unwrap();
        fs::create_dir_all(dir.join("u4i")).unwrap();
        fs::write(index_path(dir), b"").unwrap();
        for zone in 1..=ZONES {
            let records: Vec<u8> = zones
                .iter()
                .filter(|(z, _)| *z == zone)
                .flat_map(|(_, records)| records.iter().flatten().copied())
                .collect();
            fs::write(zone_path(dir, zone), records).unwrap();
        }
    }
}
