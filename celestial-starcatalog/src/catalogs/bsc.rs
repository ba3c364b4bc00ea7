//! Yale Bright Star Catalogue (V/50).
//!
//! Reads the fixed-width `catalog` file and the `notes` companion from one
//! directory. All 9110 entries are parsed at open; entries without a position
//! (novae, non-stellar objects removed from later editions) fail to parse and
//! are counted as rejected.

use crate::angle::{Angle, RaDec};
use crate::catalog::{collect_window, prefixed_number, Catalog};
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, MapCursor};
use crate::record::{field, parse_field, parse_optional, sign_at, text_lines};
use crate::star::{star_subtype, Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CATALOG_FILENAME: &str = "catalog";
pub const NOTES_FILENAME: &str = "notes";

#[derive(Debug, Clone)]
pub struct BscStar {
    star: Star,
    pub number: u16,
    /// SAO cross-reference, 0 if the entry has none.
    pub sao: u32,
    pub notes: Vec<String>,
}

star_subtype!(BscStar);

impl BscStar {
    pub fn parse(line: &str) -> Result<Self> {
        let number: u16 = parse_field(line, 0, 4, "BSC number")?;
        let mut star = Star::new('B', number as u64, format!("BSC{:04}", number));
        star.longname = field(line, 5, 9).trim_end().to_string();
        star.mag = parse_field(line, 102, 5, "magnitude")?;

        let hours = parse_field::<f64>(line, 75, 2, "RA hours")?
            + parse_field::<f64>(line, 77, 2, "RA minutes")? / 60.0
            + parse_field::<f64>(line, 79, 4, "RA seconds")? / 3600.0;
        let degrees = parse_field::<f64>(line, 84, 2, "Dec degrees")?
            + parse_field::<f64>(line, 86, 2, "Dec minutes")? / 60.0
            + parse_field::<f64>(line, 88, 2, "Dec seconds")? / 3600.0;
        star.position = RaDec::from_hours_degrees(hours, sign_at(line, 83) * degrees);

        // arcsec per year; absent for a handful of entries
        let pmra = parse_optional::<f64>(line, 148, 6, "pmRA").ok().flatten();
        let pmdec = parse_optional::<f64>(line, 154, 6, "pmDE").ok().flatten();
        if let (Some(pmra), Some(pmdec)) = (pmra, pmdec) {
            star.pm = RaDec::new(Angle::from_arcseconds(pmra), Angle::from_arcseconds(pmdec));
        }

        let sao = parse_optional(line, 31, 6, "SAO number")
            .ok()
            .flatten()
            .unwrap_or(0);

        Ok(Self {
            star,
            number,
            sao,
            notes: Vec::new(),
        })
    }
}

pub struct Bsc {
    catalog_path: PathBuf,
    stars: BTreeMap<u32, BscStar>,
}

impl Bsc {
    /// Open the catalog in `basedir`, which must hold `catalog` and `notes`.
    pub fn open(basedir: impl AsRef<Path>) -> Result<Self> {
        let basedir = basedir.as_ref();
        Self::from_files(basedir.join(CATALOG_FILENAME), basedir.join(NOTES_FILENAME))
    }

    pub fn from_files(catalog: impl AsRef<Path>, notes: impl AsRef<Path>) -> Result<Self> {
        let (catalog, notes) = (catalog.as_ref(), notes.as_ref());
        let catalog_file = File::open(catalog).map_err(|e| CatalogError::file(catalog, e))?;
        let notes_file = File::open(notes).map_err(|e| CatalogError::file(notes, e))?;

        let mut stars = BTreeMap::new();
        let mut rejected = 0usize;
        for line in text_lines(BufReader::new(catalog_file)) {
            let line = line.map_err(|e| CatalogError::file(catalog, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match BscStar::parse(&line) {
                Ok(star) => {
                    stars.insert(star.number as u32, star);
                }
                Err(e) => {
                    debug!("object '{}' skipped: {}", field(&line, 0, 4), e);
                    rejected += 1;
                }
            }
        }
        debug!("{} stars rejected, {} stars in catalog", rejected, stars.len());

        let mut attached = 0usize;
        for line in text_lines(BufReader::new(notes_file)) {
            let line = line.map_err(|e| CatalogError::file(notes, e))?;
            let Ok(number) = field(&line, 0, 5).trim().parse::<u32>() else {
                continue;
            };
            if let Some(star) = stars.get_mut(&number) {
                star.notes.push(field(&line, 6, line.len()).to_string());
                attached += 1;
            }
        }
        debug!("{} notes attached", attached);

        Ok(Self {
            catalog_path: catalog.to_path_buf(),
            stars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.catalog_path
    }

    /// Entry by BSC (HR) number.
    pub fn get(&self, number: u32) -> Result<&BscStar> {
        self.stars
            .get(&number)
            .ok_or_else(|| CatalogError::not_found(format!("BSC number {}", number)))
    }

    pub fn stars(&self) -> impl Iterator<Item = &BscStar> {
        self.stars.values()
    }
}

impl Catalog for Bsc {
    fn name(&self) -> &str {
        "BSC"
    }

    fn find(&self, name: &str) -> Result<Star> {
        let number = prefixed_number(name, "BSC")?;
        Ok(self.get(number)?.star.clone())
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let result = collect_window(self.stars.values(), window, magrange);
        debug!("BSC: {} stars in {} {}", result.len(), window, magrange);
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.stars.len() as u64)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(MapCursor::new("bsc", &self.stars)))
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    use crate::record::fixture::line;

    /// A catalog line in the V/50 layout.
    pub fn bsc_line(
        number: u16,
        longname: &str,
        ra: (u32, u32, f64),
        dec: (char, u32, u32, u32),
        mag: f32,
    ) -> String {
        let number = format!("{:4}", number);
        let ra_h = format!("{:02}", ra.0);
        let ra_m = format!("{:02}", ra.1);
        let ra_s = format!("{:04.1}", ra.2);
        let sign = dec.0.to_string();
        let dec_d = format!("{:02}", dec.1);
        let dec_m = format!("{:02}", dec.2);
        let dec_s = format!("{:02}", dec.3);
        let mag = format!("{:5.2}", mag);
        line(
            197,
            &[
                (0, number.as_str()),
                (5, longname),
                (31, "128572"),
                (75, ra_h.as_str()),
                (77, ra_m.as_str()),
                (79, ra_s.as_str()),
                (83, sign.as_str()),
                (84, dec_d.as_str()),
                (86, dec_m.as_str()),
                (88, dec_s.as_str()),
                (102, mag.as_str()),
                (148, "+0.015"),
                (154, "-0.018"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::bsc_line;
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = String::new();
        catalog.push_str(&bsc_line(1, "", (0, 5, 9.9), ('+', 45, 13, 45), 6.70));
        catalog.push('\n');
        catalog.push_str(&bsc_line(3, "33    Psc", (0, 5, 20.1), ('-', 5, 42, 27), 4.61));
        catalog.push('\n');
        // no position: a removed entry
        catalog.push_str("  92                                                          \n");
        catalog.push_str(&bsc_line(2491, " 9Alp CMa", (6, 45, 8.9), ('-', 16, 42, 58), -1.46));
        catalog.push('\n');
        fs::write(dir.path().join(CATALOG_FILENAME), catalog).unwrap();
        fs::write(
            dir.path().join(NOTES_FILENAME),
            "    3 1C   Variable radial velocity.\n 9999 1N   Not in catalog.\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_parse_line() {
        let line = bsc_line(3, "33    Psc", (0, 5, 20.1), ('-', 5, 42, 27), 4.61);
        let s = BscStar::parse(&line).unwrap();
        assert_eq!(s.number, 3);
        assert_eq!(s.sao, 128572);
        assert_eq!(s.star().name, "BSC0003");
        assert_eq!(s.star().longname, "33    Psc");
        assert!((s.star().mag - 4.61).abs() < 1e-6);
        let expected_ra = 5.0 / 60.0 + 20.1 / 3600.0;
        assert!((s.star().ra().hours() - expected_ra).abs() < 1e-9);
        let expected_dec = -(5.0 + 42.0 / 60.0 + 27.0 / 3600.0);
        assert!((s.star().dec().degrees() - expected_dec).abs() < 1e-9);
        assert!((s.star().pm.ra.degrees() * 3600.0 - 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_open_skips_and_attaches_notes() {
        let dir = fixture();
        let bsc = Bsc::open(dir.path()).unwrap();
        assert_eq!(bsc.number_of_stars().unwrap(), 3);
        assert_eq!(bsc.get(3).unwrap().notes, vec!["1C   Variable radial velocity."]);
        assert!(bsc.get(1).unwrap().notes.is_empty());
    }

    #[test]
    fn test_find_by_name() {
        let dir = fixture();
        let bsc = Bsc::open(dir.path()).unwrap();
        let sirius = bsc.find("BSC2491").unwrap();
        assert_eq!(sirius.longname, " 9Alp CMa");
        assert_eq!(bsc.find(&sirius.name).unwrap(), sirius);
        assert!(matches!(bsc.find("BSC0092"), Err(CatalogError::NotFound(_))));
        assert!(matches!(bsc.find("HIP000001"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_window_and_magnitude() {
        let dir = fixture();
        let bsc = Bsc::open(dir.path()).unwrap();
        let window = SkyWindow::new(
            RaDec::from_hours_degrees(0.1, 0.0),
            Angle::from_hours(0.5),
            Angle::from_degrees(100.0),
        );
        let all = bsc.find_window(&window, &MagnitudeRange::unlimited()).unwrap();
        assert_eq!(all.iter().map(|s| s.catalognumber).collect::<Vec<_>>(), vec![1, 3]);
        let bright = bsc.find_window(&window, &MagnitudeRange::up_to(5.0)).unwrap();
        assert_eq!(bright.len(), 1);
    }

    #[test]
    fn test_iteration_matches_count() {
        let dir = fixture();
        let bsc = Bsc::open(dir.path()).unwrap();
        let names: Vec<String> = bsc.begin().unwrap().map(|s| s.unwrap().name).collect();
        assert_eq!(names, vec!["BSC0001", "BSC0003", "BSC2491"]);
    }

    #[test]
    fn test_invalid_utf8_line_is_rejected() {
        let dir = fixture();
        let path = dir.path().join(CATALOG_FILENAME);
        let mut catalog = b"\xff\xfe\xff 12 bad bytes\n".to_vec();
        catalog.extend(fs::read(&path).unwrap());
        fs::write(&path, catalog).unwrap();
        let mut notes = fs::read(dir.path().join(NOTES_FILENAME)).unwrap();
        notes.extend(b"    1 1N   \xe9toile\n");
        fs::write(dir.path().join(NOTES_FILENAME), notes).unwrap();

        let bsc = Bsc::open(dir.path()).unwrap();
        assert_eq!(bsc.number_of_stars().unwrap(), 3);
        assert_eq!(bsc.get(1).unwrap().notes, vec!["1N   \u{fffd}toile"]);
    }

    #[test]
    fn test_missing_notes_is_an_error() {
        let dir = fixture();
        fs::remove_file(dir.path().join(NOTES_FILENAME)).unwrap();
        assert!(matches!(Bsc::open(dir.path()), Err(CatalogError::File { .. })));
    }
}
