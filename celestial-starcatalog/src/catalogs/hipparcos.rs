//! Hipparcos main catalogue (I/239, `hip_main.dat`).
//!
//! 451-byte records, `|`-separated fixed columns. Parsed eagerly into a map
//! keyed by HIP number; records without a position are skipped.

use crate::angle::{Angle, RaDec};
use crate::catalog::{collect_window, prefixed_number, Catalog};
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, MapCursor};
use crate::mapped::{resolve_catalog_file, MappedFile};
use crate::record::{parse_field, sign_at};
use crate::star::{star_subtype, Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FILENAME: &str = "hip_main.dat";
pub const RECORD_LENGTH: usize = 451;

#[derive(Debug, Clone)]
pub struct HipparcosStar {
    star: Star,
    pub hip: u32,
}

star_subtype!(HipparcosStar);

impl HipparcosStar {
    pub fn parse(record: &str) -> Result<Self> {
        let hip: u32 = parse_field(record, 8, 6, "HIP number")?;
        let mut star = Star::new('H', hip as u64, format!("HIP{:06}", hip));

        let hours = parse_field::<f64>(record, 17, 2, "RA hours")?
            + parse_field::<f64>(record, 20, 2, "RA minutes")? / 60.0
            + parse_field::<f64>(record, 23, 5, "RA seconds")? / 3600.0;
        let degrees = parse_field::<f64>(record, 30, 2, "Dec degrees")?
            + parse_field::<f64>(record, 33, 2, "Dec minutes")? / 60.0
            + parse_field::<f64>(record, 36, 4, "Dec seconds")? / 3600.0;
        star.position = RaDec::from_hours_degrees(hours, sign_at(record, 29) * degrees);
        star.mag = parse_field(record, 41, 5, "Vmag")?;

        // mas/yr; the RA component is a great-circle rate, mu_alpha * cos(dec)
        let pmra: f64 = parse_field(record, 87, 8, "pmRA")?;
        let pmdec: f64 = parse_field(record, 96, 8, "pmDE")?;
        star.pm = RaDec::new(
            Angle::from_arcseconds(pmra / 1000.0 / star.position.dec.cos()),
            Angle::from_arcseconds(pmdec / 1000.0),
        );

        Ok(Self { star, hip })
    }
}

pub struct Hipparcos {
    path: PathBuf,
    stars: BTreeMap<u32, HipparcosStar>,
}

impl Hipparcos {
    /// Open `hip_main.dat`, given either the file or its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = MappedFile::open(resolve_catalog_file(path, FILENAME)?, RECORD_LENGTH)?;
        let mut stars = BTreeMap::new();
        let mut skipped = 0usize;
        for index in 0..file.len() {
            match file.get_str(index).and_then(HipparcosStar::parse) {
                Ok(star) => {
                    stars.insert(star.hip, star);
                }
                Err(e) => {
                    debug!("record {} skipped: {}", index, e);
                    skipped += 1;
                }
            }
        }
        debug!("{} records skipped, {} stars in catalog", skipped, stars.len());
        Ok(Self {
            path: file.path().to_path_buf(),
            stars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, hip: u32) -> Result<&HipparcosStar> {
        self.stars
            .get(&hip)
            .ok_or_else(|| CatalogError::not_found(format!("illegal hip number {}", hip)))
    }
}

impl Catalog for Hipparcos {
    fn name(&self) -> &str {
        "Hipparcos"
    }

    fn find(&self, name: &str) -> Result<Star> {
        let hip = prefixed_number(name, "HIP")?;
        Ok(self.get(hip)?.star.clone())
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let result = collect_window(self.stars.values(), window, magrange);
        debug!("Hipparcos: {} stars in {} {}", result.len(), window, magrange);
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.stars.len() as u64)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(MapCursor::new("hipparcos", &self.stars)))
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    use super::RECORD_LENGTH;
    use crate::record::fixture::line;

    /// A `hip_main.dat` record; `ra` and `dec` are the sexagesimal text columns.
    pub fn hip_record(hip: u32, ra: &str, dec: &str, vmag: &str, pm: (&str, &str)) -> String {
        let number = format!("{:6}", hip);
        let mut record = line(
            RECORD_LENGTH - 1,
            &[
                (0, "H|"),
                (8, number.as_str()),
                (17, ra),
                (29, dec),
                (41, vmag),
                (87, pm.0),
                (96, pm.1),
            ],
        );
        record.push('\n');
        record
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::hip_record;
    use super::*;

    fn catalog_file(dir: &Path) -> PathBuf {
        let content = [
            hip_record(7, "00 01 20.09", "-00 00 50.0", " 8.50", ("  100.00", " -200.00")),
            hip_record(32349, "06 45 09.25", "-16 42 47.3", "-1.44", (" -546.01", "-1223.08")),
            // no position
            hip_record(120, "           ", "           ", " 9.90", ("    0.00", "    0.00")),
        ]
        .concat();
        let path = dir.join(FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_sirius() {
        let record =
            hip_record(32349, "06 45 09.25", "-16 42 47.3", "-1.44", (" -546.01", "-1223.08"));
        let s = HipparcosStar::parse(&record).unwrap();
        assert_eq!(s.hip, 32349);
        assert_eq!(s.star().name, "HIP032349");
        assert_eq!(s.star().catalog, 'H');
        let ra = 6.0 + 45.0 / 60.0 + 9.25 / 3600.0;
        assert!((s.star().ra().hours() - ra).abs() < 1e-9);
        let dec = -(16.0 + 42.0 / 60.0 + 47.3 / 3600.0);
        assert!((s.star().dec().degrees() - dec).abs() < 1e-9);
        // pmDE is not scaled
        assert!((s.star().pm.dec.degrees() * 3_600_000.0 + 1223.08).abs() < 1e-6);
        // pmRA is divided by cos(dec)
        let expected = -546.01 / dec.to_radians().cos();
        assert!((s.star().pm.ra.degrees() * 3_600_000.0 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_open_directory_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        catalog_file(dir.path());
        let hip = Hipparcos::open(dir.path()).unwrap();
        assert_eq!(hip.number_of_stars().unwrap(), 2);
        assert_eq!(hip.find("HIP032349").unwrap().catalognumber, 32349);
        assert_eq!(hip.find("HIP7").unwrap().name, "HIP000007");
        assert!(matches!(hip.find("HIP000120"), Err(CatalogError::NotFound(_))));
        assert!(matches!(hip.find("T0001 00001 1"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_window_across_zero_hours() {
        let dir = tempfile::tempdir().unwrap();
        let file = catalog_file(dir.path());
        let hip = Hipparcos::open(&file).unwrap();
        let window = SkyWindow::new(
            RaDec::from_hours_degrees(23.9, 0.0),
            Angle::from_hours(0.5),
            Angle::from_degrees(2.0),
        );
        let stars = hip.find_window(&window, &MagnitudeRange::unlimited()).unwrap();
        assert_eq!(stars.iter().map(|s| s.catalognumber).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_begin_yields_every_star() {
        let dir = tempfile::tempdir().unwrap();
        catalog_file(dir.path());
        let hip = Hipparcos::open(dir.path()).unwrap();
        let mut it = hip.begin().unwrap();
        assert_eq!(it.get().unwrap().catalognumber, 7);
        it.advance();
        assert_eq!(it.get().unwrap().catalognumber, 32349);
        it.advance();
        assert!(it.try_eq(&hip.end()).unwrap());
    }
}
