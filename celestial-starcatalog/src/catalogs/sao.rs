//! Smithsonian Astrophysical Observatory Star Catalog (I/131A, `sao.dat`).
//!
//! 205-byte records. Only the J2000 position block is used; entries flagged
//! as deleted are skipped.

use crate::angle::{Angle, RaDec};
use crate::catalog::{collect_window, prefixed_number, Catalog};
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, MapCursor};
use crate::mapped::{resolve_catalog_file, MappedFile};
use crate::record::{field, parse_field, parse_optional, sign_at};
use crate::star::{star_subtype, Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FILENAME: &str = "sao.dat";
pub const RECORD_LENGTH: usize = 205;

#[derive(Debug, Clone)]
pub struct SaoStar {
    star: Star,
    pub sao: u32,
    /// Standard error of the RA proper motion, 0.001 s/yr.
    pub pm_ra_sigma: Option<u16>,
    /// Standard error of the Dec proper motion, 0.001 arcsec/yr.
    pub pm_dec_sigma: Option<u16>,
    pub photographic_mag: Option<f32>,
    pub spectral_type: String,
}

star_subtype!(SaoStar);

impl SaoStar {
    /// True if `record` is marked as deleted from the catalog.
    pub fn is_deleted(record: &str) -> bool {
        field(record, 6, 1) == "D"
    }

    pub fn parse(record: &str) -> Result<Self> {
        let sao: u32 = parse_field(record, 0, 6, "SAO number")?;
        if Self::is_deleted(record) {
            return Err(CatalogError::parse(format!("SAO {} deleted", sao)));
        }
        let mut star = Star::new('S', sao as u64, format!("SAO{:06}", sao));

        let hours = parse_field::<f64>(record, 150, 2, "RA hours")?
            + parse_field::<f64>(record, 152, 2, "RA minutes")? / 60.0
            + parse_field::<f64>(record, 154, 6, "RA seconds")? / 3600.0;
        let degrees = parse_field::<f64>(record, 168, 2, "Dec degrees")?
            + parse_field::<f64>(record, 170, 2, "Dec minutes")? / 60.0
            + parse_field::<f64>(record, 172, 5, "Dec seconds")? / 3600.0;
        star.position = RaDec::from_hours_degrees(hours, sign_at(record, 167) * degrees);

        // RA in seconds of time per year, Dec in arcsec per year
        let pmra: f64 = parse_field(record, 160, 7, "pmRA")?;
        let pmdec: f64 = parse_field(record, 177, 6, "pmDE")?;
        star.pm = RaDec::new(
            Angle::from_hours(pmra / 3600.0),
            Angle::from_arcseconds(pmdec),
        );

        let photographic_mag = parse_optional::<f32>(record, 76, 4, "Pmag")?;
        let visual_mag = parse_optional::<f32>(record, 80, 4, "Vmag")?;
        star.mag = visual_mag
            .or(photographic_mag)
            .ok_or_else(|| CatalogError::parse(format!("SAO {} has no magnitude", sao)))?;

        Ok(Self {
            star,
            sao,
            pm_ra_sigma: parse_optional(record, 24, 2, "e_pmRA")?,
            pm_dec_sigma: parse_optional(record, 57, 2, "e_pmDE")?,
            photographic_mag,
            spectral_type: field(record, 84, 3).trim().to_string(),
        })
    }
}

pub struct Sao {
    path: PathBuf,
    stars: BTreeMap<u32, SaoStar>,
}

impl Sao {
    /// Open `sao.dat`, given either the file or its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = MappedFile::open(resolve_catalog_file(path, FILENAME)?, RECORD_LENGTH)?;
        let mut stars = BTreeMap::new();
        let (mut deleted, mut skipped) = (0usize, 0usize);
        for index in 0..file.len() {
            let record = match file.get_str(index) {
                Ok(record) => record,
                Err(e) => {
                    debug!("record {} skipped: {}", index, e);
                    skipped += 1;
                    continue;
                }
            };
            if SaoStar::is_deleted(record) {
                deleted += 1;
                continue;
            }
            match SaoStar::parse(record) {
                Ok(star) => {
                    stars.insert(star.sao, star);
                }
                Err(e) => {
                    debug!("record {} skipped: {}", index, e);
                    skipped += 1;
                }
            }
        }
        debug!(
            "{} deleted, {} skipped, {} stars in catalog",
            deleted,
            skipped,
            stars.len()
        );
        Ok(Self {
            path: file.path().to_path_buf(),
            stars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, sao: u32) -> Result<&SaoStar> {
        self.stars
            .get(&sao)
            .ok_or_else(|| CatalogError::not_found(format!("SAO number {}", sao)))
    }
}

impl Catalog for Sao {
    fn name(&self) -> &str {
        "SAO"
    }

    fn find(&self, name: &str) -> Result<Star> {
        let sao = prefixed_number(name, "SAO")?;
        Ok(self.get(sao)?.star.clone())
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let result = collect_window(self.stars.values(), window, magrange);
        debug!("SAO: {} stars in {} {}", result.len(), window, magrange);
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.stars.len() as u64)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(MapCursor::new("sao", &self.stars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixture::line;

    fn sao_record(sao: u32, deleted: bool, j2000: &str, vmag: &str) -> String {
        let number = format!("{:6}", sao);
        let mut record = line(
            RECORD_LENGTH - 1,
            &[
                (0, number.as_str()),
                (6, if deleted { "D" } else { " " }),
                (24, " 7"),
                (57, "12"),
                (76, " 9.1"),
                (80, vmag),
                (84, "K0 "),
                (150, j2000),
            ],
        );
        record.push('\n');
        record
    }

    // RAh RAm RAs pmRA DE- DEd DEm DEs pmDE, packed as in the J2000 block
    const POLARIS: &str = "023148.704+0.0198+891550.79-0.004";
    const SOUTH: &str = "064509.250-0.0380-164247.30-1.223";

    #[test]
    fn test_parse_j2000_block() {
        let s = SaoStar::parse(&sao_record(308, false, POLARIS, " 2.1")).unwrap();
        assert_eq!(s.sao, 308);
        assert_eq!(s.star().name, "SAO000308");
        assert_eq!(s.spectral_type, "K0");
        assert_eq!(s.pm_ra_sigma, Some(7));
        assert_eq!(s.pm_dec_sigma, Some(12));
        assert_eq!(s.photographic_mag, Some(9.1));
        let ra = 2.0 + 31.0 / 60.0 + 48.704 / 3600.0;
        assert!((s.star().ra().hours() - ra).abs() < 1e-9);
        let dec = 89.0 + 15.0 / 60.0 + 50.79 / 3600.0;
        assert!((s.star().dec().degrees() - dec).abs() < 1e-9);
        assert!((s.star().pm.ra.hours() * 3600.0 - 0.0198).abs() < 1e-9);
        assert!((s.star().pm.dec.degrees() * 3600.0 + 0.004).abs() < 1e-9);
    }

    #[test]
    fn test_photographic_fallback() {
        let s = SaoStar::parse(&sao_record(1, false, SOUTH, "    ")).unwrap();
        assert!((s.star().mag - 9.1).abs() < 1e-6);
        assert!(s.star().dec().degrees() < -16.0);
    }

    #[test]
    fn test_open_skips_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let content = [
            sao_record(308, false, POLARIS, " 2.1"),
            sao_record(309, true, POLARIS, " 2.1"),
            sao_record(151881, false, SOUTH, "-1.6"),
        ]
        .concat();
        std::fs::write(dir.path().join(FILENAME), content).unwrap();
        let sao = Sao::open(dir.path()).unwrap();
        assert_eq!(sao.number_of_stars().unwrap(), 2);
        assert!(sao.find("SAO000309").is_err());
        assert_eq!(sao.find("SAO151881").unwrap().catalog, 'S');
        let pole = SkyWindow::new(
            RaDec::from_degrees(0.0, 89.0),
            Angle::from_degrees(360.0),
            Angle::from_degrees(2.0),
        );
        let found = sao.find_window(&pole, &MagnitudeRange::unlimited()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(sao.begin().unwrap().count(), 2);
    }
}
