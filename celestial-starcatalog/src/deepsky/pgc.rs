//! Catalogue of Principal Galaxies (VII/119, `pgc.dat`).

use super::{Classification, DeepSkyCatalog, DeepSkyObject, DeepSkyObjects};
use crate::angle::{Angle, RaDec};
use crate::error::{CatalogError, Result};
use crate::record::{field, parse_field, sign_at, text_lines};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FILENAME: &str = "pgc.dat";

const NAMES_OFFSET: usize = 78;
const NAME_WIDTH: usize = 22;

/// `log10` of an axis or axis ratio, `None` for the `9.99` placeholder.
fn log_field(line: &str, start: usize, len: usize, what: &str) -> Result<Option<f64>> {
    let raw = field(line, start, len).trim();
    if raw.is_empty() || raw == "9.99" {
        return Ok(None);
    }
    parse_field(line, start, len, what).map(Some)
}

/// Object type from the two-letter `MType` column.
pub fn classification(code: &str) -> Classification {
    match code.trim() {
        "G" => Classification::Galaxy,
        "M" => Classification::MultipleSystem,
        "GM" => Classification::GalaxyInMultipleSystem,
        _ => Classification::Unidentified,
    }
}

/// Inverse of [`classification`]; blank for anything PGC does not use.
pub fn type_code(classification: Classification) -> &'static str {
    match classification {
        Classification::Galaxy => "G",
        Classification::MultipleSystem => "M",
        Classification::GalaxyInMultipleSystem => "GM",
        _ => "",
    }
}

pub fn parse_record(line: &str) -> Result<DeepSkyObject> {
    let number: u32 = parse_field(line, 3, 7, "PGC number")?;
    let mut object = DeepSkyObject::new(format!("PGC{:07}", number));
    object.number = number as u64;

    let hours = parse_field::<f64>(line, 12, 2, "RA hours")?
        + parse_field::<f64>(line, 14, 2, "RA minutes")? / 60.0
        + parse_field::<f64>(line, 16, 4, "RA seconds")? / 3600.0;
    let degrees = parse_field::<f64>(line, 21, 2, "Dec degrees")?
        + parse_field::<f64>(line, 23, 2, "Dec minutes")? / 60.0
        + parse_field::<f64>(line, 25, 2, "Dec seconds")? / 3600.0;
    object.position = RaDec::from_hours_degrees(hours, sign_at(line, 20) * degrees);

    object.classification = classification(field(line, 28, 2));

    // D25 in units of 0.1 arcmin
    if let Some(log_d25) = log_field(line, 36, 5, "logD25")? {
        let major = Angle::from_degrees(10f64.powf(log_d25) * 0.1 / 60.0);
        object.major_axis = Some(major);
        if let Some(log_r25) = log_field(line, 50, 4, "logR25")? {
            object.minor_axis = Some(major * 10f64.powf(-log_r25));
        }
    }

    let pa = field(line, 63, 4).trim();
    if !pa.is_empty() && pa != "999." {
        object.position_angle = Some(Angle::from_degrees(parse_field(line, 63, 4, "PA")?));
    }

    let count: usize = if field(line, 75, 2).trim().is_empty() {
        0
    } else {
        parse_field(line, 75, 2, "name count")?
    };
    for n in 0..count {
        object.add_name(field(line, NAMES_OFFSET + n * NAME_WIDTH, NAME_WIDTH).trim());
    }
    Ok(object)
}

pub struct Pgc {
    path: PathBuf,
    objects: DeepSkyObjects,
}

impl Pgc {
    /// Read `pgc.dat` from `directory`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let path = directory.as_ref().join(FILENAME);
        debug!("reading PGC from {:?}", path);
        let file = File::open(&path).map_err(|e| CatalogError::file(&path, e))?;

        let mut objects = DeepSkyObjects::default();
        let mut rejected = 0usize;
        for line in text_lines(BufReader::new(file)) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Ok(object) => {
                    objects.insert(object);
                }
                Err(e) => {
                    debug!("record '{}' rejected: {}", field(&line, 0, 10), e);
                    rejected += 1;
                }
            }
        }
        debug!("{} PGC objects, {} rejected", objects.len(), rejected);
        Ok(Self { path, objects })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeepSkyCatalog for Pgc {
    fn name(&self) -> &str {
        "PGC"
    }

    fn objects(&self) -> &DeepSkyObjects {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixture::line;

    struct Record<'a> {
        number: u32,
        ra: &'a str,
        dec: &'a str,
        kind: &'a str,
        log_d25: &'a str,
        log_r25: &'a str,
        pa: &'a str,
        names: &'a [&'a str],
    }

    fn record(r: &Record<'_>) -> String {
        let number = format!("{:7}", r.number);
        let count = format!("{:2}", r.names.len());
        let mut fields = vec![
            (0, "PGC"),
            (3, number.as_str()),
            (12, r.ra),
            (20, r.dec),
            (28, r.kind),
            (36, r.log_d25),
            (50, r.log_r25),
            (63, r.pa),
            (75, count.as_str()),
        ];
        for (n, name) in r.names.iter().enumerate() {
            fields.push((NAMES_OFFSET + n * NAME_WIDTH, *name));
        }
        line(NAMES_OFFSET + r.names.len() * NAME_WIDTH, &fields)
    }

    fn m31() -> Record<'static> {
        Record {
            number: 2557,
            ra: "004244.3",
            dec: "+411609",
            kind: "G ",
            log_d25: " 3.28",
            log_r25: "0.49",
            pa: " 35.",
            names: &["MCG 7-2-16", "UGC 454"],
        }
    }

    #[test]
    fn test_parse_m31() {
        let o = parse_record(&record(&m31())).unwrap();
        assert_eq!(o.name, "PGC0002557");
        assert_eq!(o.number, 2557);
        assert_eq!(o.classification, Classification::Galaxy);
        let ra = 0.0 + 42.0 / 60.0 + 44.3 / 3600.0;
        assert!((o.position.ra.hours() - ra).abs() < 1e-9);
        let dec = 41.0 + 16.0 / 60.0 + 9.0 / 3600.0;
        assert!((o.position.dec.degrees() - dec).abs() < 1e-9);
        let major = 10f64.powf(3.28) * 0.1 / 60.0;
        assert!((o.major_axis.unwrap().degrees() - major).abs() < 1e-9);
        let minor = major * 10f64.powf(-0.49);
        assert!((o.minor_axis.unwrap().degrees() - minor).abs() < 1e-9);
        assert!((o.position_angle.unwrap().degrees() - 35.0).abs() < 1e-9);
        assert!(o.names.contains("UGC 454"));
    }

    #[test]
    fn test_placeholders_are_absent() {
        let r = Record {
            kind: "GM",
            log_d25: " 9.99",
            log_r25: "9.99",
            pa: "999.",
            names: &[],
            ..m31()
        };
        let o = parse_record(&record(&r)).unwrap();
        assert_eq!(o.classification, Classification::GalaxyInMultipleSystem);
        assert!(o.major_axis.is_none());
        assert!(o.minor_axis.is_none());
        assert!(o.position_angle.is_none());
        assert!(o.names.is_empty());
    }

    #[test]
    fn test_southern_declination() {
        let r = Record {
            dec: "-051230",
            ..m31()
        };
        let o = parse_record(&record(&r)).unwrap();
        assert!((o.position.dec.degrees() + (5.0 + 12.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_open_resolves_alternate_names() {
        let dir = tempfile::tempdir().unwrap();
        let second = Record {
            number: 2555,
            ra: "004240.0",
            dec: "+405200",
            names: &["UGC 452"],
            ..m31()
        };
        let content = [record(&m31()), "PGC  broken".to_string(), record(&second)].join("\n");
        std::fs::write(dir.path().join(FILENAME), content + "\n").unwrap();

        let pgc = Pgc::open(dir.path()).unwrap();
        assert_eq!(pgc.len(), 2);
        assert_eq!(pgc.find("UGC 454").unwrap().name, "PGC0002557");
        let like: Vec<_> = pgc.find_like("UGC 45", 5).into_iter().collect();
        assert_eq!(like, vec!["UGC 452", "UGC 454"]);
        let like: Vec<_> = pgc.find_like("PGC", 1).into_iter().collect();
        assert_eq!(like, vec!["PGC0002555"]);
    }

    #[test]
    fn test_invalid_utf8_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = b"PGC\xff\xff\xff2556  004243.0+411500\n".to_vec();
        content.extend(record(&m31()).into_bytes());
        content.push(b'\n');
        std::fs::write(dir.path().join(FILENAME), content).unwrap();
        let pgc = Pgc::open(dir.path()).unwrap();
        assert_eq!(pgc.len(), 1);
        assert_eq!(pgc.find("PGC0002557").unwrap().number, 2557);
    }
}
