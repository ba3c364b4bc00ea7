//! Stellarium deep-sky catalog (`catalog.txt`).
//!
//! Tab-separated, `#` starts a comment line. Columns: id, RA and Dec in
//! degrees, B and V magnitude (99 when unknown), numeric object type,
//! morphological type, major and minor axis in arcmin, orientation in
//! degrees, then one column per cross-referenced catalog. A zero or empty
//! cross-reference means the object is not in that catalog.

use super::{Classification, DeepSkyCatalog, DeepSkyObject, DeepSkyObjects};
use crate::angle::{Angle, RaDec};
use crate::error::{CatalogError, Result};
use crate::record::text_lines;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const FILENAME: &str = "catalog.txt";

const FIRST_REFERENCE: usize = 10;
const UNKNOWN_MAGNITUDE: f32 = 99.0;

/// Cross-reference columns in file order, with the prefix each designation
/// is written with. The first one present names the object.
pub const REFERENCES: [(&str, &str); 20] = [
    ("NGC", "NGC"),
    ("IC", "IC"),
    ("M", "M"),
    ("C", "C"),
    ("B", "B"),
    ("Sh2", "Sh2-"),
    ("VdB", "VdB"),
    ("RCW", "RCW"),
    ("LDN", "LDN"),
    ("LBN", "LBN"),
    ("Cr", "Cr"),
    ("Mel", "Mel"),
    ("PGC", "PGC"),
    ("UGC", "UGC"),
    ("Ced", "Ced"),
    ("Arp", "Arp"),
    ("VV", "VV"),
    ("PK", "PK "),
    ("PN G", "PN G"),
    ("SNR G", "SNR G"),
];

fn classification(code: u32) -> Classification {
    match code {
        0..=4 => Classification::Galaxy,
        5 | 6 | 8 | 9 => Classification::OpenCluster,
        7 => Classification::GlobularCluster,
        10 | 12..=15 | 17 | 18 => Classification::BrightNebula,
        11 => Classification::PlanetaryNebula,
        16 => Classification::ClusterWithNebulosity,
        _ => Classification::Unidentified,
    }
}

fn column<'a>(columns: &[&'a str], index: usize) -> &'a str {
    columns.get(index).map(|c| c.trim()).unwrap_or("")
}

fn parse_column<T: FromStr>(columns: &[&str], index: usize, what: &str) -> Result<T> {
    let raw = column(columns, index);
    raw.parse()
        .map_err(|_| CatalogError::parse(format!("cannot parse {}: '{}'", what, raw)))
}

fn optional_column<T: FromStr>(columns: &[&str], index: usize, what: &str) -> Result<Option<T>> {
    if column(columns, index).is_empty() {
        return Ok(None);
    }
    parse_column(columns, index, what).map(Some)
}

/// Designations present in the cross-reference columns, in column order.
fn designations(columns: &[&str]) -> Vec<String> {
    REFERENCES
        .iter()
        .enumerate()
        .filter_map(|(i, (_, prefix))| {
            let value = column(columns, FIRST_REFERENCE + i);
            let absent = value.is_empty() || value.parse::<f64>().is_ok_and(|v| v == 0.0);
            (!absent).then(|| format!("{}{}", prefix, value))
        })
        .collect()
}

pub fn parse_line(line: &str) -> Result<DeepSkyObject> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < FIRST_REFERENCE {
        return Err(CatalogError::parse(format!(
            "{} columns, need at least {}",
            columns.len(),
            FIRST_REFERENCE
        )));
    }
    let id: u64 = parse_column(&columns, 0, "id")?;
    let mut names = designations(&columns);
    let name = if names.is_empty() {
        format!("DSO{}", id)
    } else {
        names.remove(0)
    };

    let mut object = DeepSkyObject::new(name);
    object.number = id;
    object.position = RaDec::from_degrees(
        parse_column(&columns, 1, "RA")?,
        parse_column(&columns, 2, "Dec")?,
    );
    let bmag: Option<f32> = optional_column(&columns, 3, "Bmag")?;
    let vmag: Option<f32> = optional_column(&columns, 4, "Vmag")?;
    object.mag = vmag
        .filter(|m| *m < UNKNOWN_MAGNITUDE)
        .or(bmag.filter(|m| *m < UNKNOWN_MAGNITUDE));
    let kind: Option<u32> = optional_column(&columns, 5, "type")?;
    object.classification = kind.map_or(Classification::Unidentified, classification);

    let axis = |index: usize, what: &str| -> Result<Option<Angle>> {
        Ok(optional_column::<f64>(&columns, index, what)?
            .filter(|a| *a > 0.0)
            .map(|a| Angle::from_degrees(a / 60.0)))
    };
    object.major_axis = axis(7, "major axis")?;
    object.minor_axis = axis(8, "minor axis")?;
    object.position_angle =
        optional_column::<f64>(&columns, 9, "orientation")?.map(Angle::from_degrees);

    for alias in names {
        object.add_name(alias);
    }
    Ok(object)
}

pub struct Stellarium {
    path: PathBuf,
    objects: DeepSkyObjects,
}

impl Stellarium {
    /// Read `catalog.txt` from `directory`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let path = directory.as_ref().join(FILENAME);
        debug!("reading Stellarium catalog from {:?}", path);
        let file = File::open(&path).map_err(|e| CatalogError::file(&path, e))?;

        let mut objects = DeepSkyObjects::default();
        let mut rejected = 0usize;
        for (lineno, line) in text_lines(BufReader::new(file)).enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(&line) {
                Ok(object) => {
                    objects.insert(object);
                }
                Err(e) => {
                    debug!("line {} rejected: {}", lineno + 1, e);
                    rejected += 1;
                }
            }
        }
        debug!("{} Stellarium objects, {} rejected", objects.len(), rejected);
        Ok(Self { path, objects })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeepSkyCatalog for Stellarium {
    fn name(&self) -> &str {
        "Stellarium"
    }

    fn objects(&self) -> &DeepSkyObjects {
        &self.objects
    }
}
