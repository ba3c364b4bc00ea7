//! Revised New General Catalogue and Index Catalogue (VII/118).
//!
//! `ngc2000.dat` holds one fixed-width record per object, `names.dat` maps
//! common names and Messier numbers onto NGC/IC designations.

use super::{Classification, DeepSkyCatalog, DeepSkyObject, DeepSkyObjects};
use crate::angle::{Angle, RaDec};
use crate::error::{CatalogError, Result};
use crate::record::{field, parse_field, parse_optional, sign_at, text_lines};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CATALOG_FILENAME: &str = "ngc2000.dat";
pub const NAMES_FILENAME: &str = "names.dat";

/// `"I 434"` is IC 434, `" 7000"` is NGC 7000.
fn designation(raw: &str) -> Option<(String, u32)> {
    let raw = raw.trim();
    let (prefix, digits) = match raw.strip_prefix('I') {
        Some(rest) => ("IC", rest.trim()),
        None => ("NGC", raw),
    };
    let number: u32 = digits.parse().ok()?;
    Some((format!("{}{}", prefix, number), number))
}

fn classification(code: &str) -> Classification {
    match code.trim() {
        "Gx" => Classification::Galaxy,
        "OC" => Classification::OpenCluster,
        "Gb" => Classification::GlobularCluster,
        "Nb" => Classification::BrightNebula,
        "Pl" => Classification::PlanetaryNebula,
        "C+N" => Classification::ClusterWithNebulosity,
        "Ast" => Classification::Asterism,
        "Kt" => Classification::Knot,
        "***" => Classification::TripleStar,
        "D*" => Classification::DoubleStar,
        "*" => Classification::SingleStar,
        "?" => Classification::Uncertain,
        "-" => Classification::Nonexistent,
        "PD" => Classification::PlateDefect,
        _ => Classification::Unidentified,
    }
}

/// Parse one `ngc2000.dat` record.
pub fn parse_record(line: &str) -> Result<DeepSkyObject> {
    let (name, number) = designation(field(line, 0, 5))
        .ok_or_else(|| CatalogError::parse(format!("bad designation '{}'", field(line, 0, 5))))?;
    let mut object = DeepSkyObject::new(name);
    object.number = number as u64;
    object.classification = classification(field(line, 6, 3));

    let hours = parse_field::<f64>(line, 10, 2, "RA hours")?
        + parse_field::<f64>(line, 13, 4, "RA minutes")? / 60.0;
    let degrees = parse_field::<f64>(line, 20, 2, "Dec degrees")?
        + parse_field::<f64>(line, 23, 2, "Dec minutes")? / 60.0;
    object.position = RaDec::from_hours_degrees(hours, sign_at(line, 19) * degrees);

    object.constellation = field(line, 29, 3).trim().to_string();
    // the size column gives the largest dimension only
    if let Some(size) = parse_optional::<f64>(line, 33, 5, "size")? {
        let axis = Angle::from_degrees(size / 60.0);
        object.major_axis = Some(axis);
        object.minor_axis = Some(axis);
    }
    object.mag = parse_optional(line, 40, 4, "magnitude")?;
    Ok(object)
}

/// `M 31` in `names.dat` is also reachable as `M31`.
fn messier_alias(common: &str) -> Option<String> {
    let number = common.strip_prefix("M ")?.trim();
    (!number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
        .then(|| format!("M{}", number))
}

fn open_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = File::open(path).map_err(|e| CatalogError::file(path, e))?;
    Ok(text_lines(BufReader::new(file)))
}

pub struct NgcIc {
    directory: PathBuf,
    objects: DeepSkyObjects,
}

impl NgcIc {
    /// Read `ngc2000.dat` and, if present, `names.dat` from `directory`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let catalog = directory.join(CATALOG_FILENAME);
        debug!("reading NGC/IC from {:?}", catalog);

        let mut objects = DeepSkyObjects::default();
        let mut rejected = 0usize;
        for line in open_lines(&catalog)? {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Ok(object) => {
                    objects.insert(object);
                }
                Err(e) => {
                    debug!("record '{}' rejected: {}", field(&line, 0, 5), e);
                    rejected += 1;
                }
            }
        }
        debug!("{} NGC/IC objects, {} rejected", objects.len(), rejected);

        let names = directory.join(NAMES_FILENAME);
        if names.is_file() {
            let mut attached = 0usize;
            for line in open_lines(&names)? {
                let line = line?;
                let common = field(&line, 0, 35).trim();
                let Some((target, _)) = designation(field(&line, 36, 5)) else {
                    continue;
                };
                if common.is_empty() {
                    continue;
                }
                if objects.add_alias(common, &target) {
                    attached += 1;
                }
                if let Some(alias) = messier_alias(common) {
                    objects.add_alias(&alias, &target);
                }
            }
            debug!("{} common names attached", attached);
        } else {
            warn!("no {} in {:?}, common names unavailable", NAMES_FILENAME, directory);
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            objects,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DeepSkyCatalog for NgcIc {
    fn name(&self) -> &str {
        "NGC/IC"
    }

    fn objects(&self) -> &DeepSkyObjects {
        &self.objects
    }
}
