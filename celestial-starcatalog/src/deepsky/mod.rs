//! Deep-sky object catalogs: NGC/IC, PGC and Stellarium.
//!
//! All three are small enough to parse completely at open. Each object is
//! stored under its primary name; alternate designations (Messier numbers,
//! cross-identifications) resolve to the same object through an alias table.
//! [`PgcDatabase`] keeps PGC in SQLite for callers that cannot afford the
//! in-memory tables.

pub mod ngcic;
pub mod pgc;
pub mod pgc_database;
pub mod stellarium;

pub use ngcic::NgcIc;
pub use pgc::Pgc;
pub use pgc_database::PgcDatabase;
pub use stellarium::Stellarium;

use crate::angle::{Angle, RaDec};
use crate::error::{CatalogError, Result};
use crate::window::SkyWindow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Morphological class of a deep-sky object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    Galaxy,
    OpenCluster,
    GlobularCluster,
    BrightNebula,
    PlanetaryNebula,
    ClusterWithNebulosity,
    Asterism,
    Knot,
    TripleStar,
    DoubleStar,
    SingleStar,
    Uncertain,
    #[default]
    Unidentified,
    Nonexistent,
    PlateDefect,
    MultipleSystem,
    GalaxyInMultipleSystem,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Galaxy => "galaxy",
            Self::OpenCluster => "open cluster",
            Self::GlobularCluster => "globular cluster",
            Self::BrightNebula => "bright nebula",
            Self::PlanetaryNebula => "planetary nebula",
            Self::ClusterWithNebulosity => "cluster with nebulosity",
            Self::Asterism => "asterism",
            Self::Knot => "knot",
            Self::TripleStar => "triple star",
            Self::DoubleStar => "double star",
            Self::SingleStar => "single star",
            Self::Uncertain => "uncertain",
            Self::Unidentified => "unidentified",
            Self::Nonexistent => "nonexistent",
            Self::PlateDefect => "plate defect",
            Self::MultipleSystem => "multiple system",
            Self::GalaxyInMultipleSystem => "galaxy in multiple system",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepSkyObject {
    pub name: String,
    /// Number within the source catalog, 0 where the source has none.
    pub number: u64,
    pub position: RaDec,
    pub mag: Option<f32>,
    pub major_axis: Option<Angle>,
    pub minor_axis: Option<Angle>,
    pub position_angle: Option<Angle>,
    pub classification: Classification,
    /// Three-letter IAU code, empty when the source does not give one.
    pub constellation: String,
    /// Alternate designations, not including `name`.
    pub names: BTreeSet<String>,
}

impl DeepSkyObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() && name != self.name {
            self.names.insert(name);
        }
    }
}

impl PartialEq for DeepSkyObject {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DeepSkyObject {}

impl PartialOrd for DeepSkyObject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeepSkyObject {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for DeepSkyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.classification, self.position)
    }
}

/// Result set of a deep-sky window query, ordered by name.
pub type DeepSkyObjectSet = BTreeSet<DeepSkyObject>;

/// Objects by primary name plus the alias table.
#[derive(Debug, Default)]
pub struct DeepSkyObjects {
    objects: BTreeMap<String, DeepSkyObject>,
    aliases: BTreeMap<String, String>,
}

impl DeepSkyObjects {
    /// Add an object and register its alternate names. A repeated primary
    /// name keeps the first object.
    pub fn insert(&mut self, object: DeepSkyObject) -> bool {
        match self.objects.entry(object.name.clone()) {
            Entry::Occupied(_) => {
                debug!("duplicate object {} ignored", object.name);
                false
            }
            Entry::Vacant(slot) => {
                for alias in &object.names {
                    self.aliases
                        .entry(alias.clone())
                        .or_insert_with(|| object.name.clone());
                }
                slot.insert(object);
                true
            }
        }
    }

    /// Attach an alternate name to an object already present.
    pub fn add_alias(&mut self, alias: &str, name: &str) -> bool {
        match self.objects.get_mut(name) {
            Some(object) => {
                object.add_name(alias);
                self.aliases
                    .entry(alias.to_string())
                    .or_insert_with(|| name.to_string());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DeepSkyObject> {
        self.objects.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|primary| self.objects.get(primary))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeepSkyObject> {
        self.objects.values()
    }

    /// Names (primary or alternate) starting with `prefix`, at most `max`.
    pub fn names_like(&self, prefix: &str, max: usize) -> BTreeSet<String> {
        let mut result = keys_with_prefix(&self.objects, prefix, max);
        result.extend(keys_with_prefix(&self.aliases, prefix, max));
        while result.len() > max {
            result.pop_last();
        }
        result
    }
}

fn keys_with_prefix<V>(map: &BTreeMap<String, V>, prefix: &str, max: usize) -> BTreeSet<String> {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .map(|(name, _)| name)
        .take_while(|name| name.starts_with(prefix))
        .take(max)
        .cloned()
        .collect()
}

/// Query surface shared by the deep-sky catalogs.
pub trait DeepSkyCatalog {
    fn name(&self) -> &str;

    fn objects(&self) -> &DeepSkyObjects;

    /// Look an object up by primary or alternate name.
    fn find(&self, name: &str) -> Result<DeepSkyObject> {
        self.objects()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CatalogError::not_found(format!("object {} not in {}", name, self.name()))
            })
    }

    fn find_window(&self, window: &SkyWindow) -> DeepSkyObjectSet {
        let result: DeepSkyObjectSet = self
            .objects()
            .iter()
            .filter(|o| window.contains(&o.position))
            .cloned()
            .collect();
        debug!("{}: {} objects in {}", self.name(), result.len(), window);
        result
    }

    /// Up to `max` names beginning with `prefix`, in name order.
    fn find_like(&self, prefix: &str, max: usize) -> BTreeSet<String> {
        self.objects().names_like(prefix, max)
    }

    fn len(&self) -> usize {
        self.objects().len()
    }

    fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepSkyCatalogKind {
    NgcIc,
    Pgc,
    Stellarium,
}

impl DeepSkyCatalogKind {
    /// Subdirectory of the deep-sky base directory holding the catalog.
    pub fn directory(self) -> &'static str {
        match self {
            Self::NgcIc => "ngcic",
            Self::Pgc => "pgc",
            Self::Stellarium => "stellarium",
        }
    }

    pub fn open(self, basedir: &Path) -> Result<Box<dyn DeepSkyCatalog>> {
        let dir = basedir.join(self.directory());
        Ok(match self {
            Self::NgcIc => Box::new(NgcIc::open(dir)?),
            Self::Pgc => Box::new(Pgc::open(dir)?),
            Self::Stellarium => Box::new(Stellarium::open(dir)?),
        })
    }
}

/// Deep-sky catalogs loaded on first request and kept for the cache's
/// lifetime.
pub struct DeepSkyCatalogCache {
    basedir: PathBuf,
    catalogs: HashMap<DeepSkyCatalogKind, Box<dyn DeepSkyCatalog>>,
}

impl DeepSkyCatalogCache {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            catalogs: HashMap::new(),
        }
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn is_loaded(&self, kind: DeepSkyCatalogKind) -> bool {
        self.catalogs.contains_key(&kind)
    }

    /// The catalog of `kind`, loading it if this is the first request.
    ///
    /// A failed load is not cached; the next request tries again.
    pub fn get(&mut self, kind: DeepSkyCatalogKind) -> Result<&dyn DeepSkyCatalog> {
        use std::collections::hash_map::Entry;
        let catalog = match self.catalogs.entry(kind) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                info!("loading {:?} catalog from {:?}", kind, self.basedir);
                e.insert(kind.open(&self.basedir)?)
            }
        };
        Ok(&**catalog)
    }
}
