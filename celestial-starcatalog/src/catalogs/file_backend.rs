//! Combined view over the flat-file catalogs.
//!
//! Expects the layout
//!
//! ```text
//! basedir/bsc/{catalog,notes}
//! basedir/hipparcos/hip_main.dat
//! basedir/sao/sao.dat
//! basedir/tycho2/tyc2.dat
//! basedir/u4/{u4b/z001..z900,u4i/u4index.asc}
//! ```
//!
//! Window queries and full scans draw each magnitude slice from one catalog
//! only, switching at the [`CutoverMagnitudes`], so a star present in several
//! catalogs is reported once. SAO takes part in name lookup only.

use super::cutover::{CutoverCondition, CutoverMagnitudes};
use super::{Bsc, Hipparcos, Sao, Tycho2, Ucac4};
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, CursorPosition, StarCursor};
use crate::star::{Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileBackend {
    basedir: PathBuf,
    cutover: CutoverMagnitudes,
    bsc: Bsc,
    hipparcos: Hipparcos,
    sao: Sao,
    tycho2: Tycho2,
    ucac4: Ucac4,
}

impl FileBackend {
    pub fn open(basedir: impl AsRef<Path>) -> Result<Self> {
        Self::with_cutover(basedir, CutoverMagnitudes::default())
    }

    pub fn with_cutover(basedir: impl AsRef<Path>, cutover: CutoverMagnitudes) -> Result<Self> {
        let basedir = basedir.as_ref().to_path_buf();
        debug!("opening catalogs in {:?}", basedir);
        let backend = Self {
            bsc: Bsc::open(basedir.join("bsc"))?,
            hipparcos: Hipparcos::open(basedir.join("hipparcos"))?,
            sao: Sao::open(basedir.join("sao"))?,
            tycho2: Tycho2::open(basedir.join("tycho2"))?,
            ucac4: Ucac4::open(basedir.join("u4"))?,
            basedir,
            cutover,
        };
        Ok(backend)
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn cutover(&self) -> &CutoverMagnitudes {
        &self.cutover
    }

    pub fn bsc(&self) -> &Bsc {
        &self.bsc
    }

    pub fn hipparcos(&self) -> &Hipparcos {
        &self.hipparcos
    }

    pub fn sao(&self) -> &Sao {
        &self.sao
    }

    pub fn tycho2(&self) -> &Tycho2 {
        &self.tycho2
    }

    pub fn ucac4(&self) -> &Ucac4 {
        &self.ucac4
    }

    fn merge(result: &mut StarSet, stars: StarSet, mut condition: CutoverCondition) {
        result.extend(stars.into_iter().filter(|star| condition.accepts(star)));
        condition.log_stats();
    }
}

impl Catalog for FileBackend {
    fn name(&self) -> &str {
        "FileBackend"
    }

    fn find(&self, name: &str) -> Result<Star> {
        if name.starts_with("BSC") {
            self.bsc.find(name)
        } else if name.starts_with("HIP") {
            self.hipparcos.find(name)
        } else if name.starts_with("SAO") {
            self.sao.find(name)
        } else if name.starts_with("UCAC4") {
            self.ucac4.find(name)
        } else if name.starts_with('T') {
            self.tycho2.find(name)
        } else {
            Err(CatalogError::not_found(format!("unknown name '{}'", name)))
        }
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let cutover = &self.cutover;
        let mut result = StarSet::new();

        if magrange.brightest() <= cutover.bsc {
            let slice = MagnitudeRange::new(
                magrange.brightest(),
                magrange.faintest().min(cutover.bsc),
            );
            let stars = self.bsc.find_window(window, &slice)?;
            Self::merge(&mut result, stars, CutoverCondition::bsc(cutover));
        }

        if magrange.brightest() <= cutover.hipparcos {
            let stars = self.hipparcos.find_window(window, magrange)?;
            Self::merge(&mut result, stars, CutoverCondition::hipparcos(cutover));
        }
        if magrange.faintest() < cutover.hipparcos {
            debug!("{} stars, Hipparcos complete", result.len());
            return Ok(result);
        }

        let stars = self.tycho2.find_window(window, magrange)?;
        Self::merge(&mut result, stars, CutoverCondition::tycho2(cutover));
        if magrange.faintest() < cutover.tycho2 {
            debug!("{} stars, Tycho-2 complete", result.len());
            return Ok(result);
        }

        let stars = self.ucac4.find_window(window, magrange)?;
        Self::merge(&mut result, stars, CutoverCondition::ucac4(cutover));
        debug!("{} stars in {} {}", result.len(), window, magrange);
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        Ok(self.bsc.number_of_stars()?
            + self.hipparcos.number_of_stars()?
            + self.sao.number_of_stars()?
            + self.tycho2.number_of_stars()?
            + self.ucac4.number_of_stars()?)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        Ok(CatalogIterator::new(FileBackendCursor::new(self)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Bsc,
    Hipparcos,
    Tycho2,
    Ucac4,
    End,
}

impl Stage {
    fn next(self) -> Self {
        match self {
            Stage::Bsc => Stage::Hipparcos,
            Stage::Hipparcos => Stage::Tycho2,
            Stage::Tycho2 => Stage::Ucac4,
            Stage::Ucac4 | Stage::End => Stage::End,
        }
    }
}

/// Full scan of the combined view: BSC, then Hipparcos, Tycho-2 and UCAC4,
/// each through its cutover condition.
pub struct FileBackendCursor<'a> {
    backend: &'a FileBackend,
    stage: Stage,
    inner: CatalogIterator<'a>,
    condition: CutoverCondition,
    current: Option<Star>,
}

impl<'a> FileBackendCursor<'a> {
    fn new(backend: &'a FileBackend) -> Self {
        let mut cursor = Self {
            backend,
            stage: Stage::Bsc,
            inner: CatalogIterator::end(),
            condition: CutoverCondition::bsc(&backend.cutover),
            current: None,
        };
        cursor.enter(Stage::Bsc);
        cursor.seek();
        cursor
    }

    /// Switch to `stage` with a fresh inner iterator and condition. A
    /// catalog that cannot be iterated is skipped.
    fn enter(&mut self, mut stage: Stage) {
        let backend = self.backend;
        let cutover = &backend.cutover;
        loop {
            let (inner, condition) = match stage {
                Stage::Bsc => (backend.bsc.begin(), CutoverCondition::bsc(cutover)),
                Stage::Hipparcos => {
                    (backend.hipparcos.begin(), CutoverCondition::hipparcos(cutover))
                }
                Stage::Tycho2 => (backend.tycho2.begin(), CutoverCondition::tycho2(cutover)),
                Stage::Ucac4 => (backend.ucac4.begin(), CutoverCondition::ucac4(cutover)),
                Stage::End => {
                    self.stage = Stage::End;
                    self.inner = CatalogIterator::end();
                    return;
                }
            };
            match inner {
                Ok(inner) => {
                    self.stage = stage;
                    self.inner = inner;
                    self.condition = condition;
                    return;
                }
                Err(e) => {
                    warn!("cannot iterate {:?} catalog, skipping: {}", stage, e);
                    stage = stage.next();
                }
            }
        }
    }

    fn seek(&mut self) {
        self.current = None;
        while self.stage != Stage::End {
            while !self.inner.at_end() {
                match self.inner.get() {
                    Ok(star) if self.condition.accepts(&star) => {
                        self.current = Some(star);
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("skipping {}: {}", self.inner, e),
                }
                self.inner.advance();
            }
            self.condition.log_stats();
            self.enter(self.stage.next());
        }
    }

    fn stage_index(&self) -> u8 {
        match self.stage {
            Stage::Bsc => 0,
            Stage::Hipparcos => 1,
            Stage::Tycho2 => 2,
            Stage::Ucac4 => 3,
            Stage::End => 4,
        }
    }
}

impl StarCursor for FileBackendCursor<'_> {
    fn kind(&self) -> &'static str {
        "filebackend"
    }

    fn at_end(&self) -> bool {
        self.stage == Stage::End
    }

    fn current(&self) -> Result<Star> {
        if self.stage == Stage::End {
            return Err(CatalogError::Logic("dereferencing end iterator".into()));
        }
        self.current
            .clone()
            .ok_or_else(|| CatalogError::Logic("iterator has no current star".into()))
    }

    fn advance(&mut self) {
        if self.stage != Stage::End {
            self.inner.advance();
            self.seek();
        }
    }

    fn position(&self) -> CursorPosition {
        if self.stage == Stage::End {
            return CursorPosition::End;
        }
        CursorPosition::Stage {
            stage: self.stage_index(),
            inner: Box::new(self.inner.position()),
        }
    }

    fn describe(&self) -> String {
        format!("filebackend {:?} {}", self.stage, self.inner)
    }
}
