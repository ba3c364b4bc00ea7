//! Star catalog stored in SQLite.
//!
//! One table holds the merged catalog as written by [`DatabaseBackendCreator`]
//! (usually from a [`FileBackend`](super::FileBackend) scan). RA is stored in
//! hours and declination in degrees, proper motions in hours and degrees per
//! year. Window queries run against the `(dec, ra)` index.
//!
//! The window query compares RA against the unreduced window edges, so a
//! window crossing 0h only returns the part on the side of its center.

use crate::angle::{Angle, RaDec};
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::iterator::{CatalogIterator, CursorPosition, StarCursor};
use crate::star::{Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CREATE_TABLE: &str = "create table if not exists star (
    id integer not null,
    ra double not null,
    dec double not null,
    pmra double not null,
    pmdec double not null,
    mag double not null,
    catalog char(1) not null,
    catalognumber integer not null,
    name varchar(16) not null,
    longname varchar(16) not null,
    primary key(id))";

const COLUMNS: &str = "id, ra, dec, pmra, pmdec, mag, catalog, catalognumber, name, longname";

const INSERT: &str = "insert into star (id, ra, dec, pmra, pmdec, mag, catalog, \
                      catalognumber, name, longname) \
                      values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

/// Rows fetched per round trip by the full-scan cursor.
const SCAN_BATCH: usize = 1024;

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(CREATE_TABLE)?;
    debug!("star table ready in {:?}", path);
    Ok(conn)
}

fn star_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Star)> {
    let id: i64 = row.get(0)?;
    let catalog: String = row.get(6)?;
    let catalognumber: i64 = row.get(7)?;
    let mut star = Star::new(
        catalog.chars().next().unwrap_or('?'),
        catalognumber as u64,
        row.get::<_, String>(8)?,
    );
    star.longname = row.get(9)?;
    star.position = RaDec::new(
        Angle::from_hours(row.get(1)?),
        Angle::from_degrees(row.get(2)?),
    );
    star.pm = RaDec::new(
        Angle::from_hours(row.get(3)?),
        Angle::from_degrees(row.get(4)?),
    );
    star.mag = row.get::<_, f64>(5)? as f32;
    Ok((id, star))
}

/// Catalog letter implied by the prefix of a star name.
pub fn catalog_of(name: &str) -> Result<char> {
    let catalog = if name.starts_with("BSC") {
        'B'
    } else if name.starts_with("HIP") {
        'H'
    } else if name.starts_with("SAO") {
        'S'
    } else if name.starts_with("UCAC4") {
        'U'
    } else if name.starts_with('T') {
        'T'
    } else {
        return Err(CatalogError::not_found(format!("unknown name '{}'", name)));
    };
    Ok(catalog)
}

pub struct DatabaseBackend {
    path: PathBuf,
    conn: Connection,
}

impl DatabaseBackend {
    /// Open the database, creating the star table if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            path: path.to_path_buf(),
            conn: open_connection(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Catalog for DatabaseBackend {
    fn name(&self) -> &str {
        "Database"
    }

    fn find(&self, name: &str) -> Result<Star> {
        let catalog = catalog_of(name)?;
        let mut stmt = self.conn.prepare_cached(&format!(
            "select {} from star where catalog = ?1 and name = ?2",
            COLUMNS
        ))?;
        stmt.query_row(params![catalog.to_string(), name], star_from_row)
            .optional()?
            .map(|(_, star)| star)
            .ok_or_else(|| CatalogError::not_found(name))
    }

    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet> {
        let half_width = window.rawidth() * 0.5;
        let ramin = (window.center().ra - half_width).hours();
        let ramax = (window.center().ra + half_width).hours();
        let (bottom, top) = window.decinterval();
        debug!(
            "window query: mag [{}, {}], ra [{:.4}, {:.4}] h, dec [{:.4}, {:.4}] deg",
            magrange.brightest(),
            magrange.faintest(),
            ramin,
            ramax,
            bottom.degrees(),
            top.degrees()
        );

        let mut stmt = self.conn.prepare_cached(&format!(
            "select {} from star \
             where mag <= ?1 and mag >= ?2 \
               and ?3 <= ra and ra <= ?4 \
               and ?5 <= dec and dec <= ?6",
            COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![
                magrange.faintest() as f64,
                magrange.brightest() as f64,
                ramin,
                ramax,
                bottom.degrees(),
                top.degrees()
            ],
            star_from_row,
        )?;
        let mut result = StarSet::new();
        for row in rows {
            let (_, star) = row?;
            if window.contains(&star.position) {
                result.insert(star);
            }
        }
        debug!("{} stars from database", result.len());
        Ok(result)
    }

    fn number_of_stars(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from star", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn begin(&self) -> Result<CatalogIterator<'_>> {
        let mut cursor = DatabaseCursor {
            conn: &self.conn,
            batch: VecDeque::new(),
            last_id: i64::MIN,
            exhausted: false,
            current: None,
        };
        cursor.fetch()?;
        cursor.current = cursor.batch.pop_front();
        Ok(CatalogIterator::new(cursor))
    }
}

/// Keyset-paginated scan in id order.
struct DatabaseCursor<'a> {
    conn: &'a Connection,
    batch: VecDeque<(i64, Star)>,
    last_id: i64,
    exhausted: bool,
    current: Option<(i64, Star)>,
}

impl DatabaseCursor<'_> {
    fn fetch(&mut self) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "select {} from star where id > ?1 order by id limit ?2",
            COLUMNS
        ))?;
        let rows = stmt.query_map(params![self.last_id, SCAN_BATCH as i64], star_from_row)?;
        for row in rows {
            let (id, star) = row?;
            self.last_id = id;
            self.batch.push_back((id, star));
        }
        if self.batch.len() < SCAN_BATCH {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl StarCursor for DatabaseCursor<'_> {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn at_end(&self) -> bool {
        self.current.is_none()
    }

    fn current(&self) -> Result<Star> {
        self.current
            .as_ref()
            .map(|(_, star)| star.clone())
            .ok_or_else(|| CatalogError::Range("database iterator past end".into()))
    }

    fn advance(&mut self) {
        if self.current.is_none() {
            return;
        }
        if self.batch.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch() {
                warn!("database scan stopped after id {}: {}", self.last_id, e);
                self.exhausted = true;
            }
        }
        self.current = self.batch.pop_front();
    }

    fn position(&self) -> CursorPosition {
        match &self.current {
            Some((id, _)) => CursorPosition::Key(*id as u64),
            None => CursorPosition::End,
        }
    }
}

/// Writes stars into the database.
///
/// Inserts between [`prepare`](Self::prepare) and
/// [`finalize`](Self::finalize) share one transaction and one cached
/// statement; a lone [`add`](Self::add) runs in its own transaction.
pub struct DatabaseBackendCreator {
    conn: Connection,
    next_id: i64,
    in_transaction: bool,
}

impl DatabaseBackendCreator {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_connection(path.as_ref())?;
        let next_id: i64 =
            conn.query_row("select coalesce(max(id), 0) + 1 from star", [], |row| row.get(0))?;
        debug!("next star id {}", next_id);
        Ok(Self {
            conn,
            next_id,
            in_transaction: false,
        })
    }

    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Start a bulk insert.
    pub fn prepare(&mut self) -> Result<()> {
        if self.in_transaction {
            debug!("statement already prepared");
            return Ok(());
        }
        self.conn.execute_batch("begin")?;
        self.conn.prepare_cached(INSERT)?;
        self.in_transaction = true;
        debug!("insert statement prepared");
        Ok(())
    }

    pub fn add(&mut self, star: &Star) -> Result<()> {
        let standalone = !self.in_transaction;
        if standalone {
            self.prepare()?;
        }
        let inserted = self.conn.prepare_cached(INSERT).and_then(|mut stmt| {
            stmt.execute(params![
                self.next_id,
                star.ra().hours(),
                star.dec().degrees(),
                star.pm.ra.hours(),
                star.pm.dec.degrees(),
                star.mag as f64,
                star.catalog.to_string(),
                star.catalognumber as i64,
                star.name,
                star.longname,
            ])
        });
        if let Err(e) = inserted {
            if standalone {
                self.rollback();
            }
            return Err(e.into());
        }
        self.next_id += 1;
        if standalone {
            self.finalize()?;
        }
        Ok(())
    }

    /// Commit the bulk insert.
    pub fn finalize(&mut self) -> Result<()> {
        if !self.in_transaction {
            debug!("no statement to finalize");
            return Ok(());
        }
        self.conn.execute_batch("commit")?;
        self.in_transaction = false;
        debug!("insert transaction committed, next id {}", self.next_id);
        Ok(())
    }

    fn rollback(&mut self) {
        if let Err(e) = self.conn.execute_batch("rollback") {
            warn!("rollback failed: {}", e);
        }
        self.in_transaction = false;
    }

    /// Remove all stars and the position index.
    pub fn clear(&mut self) -> Result<()> {
        debug!("clearing database");
        self.conn
            .execute_batch("delete from star; drop index if exists staridx1;")?;
        self.next_id = 1;
        Ok(())
    }

    pub fn create_index(&self) -> Result<()> {
        debug!("creating index staridx1");
        self.conn
            .execute_batch("create index if not exists staridx1 on star (dec, ra)")?;
        Ok(())
    }
}

impl Drop for DatabaseBackendCreator {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("uncommitted stars discarded");
        }
    }
}
