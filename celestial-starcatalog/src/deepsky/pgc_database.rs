//! PGC galaxies stored in SQLite.
//!
//! Every object occupies one row under its PGC designation plus one row per
//! alternate name, all sharing the PGC number as `id`. A row is a primary
//! row when `name = pgcname`. RA is stored in hours, declination, axes and
//! position angle in degrees.

use super::pgc::{classification, type_code};
use super::{DeepSkyCatalog, DeepSkyObject, DeepSkyObjectSet};
use crate::angle::{Angle, RaDec};
use crate::error::{CatalogError, Result};
use crate::window::SkyWindow;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE: &str = "create table if not exists pgc (
    id integer not null,
    name varchar(32) not null,
    pgcname char(10) not null,
    ra double not null,
    dec double not null,
    major double,
    minor double,
    pa double,
    type char(2) not null,
    primary key(name));
create index if not exists pgcidx1 on pgc (dec, ra);";

const COLUMNS: &str = "id, pgcname, ra, dec, major, minor, pa, type";

const INSERT: &str = "insert into pgc (id, name, pgcname, ra, dec, major, minor, pa, type) \
                      values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

/// Alternate names already taken by another object are skipped.
const INSERT_ALIAS: &str = "insert or ignore into pgc \
                            (id, name, pgcname, ra, dec, major, minor, pa, type) \
                            values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

fn object_from_row(row: &Row<'_>) -> rusqlite::Result<DeepSkyObject> {
    let mut object = DeepSkyObject::new(row.get::<_, String>(1)?);
    object.number = row.get::<_, i64>(0)? as u64;
    object.position = RaDec::new(
        Angle::from_hours(row.get(2)?),
        Angle::from_degrees(row.get(3)?),
    );
    object.major_axis = row.get::<_, Option<f64>>(4)?.map(Angle::from_degrees);
    object.minor_axis = row.get::<_, Option<f64>>(5)?.map(Angle::from_degrees);
    object.position_angle = row.get::<_, Option<f64>>(6)?.map(Angle::from_degrees);
    object.classification = classification(&row.get::<_, String>(7)?);
    Ok(object)
}

fn insert(conn: &Connection, object: &DeepSkyObject) -> Result<()> {
    let id = object.number as i64;
    let ra = object.position.ra.hours();
    let dec = object.position.dec.degrees();
    let major = object.major_axis.map(Angle::degrees);
    let minor = object.minor_axis.map(Angle::degrees);
    let pa = object.position_angle.map(Angle::degrees);
    let code = type_code(object.classification);

    conn.prepare_cached(INSERT)?.execute(params![
        id,
        object.name,
        object.name,
        ra,
        dec,
        major,
        minor,
        pa,
        code
    ])?;
    let mut alias = conn.prepare_cached(INSERT_ALIAS)?;
    for name in &object.names {
        let inserted =
            alias.execute(params![id, name, object.name, ra, dec, major, minor, pa, code])?;
        if inserted == 0 {
            debug!("{}: name '{}' already in use", object.name, name);
        }
    }
    Ok(())
}

pub struct PgcDatabase {
    path: PathBuf,
    conn: Connection,
}

impl PgcDatabase {
    /// Open the database, creating the pgc table if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TABLE)?;
        debug!("pgc table ready in {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store one object with its alternate names.
    pub fn add(&mut self, object: &DeepSkyObject) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert(&tx, object)?;
        tx.commit()?;
        Ok(())
    }

    /// Store every object of `catalog` in one transaction.
    pub fn load(&mut self, catalog: &dyn DeepSkyCatalog) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0usize;
        for object in catalog.objects().iter() {
            insert(&tx, object)?;
            count += 1;
        }
        tx.commit()?;
        info!("{} objects from {} stored in {:?}", count, catalog.name(), self.path);
        Ok(count)
    }

    fn attach_names(&self, object: &mut DeepSkyObject) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "select name from pgc where id = ?1 and name != pgcname order by name",
        )?;
        let names = stmt.query_map(params![object.number as i64], |row| row.get::<_, String>(0))?;
        for name in names {
            object.add_name(name?);
        }
        Ok(())
    }

    /// Look an object up by its PGC designation or any alternate name.
    pub fn find(&self, name: &str) -> Result<DeepSkyObject> {
        let mut stmt = self.conn.prepare_cached(
            "select a.id, a.pgcname, a.ra, a.dec, a.major, a.minor, a.pa, a.type \
             from pgc a, pgc b \
             where b.name = ?1 and a.id = b.id and a.name = a.pgcname",
        )?;
        let mut object = stmt
            .query_row(params![name], object_from_row)
            .optional()?
            .ok_or_else(|| CatalogError::not_found(format!("object {} not in PGC", name)))?;
        self.attach_names(&mut object)?;
        Ok(object)
    }

    pub fn find_window(&self, window: &SkyWindow) -> Result<DeepSkyObjectSet> {
        let (left, right) = if window.covers_all_ra() {
            (0.0, 24.0)
        } else {
            (window.leftra().hours(), window.rightra().hours())
        };
        debug!(
            "pgc window query: ra [{:.4}, {:.4}] h, dec [{:.4}, {:.4}] deg",
            left,
            right,
            window.bottomdec().degrees(),
            window.topdec().degrees()
        );
        let mut stmt = self.conn.prepare_cached(&format!(
            "select {} from pgc \
             where name = pgcname \
               and ?1 <= dec and dec <= ?2 \
               and ((?3 <= ra and ra <= ?4) or (?3 > ?4 and (ra <= ?4 or ?3 <= ra)))",
            COLUMNS
        ))?;
        let candidates = stmt
            .query_map(
                params![
                    window.bottomdec().degrees(),
                    window.topdec().degrees(),
                    left,
                    right
                ],
                object_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut result = DeepSkyObjectSet::new();
        for mut object in candidates {
            if window.contains(&object.position) {
                self.attach_names(&mut object)?;
                result.insert(object);
            }
        }
        debug!("{} objects from PGC database", result.len());
        Ok(result)
    }

    /// Up to `max` names matching `pattern`, in name order.
    ///
    /// `pattern` is an SQL `like` pattern (case-insensitive); without a `%`
    /// it is taken as a prefix.
    pub fn find_like(&self, pattern: &str, max: usize) -> Result<BTreeSet<String>> {
        let pattern = if pattern.contains('%') {
            pattern.to_string()
        } else {
            format!("{}%", pattern)
        };
        let mut stmt = self
            .conn
            .prepare_cached("select name from pgc where name like ?1 order by name limit ?2")?;
        let names = stmt.query_map(params![pattern, max as i64], |row| row.get::<_, String>(0))?;
        Ok(names.collect::<rusqlite::Result<_>>()?)
    }

    /// Number of objects, not counting alternate names.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "select count(*) from pgc where name = pgcname",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
