//! SQLite path store (feature `sqlite`).
//!
//! Two tables hold the persisted network:
//!
//! ```text
//! path_geometries      (id INTEGER PRIMARY KEY, lat REAL, lon REAL)
//! path_geometry_orders (path_id, geometry_id, sequence)
//! ```

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use tn_core::{GeoPoint, GeometryId, PathId};

use crate::store::{GeometryNode, PathSequence, PathStore};
use crate::RouteResult;

pub struct SqlitePathStore {
    conn: Connection,
}

impl SqlitePathStore {
    /// Open (or create) the database at `path` and make sure the schema
    /// exists.
    pub fn open(path: &Path) -> RouteResult<Self> {
        let store = Self { conn: Connection::open(path)? };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> RouteResult<Self> {
        let store = Self { conn: Connection::open_in_memory()? };
        store.init_schema()?;
        Ok(store)
    }

    pub fn init_schema(&self) -> RouteResult<()> {
        self.conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS path_geometries (
                 id  INTEGER PRIMARY KEY,
                 lat REAL    NOT NULL,
                 lon REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS path_geometry_orders (
                 path_id     INTEGER NOT NULL,
                 geometry_id INTEGER NOT NULL,
                 sequence    INTEGER NOT NULL,
                 PRIMARY KEY (path_id, sequence)
             );",
        )?;
        Ok(())
    }

    /// Insert or replace one geometry row.
    pub fn insert_geometry(&self, id: GeometryId, pos: GeoPoint) -> RouteResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO path_geometries (id, lat, lon) VALUES (?1, ?2, ?3)",
            rusqlite::params![id.0 as i64, pos.lat, pos.lon],
        )?;
        Ok(())
    }

    /// Insert the geometry and order rows of `sequences` in one transaction.
    /// Geometry rows already present are kept.
    pub fn insert_sequences(&self, sequences: &[PathSequence]) -> RouteResult<()> {
        if sequences.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut geom = tx.prepare_cached(
                "INSERT OR IGNORE INTO path_geometries (id, lat, lon) VALUES (?1, ?2, ?3)",
            )?;
            let mut order = tx.prepare_cached(
                "INSERT OR REPLACE INTO path_geometry_orders (path_id, geometry_id, sequence) \
                 VALUES (?1, ?2, ?3)",
            )?;
            for seq in sequences {
                for (i, node) in seq.nodes.iter().enumerate() {
                    geom.execute(rusqlite::params![node.id.0 as i64, node.pos.lat, node.pos.lon])?;
                    order.execute(rusqlite::params![seq.path.0 as i64, node.id.0 as i64, i as i64])?;
                }
            }
        }
        tx.commit()?;
        log::debug!("sqlite: stored {} path sequences", sequences.len());
        Ok(())
    }

    /// Delete every row of both tables.
    pub fn clear(&self) -> RouteResult<()> {
        self.conn.execute_batch(
            "DELETE FROM path_geometry_orders;
             DELETE FROM path_geometries;",
        )?;
        Ok(())
    }
}

impl PathStore for SqlitePathStore {
    fn contains_geometry(&self, id: GeometryId) -> RouteResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM path_geometries WHERE id = ?1",
                rusqlite::params![id.0 as i64],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn path_sequences(&self) -> RouteResult<Vec<PathSequence>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT o.path_id, o.geometry_id, g.lat, g.lon \
             FROM path_geometry_orders o \
             LEFT JOIN path_geometries g ON g.id = o.geometry_id \
             ORDER BY o.path_id, o.sequence",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        let mut out: Vec<PathSequence> = Vec::new();
        let mut dangling = 0usize;
        for row in rows {
            let (path, geometry, lat, lon) = row?;
            let path = PathId(path as u64);
            let id = GeometryId(geometry as u64);
            let (Some(lat), Some(lon)) = (lat, lon) else {
                log::warn!("sqlite: path {path} references unknown geometry {id}, skipping");
                dangling += 1;
                continue;
            };
            let node = GeometryNode { id, pos: GeoPoint::new(lat, lon) };
            match out.last_mut() {
                Some(seq) if seq.path == path => seq.nodes.push(node),
                _ => out.push(PathSequence { path, nodes: vec![node] }),
            }
        }
        if dangling > 0 {
            log::warn!("sqlite: {dangling} order rows without geometry");
        }
        Ok(out)
    }
}
