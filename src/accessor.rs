//! The accessor: one open connection and CRUD helpers built from text.

use crate::config::SqliteConfig;
use crate::error::Result;
use crate::sql;
use crate::value::Value;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Rows fetched by a statement, plus the change count for DML.
///
/// Stands in for a cursor: every row is read eagerly so the connection is
/// free again by the time the caller sees the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by an insert/update/delete; 0 for queries
    pub changes: usize,
}

impl ResultSet {
    pub fn fetch_all(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn fetch_one(&self) -> Option<&[Value]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Wraps a single SQLite connection for the lifetime of the value.
///
/// Writes are left uncommitted until [`DbAccessor::commit`]; dropping the
/// accessor with pending work discards it.
pub struct DbAccessor {
    conn: Connection,
}

impl DbAccessor {
    /// Open the database at `path`. The empty path gives a private transient database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening sqlite database");
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        info!("opening in-memory sqlite database");
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        let accessor = Self::open(&config.db_path)?;
        config.apply(&accessor.conn)?;
        Ok(accessor)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn commit(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            debug!("commit");
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            debug!("rollback");
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Whether uncommitted work is pending on the connection.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Run arbitrary statement text. Text holding no statement yields an empty result.
    pub fn execute(&self, query: &str) -> Result<ResultSet> {
        debug!(sql = query, "execute");
        if sql::is_blank(query) {
            return Ok(ResultSet::default());
        }

        let mut stmt = self.conn.prepare(query)?;
        if sql::opens_transaction(query) && self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        if stmt.column_count() == 0 {
            let changes = stmt.execute([])?;
            return Ok(ResultSet {
                changes,
                ..ResultSet::default()
            });
        }

        let columns = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ResultSet {
            columns,
            rows,
            changes: 0,
        })
    }

    /// `select <columns> from <table> where <conditions>`; empty `columns` selects all.
    pub fn select(
        &self,
        table: &str,
        columns: &[&str],
        conditions: Option<&str>,
    ) -> Result<ResultSet> {
        self.execute(&sql::select_statement(table, columns, conditions))
    }

    pub fn insert(&self, table: &str, values: &[Value]) -> Result<ResultSet> {
        self.execute(&sql::insert_statement(table, values))
    }

    /// Fails with [`crate::Error::LengthMismatch`] before touching the
    /// database when `columns` and `values` differ in length.
    pub fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        conditions: Option<&str>,
    ) -> Result<ResultSet> {
        let statement = sql::update_statement(table, columns, values, conditions)?;
        self.execute(&statement)
    }

    /// Without conditions every row goes.
    pub fn delete(&self, table: &str, conditions: Option<&str>) -> Result<ResultSet> {
        self.execute(&sql::delete_statement(table, conditions))
    }

    /// Column names of `table` in declaration order.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        table_columns(&self.conn, table)
    }
}

pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
