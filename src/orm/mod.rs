//! A small declarative model layer over the same SQLite database.
//!
//! Tables are described by [`Model`] implementations, rows are plain structs,
//! and [`Database::atomic`] scopes work in a transaction (or a savepoint when
//! nested).

pub mod flesh;
pub mod model;
pub mod query;
pub mod schema;

pub use flesh::Flesh;
pub use model::Model;
pub use query::{Column, DeleteQuery, Expr, QueryOperator, SelectQuery, UpdateQuery};
pub use schema::Schema;

use crate::accessor::table_columns;
use crate::config::SqliteConfig;
use crate::error::{Error, Result};
use crate::value::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::cell::Cell;
use std::ops::Deref;
use std::path::Path;
use tracing::{debug, info, warn};

/// Connection wrapper for model operations; autocommits outside [`Database::atomic`].
pub struct Database {
    conn: Connection,
    depth: Cell<usize>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening model database");
        Ok(Self::wrap(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        info!("opening in-memory model database");
        Ok(Self::wrap(Connection::open_in_memory()?))
    }

    /// Open the configured path and create every table in the config's schema.
    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        let db = Self::open(&config.db_path)?;
        config.apply(&db.conn)?;
        db.create_tables(&config.schema)?;
        Ok(db)
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn,
            depth: Cell::new(0),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_tables(&self, schema: &Schema) -> Result<()> {
        for table in &schema.tables {
            for statement in table.create_sql() {
                debug!(sql = %statement, "create");
                self.conn.execute_batch(&statement)?;
            }
        }
        Ok(())
    }

    pub fn create_table<M: Model>(&self) -> Result<()> {
        self.create_tables(&Schema::new().add_table(M::table()))
    }

    pub fn drop_table<M: Model>(&self) -> Result<()> {
        let statement = M::table().drop_sql();
        debug!(sql = %statement, "drop");
        self.conn.execute_batch(&statement)?;
        Ok(())
    }

    /// Insert `model` and record its new id.
    ///
    /// A UNIQUE or PRIMARY KEY clash is reported as [`Error::InvalidArgument`].
    pub fn create<M: Model>(&self, model: &mut M) -> Result<()> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        if let Some(id) = model.id() {
            columns.push(M::PRIMARY_KEY);
            values.push(Value::Integer(id));
        }
        for (column, value) in model.values() {
            columns.push(column);
            values.push(value);
        }

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            M::TABLE,
            columns
                .iter()
                .map(|c| format!("\"{c}\""))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; values.len()].join(", ")
        );
        debug!(sql = %sql, "create");

        match self.conn.execute(&sql, params_from_iter(values.iter())) {
            Ok(_) => {
                model.set_id(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(err) => {
                let err = Error::from(err);
                if err.is_unique_violation() {
                    Err(Error::InvalidArgument(format!(
                        "{} row already exists: {err}",
                        M::TABLE
                    )))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Write the non-identity columns back; creates the row when it has no id yet.
    pub fn save<M: Model>(&self, model: &mut M) -> Result<usize> {
        let Some(id) = model.id() else {
            self.create(model)?;
            return Ok(1);
        };
        let mut query = UpdateQuery::<M>::new(self).filter(Column::new(M::PRIMARY_KEY).eq(id));
        for (column, value) in model.values() {
            query = query.set(Column::new(column), value);
        }
        query.execute()
    }

    pub fn get<M: Model>(&self, id: i64) -> Result<M> {
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE \"{}\" = ?1",
            M::TABLE,
            M::PRIMARY_KEY
        );
        debug!(sql = %sql, id, "get");
        self.conn
            .query_row(&sql, [id], |row| M::from_row(row))
            .optional()?
            .ok_or_else(|| Error::NotFound {
                table: M::TABLE.to_string(),
                id,
            })
    }

    pub fn delete_instance<M: Model>(&self, model: &M) -> Result<usize> {
        let id = model.id().ok_or_else(|| {
            Error::InvalidArgument(format!("{} row was never created", M::TABLE))
        })?;
        DeleteQuery::<M>::new(self)
            .filter(Column::new(M::PRIMARY_KEY).eq(id))
            .execute()
    }

    pub fn select<M: Model>(&self) -> SelectQuery<'_, M> {
        SelectQuery::new(self)
    }

    pub fn delete<M: Model>(&self) -> DeleteQuery<'_, M> {
        DeleteQuery::new(self)
    }

    pub fn update<M: Model>(&self) -> UpdateQuery<'_, M> {
        UpdateQuery::new(self)
    }

    /// Column names of `table` in declaration order.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        table_columns(&self.conn, table)
    }

    /// Run `f` inside a transaction: `Ok` commits, `Err` rolls back.
    ///
    /// Calls nested inside another `atomic` block use a savepoint instead.
    pub fn atomic<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Atomic<'_>) -> Result<T>,
    {
        let txn = Atomic::begin(self)?;
        match f(&txn) {
            Ok(value) => {
                txn.finish()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(cleanup) = txn.abort() {
                    warn!(error = %cleanup, "failed to roll back atomic block");
                }
                Err(err)
            }
        }
    }
}

/// Handle passed to an [`Database::atomic`] block.
///
/// Derefs to the [`Database`], so model operations work on it directly.
pub struct Atomic<'db> {
    db: &'db Database,
    savepoint: Option<String>,
    done: Cell<bool>,
}

impl<'db> Atomic<'db> {
    fn begin(db: &'db Database) -> Result<Self> {
        let depth = db.depth.get();
        let savepoint = if depth == 0 && db.conn.is_autocommit() {
            db.conn.execute_batch("BEGIN")?;
            None
        } else {
            let name = format!("atomic_{depth}");
            db.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
            Some(name)
        };
        debug!(depth, savepoint = ?savepoint, "atomic begin");
        db.depth.set(depth + 1);
        Ok(Self {
            db,
            savepoint,
            done: Cell::new(false),
        })
    }

    /// Discard everything done in this block so far; the block stays open.
    pub fn rollback(&self) -> Result<()> {
        debug!(savepoint = ?self.savepoint, "atomic rollback");
        match &self.savepoint {
            Some(name) => self.db.conn.execute_batch(&format!("ROLLBACK TO {name}"))?,
            None => self.db.conn.execute_batch("ROLLBACK; BEGIN")?,
        }
        Ok(())
    }

    /// Make everything done in this block so far permanent; the block stays open.
    pub fn commit(&self) -> Result<()> {
        debug!(savepoint = ?self.savepoint, "atomic commit");
        match &self.savepoint {
            Some(name) => self
                .db
                .conn
                .execute_batch(&format!("RELEASE {name}; SAVEPOINT {name}"))?,
            None => self.db.conn.execute_batch("COMMIT; BEGIN")?,
        }
        Ok(())
    }

    /// On a failed COMMIT or RELEASE the block's work is rolled back before
    /// the error is returned.
    fn finish(&self) -> Result<()> {
        self.close();
        let released = match &self.savepoint {
            Some(name) => self.db.conn.execute_batch(&format!("RELEASE {name}")),
            None => self.db.conn.execute_batch("COMMIT"),
        };
        if let Err(err) = released {
            if let Err(cleanup) = self.discard() {
                warn!(error = %cleanup, "failed to roll back after failed commit");
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn abort(&self) -> Result<()> {
        self.close();
        self.discard()
    }

    fn discard(&self) -> Result<()> {
        // the engine may already have rolled everything back (OR ROLLBACK, IOERR, FULL)
        if self.db.conn.is_autocommit() {
            return Ok(());
        }
        match &self.savepoint {
            Some(name) => self
                .db
                .conn
                .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))?,
            None => self.db.conn.execute_batch("ROLLBACK")?,
        }
        Ok(())
    }

    fn close(&self) {
        self.done.set(true);
        self.db.depth.set(self.db.depth.get().saturating_sub(1));
    }
}

impl Deref for Atomic<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        self.db
    }
}

impl Drop for Atomic<'_> {
    // Only reached without finish/abort when the block panicked.
    fn drop(&mut self) {
        if self.done.get() {
            return;
        }
        if let Err(err) = self.abort() {
            warn!(error = %err, "failed to roll back abandoned atomic block");
        }
    }
}
