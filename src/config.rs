use crate::orm::schema::Schema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// SQLite connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file; empty for a transient database
    pub db_path: String,
    /// Tables created when a model database is opened from this config
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub foreign_keys: bool,
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<String>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            schema,
            foreign_keys: false,
            busy_timeout_ms: None,
        }
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub(crate) fn apply(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
        let foreign_keys = if self.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys}"))?;
        if let Some(ms) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_options() {
        let config = SqliteConfig::new("flesh.db", Schema::new())
            .with_foreign_keys(true)
            .with_busy_timeout(Duration::from_secs(2));
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(2000));
    }

    #[test]
    fn oversized_timeout_saturates() {
        let config = SqliteConfig::new("flesh.db", Schema::new()).with_busy_timeout(Duration::MAX);
        assert_eq!(config.busy_timeout_ms, Some(u64::MAX));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: SqliteConfig = serde_json::from_str(r#"{"db_path": "x.db"}"#).unwrap();
        assert_eq!(config, SqliteConfig::new("x.db", Schema::new()));
    }
}
