//! Example model: a dated measurement with an auto-increment id.

use super::query::Column;
use super::schema::{ColumnConstraint, ColumnDefinition, DataType, DefaultValue, TableDefinition};
use super::Model;
use crate::value::Value;
use chrono::{NaiveDate, Utc};
use rusqlite::Row;

#[derive(Debug, Clone, PartialEq)]
pub struct Flesh {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub count: f64,
}

impl Flesh {
    pub const ID: Column = Column::new("id");
    pub const DATE: Column = Column::new("date");
    pub const COUNT: Column = Column::new("count");

    /// Today's UTC date (matching the column's `CURRENT_DATE` default) and a count of 1.0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_count(mut self, count: f64) -> Self {
        self.count = count;
        self
    }
}

impl Default for Flesh {
    fn default() -> Self {
        Self {
            id: None,
            date: Utc::now().date_naive(),
            count: 1.0,
        }
    }
}

impl Model for Flesh {
    const TABLE: &'static str = "flesh";

    fn table() -> TableDefinition {
        TableDefinition::new(Self::TABLE)
            .column(
                ColumnDefinition::new("id", DataType::Integer)
                    .constraint(ColumnConstraint::PrimaryKey)
                    .constraint(ColumnConstraint::AutoIncrement),
            )
            .column(
                ColumnDefinition::new("date", DataType::Date)
                    .constraint(ColumnConstraint::NotNull)
                    .default_value(DefaultValue::CurrentDate),
            )
            .column(
                ColumnDefinition::new("count", DataType::Real)
                    .constraint(ColumnConstraint::NotNull)
                    .default_value(DefaultValue::Real(1.0)),
            )
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![("date", self.date.into()), ("count", self.count.into())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            count: row.get("count")?,
        })
    }
}
