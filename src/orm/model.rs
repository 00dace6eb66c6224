use super::schema::TableDefinition;
use crate::value::Value;
use rusqlite::Row;

/// A type bound to one table.
///
/// The identity column is an auto-increment integer; everything else is
/// reported by [`Model::values`] in table order.
pub trait Model: Sized {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";

    fn table() -> TableDefinition;

    /// `None` until the row has been created
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Non-identity columns with their current values.
    fn values(&self) -> Vec<(&'static str, Value)>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
