//! Statement text for the accessor's CRUD helpers.
//!
//! Table names, column names and conditions are spliced in as given.

use crate::error::{Error, Result};
use crate::value::{format_literal, Value};

/// Condition used when the caller gives none; matches every row.
pub const ALL_ROWS: &str = "1";

pub fn select_statement(table: &str, columns: &[&str], conditions: Option<&str>) -> String {
    let columns = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };
    format!(
        "select {columns} from {table} where {}",
        conditions.unwrap_or(ALL_ROWS)
    )
}

pub fn insert_statement(table: &str, values: &[Value]) -> String {
    format!("insert into {table} values({})", insert_values(values))
}

pub fn update_statement(
    table: &str,
    columns: &[&str],
    values: &[Value],
    conditions: Option<&str>,
) -> Result<String> {
    Ok(format!(
        "update {table} set {} where {}",
        update_assignments(columns, values)?,
        conditions.unwrap_or(ALL_ROWS)
    ))
}

pub fn delete_statement(table: &str, conditions: Option<&str>) -> String {
    format!("delete from {table} where {}", conditions.unwrap_or(ALL_ROWS))
}

/// `x1,x2,...,xn`
pub fn insert_values(values: &[Value]) -> String {
    values
        .iter()
        .map(format_literal)
        .collect::<Vec<_>>()
        .join(",")
}

/// `col1=val1,col2=val2,...,coln=valn`
pub fn update_assignments(columns: &[&str], values: &[Value]) -> Result<String> {
    if columns.len() != values.len() {
        return Err(Error::LengthMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }
    Ok(columns
        .iter()
        .zip(values)
        .map(|(column, value)| format!("{column}={}", format_literal(value)))
        .collect::<Vec<_>>()
        .join(","))
}

/// True when `sql` is only whitespace, comments and `;`.
pub(crate) fn is_blank(sql: &str) -> bool {
    skip_trivia(sql).is_empty()
}

fn skip_trivia(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map_or("", |end| &rest[end..]);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.find("*/").map_or("", |end| &rest[end + 2..]);
        } else {
            return sql;
        }
    }
}

/// Whether the engine binding opens a transaction ahead of this statement.
pub(crate) fn opens_transaction(sql: &str) -> bool {
    let keyword = skip_trivia(sql)
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    ["insert", "update", "delete", "replace"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    #[test]
    fn select_defaults_to_every_column_and_row() {
        assert_eq!(
            select_statement("Flesh", &[], None),
            "select * from Flesh where 1"
        );
    }

    #[test]
    fn select_joins_columns() {
        assert_eq!(
            select_statement("Flesh", &["Id", "Count"], Some("Id>4")),
            "select Id,Count from Flesh where Id>4"
        );
        assert_eq!(
            select_statement("Flesh", &["*"], None),
            "select * from Flesh where 1"
        );
    }

    #[test]
    fn insert_formats_each_value() {
        assert_eq!(
            insert_statement("Flesh", &values![15, "2018-07-29", 0.1]),
            "insert into Flesh values(15,'2018-07-29',0.1)"
        );
        assert_eq!(
            insert_statement("Flesh", &values![1, None::<i64>, "None"]),
            "insert into Flesh values(1,'','')"
        );
    }

    #[test]
    fn update_pairs_columns_with_values() {
        let values = values!["2018-07-29", 3];
        let sql = update_statement("Flesh", &["Date", "Count"], &values, Some("Id>4")).unwrap();
        assert_eq!(sql, "update Flesh set Date='2018-07-29',Count=3 where Id>4");
    }

    #[test]
    fn update_rejects_mismatched_lengths() {
        let err = update_assignments(&["Date", "Count"], &values!["2018-07-29"]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                columns: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn delete_defaults_to_every_row() {
        assert_eq!(delete_statement("Flesh", None), "delete from Flesh where 1");
        assert_eq!(
            delete_statement("Flesh", Some("Id=1")),
            "delete from Flesh where Id=1"
        );
    }

    #[test]
    fn dml_statements_open_transactions() {
        assert!(opens_transaction("insert into t values(1)"));
        assert!(opens_transaction("  UPDATE t set a=1"));
        assert!(opens_transaction("replace into t values(1)"));
        assert!(!opens_transaction("select * from t"));
        assert!(!opens_transaction("create table t(a)"));
        assert!(!opens_transaction(""));
        assert!(opens_transaction("-- note\ndelete from t"));
    }

    #[test]
    fn comments_and_whitespace_are_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t"));
        assert!(is_blank("-- note"));
        assert!(is_blank("/* block */ ; -- trailing\n"));
        assert!(is_blank("/* unterminated"));
        assert!(!is_blank("-- note\nselect 1"));
        assert!(!is_blank("select 1 -- note"));
    }
}
