//! Conditions and query builders for models.
//!
//! Unlike the accessor, every value here is bound as a parameter.

use super::{Database, Model};
use crate::error::{Error, Result};
use crate::value::Value;
use rusqlite::params_from_iter;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr, Not};
use tracing::debug;

/// Query operators for building conditions
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal(Value),
    NotEqual(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    Like(String),
    In(Vec<Value>),
}

/// A boolean condition over model columns, combined with `&`, `|` and `!`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        column: &'static str,
        op: QueryOperator,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// SQL text with `?` placeholders; bound values are appended to `params`.
    pub fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Expr::Compare { column, op } => render_compare(column, op, params),
            Expr::And(lhs, rhs) => format!("({} AND {})", lhs.render(params), rhs.render(params)),
            Expr::Or(lhs, rhs) => format!("({} OR {})", lhs.render(params), rhs.render(params)),
            Expr::Not(inner) => format!("(NOT {})", inner.render(params)),
        }
    }
}

fn render_compare(column: &str, op: &QueryOperator, params: &mut Vec<Value>) -> String {
    let (symbol, value) = match op {
        QueryOperator::Equal(Value::Null) => return format!("\"{column}\" IS NULL"),
        QueryOperator::NotEqual(Value::Null) => return format!("\"{column}\" IS NOT NULL"),
        QueryOperator::In(values) if values.is_empty() => return "0".to_string(),
        QueryOperator::In(values) => {
            params.extend(values.iter().cloned());
            let marks = vec!["?"; values.len()].join(", ");
            return format!("\"{column}\" IN ({marks})");
        }
        QueryOperator::Equal(v) => ("=", v.clone()),
        QueryOperator::NotEqual(v) => ("!=", v.clone()),
        QueryOperator::GreaterThan(v) => (">", v.clone()),
        QueryOperator::GreaterThanOrEqual(v) => (">=", v.clone()),
        QueryOperator::LessThan(v) => ("<", v.clone()),
        QueryOperator::LessThanOrEqual(v) => ("<=", v.clone()),
        QueryOperator::Like(pattern) => ("LIKE", Value::Text(pattern.clone())),
    };
    params.push(value);
    format!("\"{column}\" {symbol} ?")
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(rhs))
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// Handle to a model column, e.g. `Flesh::COUNT.lt(0.4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
}

impl Column {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn compare(self, op: QueryOperator) -> Expr {
        Expr::Compare {
            column: self.name,
            op,
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::Equal(value.into()))
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::NotEqual(value.into()))
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::GreaterThan(value.into()))
    }

    pub fn ge(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::GreaterThanOrEqual(value.into()))
    }

    pub fn lt(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::LessThan(value.into()))
    }

    pub fn le(self, value: impl Into<Value>) -> Expr {
        self.compare(QueryOperator::LessThanOrEqual(value.into()))
    }

    pub fn like(self, pattern: impl Into<String>) -> Expr {
        self.compare(QueryOperator::Like(pattern.into()))
    }

    pub fn in_list<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.compare(QueryOperator::In(values.into_iter().map(Into::into).collect()))
    }
}

fn and_filter(current: Option<Expr>, expr: Expr) -> Option<Expr> {
    Some(match current {
        Some(existing) => existing & expr,
        None => expr,
    })
}

fn where_clause(filter: &Option<Expr>, params: &mut Vec<Value>) -> String {
    match filter {
        Some(expr) => format!(" WHERE {}", expr.render(params)),
        None => String::new(),
    }
}

/// `SELECT` over one model's table
pub struct SelectQuery<'db, M: Model> {
    db: &'db Database,
    filter: Option<Expr>,
    order_by: Vec<(&'static str, bool)>,
    limit: Option<u32>,
    offset: Option<u32>,
    model: PhantomData<M>,
}

impl<'db, M: Model> SelectQuery<'db, M> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            filter: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            model: PhantomData,
        }
    }

    /// Repeated calls are ANDed together.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter, expr);
        self
    }

    pub fn order_by(mut self, column: Column, ascending: bool) -> Self {
        self.order_by.push((column.name(), ascending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn count(&self) -> Result<i64> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\"{}",
            M::TABLE,
            where_clause(&self.filter, &mut params)
        );
        debug!(sql = %sql, "count");
        let count = self
            .db
            .connection()
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count)
    }

    pub fn all(&self) -> Result<Vec<M>> {
        let mut params = Vec::new();
        let sql = self.sql(&mut params);
        debug!(sql = %sql, "select");
        let mut stmt = self.db.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| M::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn first(self) -> Result<Option<M>> {
        Ok(self.limit(1).all()?.into_iter().next())
    }

    fn sql(&self, params: &mut Vec<Value>) -> String {
        let mut sql = format!("SELECT * FROM \"{}\"{}", M::TABLE, where_clause(&self.filter, params));
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(column, asc)| format!("\"{column}\" {}", if *asc { "ASC" } else { "DESC" }))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {order}"));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // sqlite only accepts OFFSET after a LIMIT
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
        sql
    }
}

/// `DELETE` over one model's table; without a filter every row goes.
pub struct DeleteQuery<'db, M: Model> {
    db: &'db Database,
    filter: Option<Expr>,
    model: PhantomData<M>,
}

impl<'db, M: Model> DeleteQuery<'db, M> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            filter: None,
            model: PhantomData,
        }
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter, expr);
        self
    }

    pub fn execute(&self) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM \"{}\"{}",
            M::TABLE,
            where_clause(&self.filter, &mut params)
        );
        debug!(sql = %sql, "delete");
        Ok(self
            .db
            .connection()
            .execute(&sql, params_from_iter(params.iter()))?)
    }
}

/// `UPDATE` over one model's table
pub struct UpdateQuery<'db, M: Model> {
    db: &'db Database,
    assignments: Vec<(&'static str, Value)>,
    filter: Option<Expr>,
    model: PhantomData<M>,
}

impl<'db, M: Model> UpdateQuery<'db, M> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            assignments: Vec::new(),
            filter: None,
            model: PhantomData,
        }
    }

    pub fn set(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.assignments.push((column.name(), value.into()));
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = and_filter(self.filter, expr);
        self
    }

    pub fn execute(&self) -> Result<usize> {
        if self.assignments.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "update of {} sets no columns",
                M::TABLE
            )));
        }
        let mut params: Vec<Value> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        let set = self
            .assignments
            .iter()
            .map(|(column, _)| format!("\"{column}\" = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE \"{}\" SET {set}{}",
            M::TABLE,
            where_clause(&self.filter, &mut params)
        );
        debug!(sql = %sql, "update");
        Ok(self
            .db
            .connection()
            .execute(&sql, params_from_iter(params.iter()))?)
    }
}
