//! Table storage for OpalDB
//!
//! A table owns its schema and the B+ tree holding its rows, keyed by the
//! string form of the primary-key value.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::btree::BPlusTree;
use super::row::{Row, Value};
use crate::catalog::schema::{Column, Schema};
use crate::catalog::types::DataType;
use crate::error::{Error, Result};

/// Order of the per-table B+ tree. Odd, so both halves of every split meet
/// the minimum-key threshold.
pub const TREE_ORDER: usize = 5;

/// A table: name, schema, and the primary-key-ordered row store
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    schema: Schema,
    store: BPlusTree,
}

impl Table {
    /// Create an empty table. Validates the schema invariants: non-empty
    /// name, valid columns with unique names, exactly one primary key.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "table name must not be empty".to_string(),
            ));
        }
        let schema = Schema::from_columns(columns)?;
        if schema.primary_key().is_none() {
            return Err(Error::InvalidArgument(format!(
                "table '{}' must declare exactly one primary key column",
                name
            )));
        }
        Ok(Self {
            name,
            schema,
            store: BPlusTree::new(TREE_ORDER)?,
        })
    }

    /// Table name (original case)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The primary key column
    pub fn primary_key(&self) -> &Column {
        self.schema
            .primary_key()
            .expect("table construction guarantees a primary key")
    }

    /// The underlying row store
    pub fn store(&self) -> &BPlusTree {
        &self.store
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Insert a row, upserting on an existing primary key. Cells are
    /// coerced to their declared types; columns missing from the input
    /// receive the column default. Returns the stored row.
    pub fn insert(&mut self, row: Row) -> Result<Row> {
        for (name, _) in row.iter() {
            if self.schema.column(name).is_none() {
                return Err(Error::ColumnNotFound(name.to_string()));
            }
        }

        let mut stored = Row::new();
        for column in self.schema.columns() {
            let value = match row.get(&column.name) {
                Some(v) => v.clone(),
                None => column.default.clone().unwrap_or(Value::Null),
            };
            stored.set(column.name.clone(), Self::coerce(column, value)?);
        }

        let key = self.row_key(&stored)?;
        self.store.insert(&key, stored.clone())?;
        Ok(stored)
    }

    /// Remove the row stored under the given primary-key string
    pub fn remove(&mut self, key: &str) -> Result<Row> {
        self.store.remove(key)
    }

    /// Snapshot of all rows with their primary-key strings, in key order.
    /// Callers that mutate while iterating must work from this snapshot.
    pub fn scan(&self) -> Vec<(String, Row)> {
        self.store
            .iter()
            .map(|(k, r)| (k.to_string(), r.clone()))
            .collect()
    }

    /// The store key for a row: the string form of its primary-key value
    pub fn row_key(&self, row: &Row) -> Result<String> {
        let pk = self.primary_key();
        match row.get(&pk.name) {
            Some(v) if !v.is_null() => Ok(v.to_string()),
            _ => Err(Error::NullViolation(pk.name.clone())),
        }
    }

    /// Convert a value to the column's declared type.
    ///
    /// Parsing is invariant: `rust_decimal` for numbers, ISO-style chrono
    /// formats for dates. Nulls pass through nullable columns untouched.
    pub fn coerce(column: &Column, value: Value) -> Result<Value> {
        if value.is_null() {
            if !column.nullable {
                return Err(Error::NullViolation(column.name.clone()));
            }
            return Ok(Value::Null);
        }

        let mismatch = || Error::TypeMismatch {
            from: value.type_name().to_string(),
            to: column.data_type.tag().to_string(),
        };

        let coerced = match column.data_type {
            DataType::Int => match &value {
                Value::Integer(i) => Value::Integer(*i),
                Value::Boolean(b) => Value::Integer(*b as i32),
                Value::Decimal(d) if d.fract().is_zero() => {
                    Value::Integer(d.to_i32().ok_or_else(mismatch)?)
                }
                Value::String(s) => {
                    Value::Integer(s.trim().parse().map_err(|_| mismatch())?)
                }
                _ => return Err(mismatch()),
            },
            DataType::Decimal => match &value {
                Value::Decimal(d) => Value::Decimal(*d),
                Value::Integer(i) => Value::Decimal(Decimal::from(*i)),
                Value::String(s) => {
                    Value::Decimal(s.trim().parse().map_err(|_| mismatch())?)
                }
                _ => return Err(mismatch()),
            },
            DataType::Varchar | DataType::Text => Value::String(value.to_string()),
            DataType::Boolean => match &value {
                Value::Boolean(b) => Value::Boolean(*b),
                Value::Integer(i) => Value::Boolean(*i != 0),
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" => Value::Boolean(true),
                    "false" => Value::Boolean(false),
                    _ => return Err(mismatch()),
                },
                _ => return Err(mismatch()),
            },
            DataType::DateTime => match &value {
                Value::DateTime(t) => Value::DateTime(*t),
                Value::Date(d) => Value::DateTime(
                    d.and_hms_opt(0, 0, 0).expect("midnight exists for every date"),
                ),
                Value::String(s) => {
                    Value::DateTime(parse_datetime(s).ok_or_else(mismatch)?)
                }
                _ => return Err(mismatch()),
            },
            DataType::Date => match &value {
                Value::Date(d) => Value::Date(*d),
                Value::DateTime(t) => Value::Date(t.date()),
                Value::String(s) => Value::Date(
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .ok()
                        .or_else(|| parse_datetime(s).map(|t| t.date()))
                        .ok_or_else(mismatch)?,
                ),
                _ => return Err(mismatch()),
            },
        };
        Ok(coerced)
    }
}

/// Parse a datetime from its canonical forms, accepting a bare date as
/// midnight.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
