//! Schema definitions for OpalDB
//!
//! This module defines column metadata and table schemas.

use super::types::DataType;
use crate::error::{Error, Result};
use crate::storage::Value;

/// Column definition in a table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Is this the primary key?
    pub primary_key: bool,
    /// Is this column nullable?
    pub nullable: bool,
    /// Default value for rows that omit the column
    pub default: Option<Value>,
}

impl Column {
    /// Create a new nullable column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: true,
            default: None,
        }
    }

    /// Set the primary key flag; primary keys are never nullable
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        if pk {
            self.nullable = false;
        }
        self
    }

    /// Set the nullable flag
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the default value
    pub fn default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Check the column invariants: non-empty name, primary keys never
    /// nullable, non-null defaults carry the declared type.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidArgument(
                "column name must not be empty".to_string(),
            ));
        }
        if self.primary_key && self.nullable {
            return Err(Error::InvalidArgument(format!(
                "primary key column '{}' must not be nullable",
                self.name
            )));
        }
        if let Some(default) = &self.default {
            if !default.is_null() && !self.data_type.matches(default) {
                return Err(Error::TypeMismatch {
                    from: default.type_name().to_string(),
                    to: self.data_type.tag().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered column list with case-insensitive name lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema, validating each column and rejecting duplicate
    /// names (case-insensitive).
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        for (i, col) in columns.iter().enumerate() {
            col.validate()?;
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&col.name))
            {
                return Err(Error::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Get a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All columns in declared order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Declared column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The primary key column, if exactly one is declared
    pub fn primary_key(&self) -> Option<&Column> {
        let mut pks = self.columns.iter().filter(|c| c.primary_key);
        match (pks.next(), pks.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }
}
