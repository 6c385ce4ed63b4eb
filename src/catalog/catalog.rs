//! System catalog for OpalDB
//!
//! The catalog maps table names to tables. Lookups are case-insensitive
//! while the original spelling of every table name is preserved for
//! display.

use crate::error::{Error, Result};
use crate::storage::Table;

/// The catalog of all tables in the database
#[derive(Debug, Default, PartialEq)]
pub struct Database {
    tables: Vec<Table>,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Register a table. Fails if a table with the same name (ignoring
    /// case) already exists.
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        if self.contains(table.name()) {
            return Err(Error::TableExists(table.name().to_string()));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Look up a table by name (case-insensitive)
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Look up a table mutably by name (case-insensitive)
    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Remove a table by name (case-insensitive)
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        Ok(self.tables.remove(idx))
    }

    /// Check whether a table exists (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// All tables in creation order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no tables exist
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
