//! Engine: the public entry point of OpalDB
//!
//! Wires the pipeline together: parse, evaluate, persist, format. Every
//! error from any stage is caught at the `execute` boundary and rendered
//! as an error string.

use std::path::PathBuf;

use crate::catalog::Database;
use crate::error::Result;
use crate::executor::{Evaluator, QueryResult};
use crate::format;
use crate::sql::ast::Statement;
use crate::sql::Parser;
use crate::storage::codec;

/// An embedded SQL engine over a single optional database file
#[derive(Debug)]
pub struct Engine {
    db: Database,
    path: Option<PathBuf>,
}

impl Engine {
    /// Create an engine with no backing file; data lives in memory only
    pub fn in_memory() -> Self {
        Self {
            db: Database::new(),
            path: None,
        }
    }

    /// Open an engine backed by a file. An existing file is loaded; a
    /// missing one is created on the first mutating statement.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = if path.exists() {
            codec::load(&path)?
        } else {
            tracing::info!(path = %path.display(), "new database; file created on first save");
            Database::new()
        };
        Ok(Self {
            db,
            path: Some(path),
        })
    }

    /// Execute a SQL statement and format the outcome. Errors become
    /// `"Error: <message>"` strings; nothing propagates past this point.
    pub fn execute(&mut self, sql: &str) -> String {
        match self.query(sql) {
            Ok(result) => format::render(&result),
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Execute a SQL statement and return the structured result. After a
    /// successful mutation the whole catalog is rewritten to the backing
    /// file, if one is configured; a failed rewrite leaves memory mutated
    /// and the file stale, and surfaces as the statement's error.
    pub fn query(&mut self, sql: &str) -> Result<QueryResult> {
        tracing::debug!(sql, "execute");
        let statement = Parser::new(sql, &self.db)?.parse()?;
        let mutating = !matches!(statement, Statement::Select(_));

        let result = Evaluator::new(&mut self.db).execute(statement)?;

        if mutating {
            if let Some(path) = &self.path {
                codec::save(&self.db, path)?;
            }
        }
        Ok(result)
    }

    /// The catalog owned by this engine
    pub fn database(&self) -> &Database {
        &self.db
    }
}
