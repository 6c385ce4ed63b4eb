//! Error types for OpalDB
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for OpalDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lex error at line {line}, column {column}: {message}")]
    LexError {
        message: String,
        line: usize,
        column: usize,
    },

    // ========== Parser Errors ==========
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        message: String,
        line: usize,
        column: usize,
    },

    // ========== Catalog Errors ==========
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    // ========== Schema Constraint Errors ==========
    #[error("Cannot convert {from} to {to}")]
    TypeMismatch { from: String, to: String },

    #[error("Null value not allowed for column '{0}'")]
    NullViolation(String),

    #[error("Column count {expected} does not match value count {found}")]
    ArityError { expected: usize, found: usize },

    // ========== Store Errors ==========
    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    // ========== Execution Errors ==========
    #[error("Division by zero")]
    DivisionByZero,

    // ========== Persistence Errors ==========
    #[error("Corrupt database file: {0}")]
    CorruptDatabase(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Misuse Errors ==========
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for OpalDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Table 'users' not found");

        let err = Error::LexError {
            message: "unexpected character '@'".to_string(),
            line: 1,
            column: 5,
        };
        assert_eq!(
            err.to_string(),
            "Lex error at line 1, column 5: unexpected character '@'"
        );

        let err = Error::ArityError {
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Column count 3 does not match value count 2"
        );
    }
}
