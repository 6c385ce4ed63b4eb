//! OpalDB - an embedded SQL database engine written in Rust
//!
//! This library provides the core components of the engine:
//! - SQL parsing (lexer, parser, AST)
//! - Storage (B+ tree primary store, whole-file binary codec)
//! - System catalog with typed columns and coercion
//! - Tree-walking query evaluation

pub mod catalog;
pub mod engine;
pub mod error;
pub mod executor;
pub mod format;
pub mod sql;
pub mod storage;

pub use engine::Engine;
pub use error::{Error, Result};
pub use executor::QueryResult;
