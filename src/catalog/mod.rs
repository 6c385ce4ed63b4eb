//! Catalog module
//!
//! This module contains the table registry, schema definitions, and data
//! types.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::Database;
pub use schema::{Column, Schema};
pub use types::DataType;
