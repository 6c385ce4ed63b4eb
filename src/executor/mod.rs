//! Query execution module
//!
//! This module contains the tree-walking evaluator and its result type.

pub mod evaluator;

pub use evaluator::{Evaluator, QueryResult};
