//! Value and Row types for OpalDB
//!
//! This module defines how data values are represented in memory.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// A value in the database
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Integer value (32-bit)
    Integer(i32),
    /// Fixed-point decimal value
    Decimal(Decimal),
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Datetime value (instant, second precision in display)
    DateTime(NaiveDateTime),
    /// Date value (day granularity)
    Date(NaiveDate),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INT",
            Value::Decimal(_) => "DECIMAL",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::DateTime(_) => "DATETIME",
            Value::Date(_) => "DATE",
        }
    }

    /// Convert to a decimal for arithmetic, if this value is numeric-like.
    ///
    /// Strings never convert here: arithmetic on strings is either
    /// concatenation or a type error, decided by the caller.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Boolean(b) => Some(Decimal::from(*b as i32)),
            _ => None,
        }
    }

    /// Try to read this value's string form as a number.
    pub fn numeric(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => self.to_string().trim().parse().ok(),
        }
    }

    /// Truthiness for WHERE/HAVING: booleans by value, anything else
    /// truthy iff non-null.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            _ => true,
        }
    }

    /// Total ordering over values.
    ///
    /// Nulls sort below non-nulls. Same-type pairs compare natively
    /// (numbers as numbers, dates as dates). Mixed pairs try a numeric
    /// reading of both string forms and fall back to a case-insensitive
    /// string comparison.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,

            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Integer(a), Value::Decimal(b)) => Decimal::from(*a).cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.cmp(&Decimal::from(*b)),

            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),

            (Value::String(a), Value::String(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }

            _ => {
                if let (Some(a), Some(b)) = (self.numeric(), other.numeric()) {
                    a.cmp(&b)
                } else {
                    self.to_string()
                        .to_lowercase()
                        .cmp(&other.to_string().to_lowercase())
                }
            }
        }
    }

    /// Equality as used by the `=` operator: case-insensitive equality of
    /// the canonical string forms.
    pub fn equals(&self, other: &Value) -> bool {
        self.to_string().eq_ignore_ascii_case(&other.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A row in the database: a mapping from column name to value.
///
/// Lookup is case-insensitive; the original spelling and the insertion
/// order of the cells are preserved for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Get a value by column name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Set a value, replacing an existing cell with the same name
    /// (case-insensitive) or appending a new one
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self
            .cells
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(cell) => cell.1 = value,
            None => self.cells.push((name, value)),
        }
    }

    /// Check whether a column is present (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate cells in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_value_comparison() {
        assert_eq!(
            Value::Integer(5).compare(&Value::Integer(3)),
            Ordering::Greater
        );
        assert_eq!(
            Value::String("abc".into()).compare(&Value::String("DEF".into())),
            Ordering::Less
        );
        assert_eq!(Value::Null.compare(&Value::Integer(1)), Ordering::Less);
    }

    #[test]
    fn test_mixed_comparison_parses_numbers() {
        // A numeric string against an integer compares numerically.
        assert_eq!(
            Value::String("10".into()).compare(&Value::Integer(9)),
            Ordering::Greater
        );
        // Non-numeric strings fall back to case-insensitive text order.
        assert_eq!(
            Value::String("apple".into()).compare(&Value::Integer(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_datetime_compares_against_date_string() {
        let dt = NaiveDateTime::parse_from_str("2024-01-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let probe = Value::String("2024-01-02".into());
        assert_eq!(Value::DateTime(dt).compare(&probe), Ordering::Less);
    }

    #[test]
    fn test_equality_is_stringly_and_case_insensitive() {
        assert!(Value::String("Alice".into()).equals(&Value::String("alice".into())));
        assert!(Value::Integer(1).equals(&Value::String("1".into())));
        assert!(!Value::Integer(1).equals(&Value::Decimal(Decimal::from_str("1.0").unwrap())));
        assert!(Value::Null.equals(&Value::Null));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-03-07");
    }

    #[test]
    fn test_row_case_insensitive_lookup() {
        let mut row = Row::new();
        row.set("Id", Value::Integer(1));
        row.set("Name", Value::String("Alice".into()));

        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get("NAME"), Some(&Value::String("Alice".into())));
        assert!(row.get("missing").is_none());

        // Overwriting through a differently cased name keeps one cell.
        row.set("ID", Value::Integer(2));
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_row_preserves_insertion_order() {
        let mut row = Row::new();
        row.set("b", Value::Integer(2));
        row.set("a", Value::Integer(1));
        let names: Vec<&str> = row.columns().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
