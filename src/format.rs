//! Result formatting for OpalDB
//!
//! Renders a query result as text: a success message, an affected-row
//! message, or an ASCII table with per-column padding.

use crate::executor::QueryResult;
use crate::storage::{Row, Value};

/// Render a query result for display
pub fn render(result: &QueryResult) -> String {
    match result {
        QueryResult::None => "Query executed successfully".to_string(),
        QueryResult::Affected(n) => {
            format!("Query executed successfully. {} rows affected", n)
        }
        QueryResult::Rows { columns, rows } => {
            if rows.is_empty() {
                "No rows returned.".to_string()
            } else {
                render_table(columns, rows)
            }
        }
    }
}

/// Render rows as an ASCII table. Every column is padded on the left to
/// the wider of its header and its widest value; nulls print as `null`.
fn render_table(columns: &[String], rows: &[Row]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .map(|col| {
            rows.iter()
                .map(|row| cell(row, col).len())
                .chain(std::iter::once(col.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule: String = {
        let segments: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    };

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!(" {:>width$} ", col, width = *w))
        .collect();
    out.push_str(&format!("|{}|\n", header.join("|")));
    out.push_str(&rule);
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!(" {:>width$} ", cell(row, col), width = *w))
            .collect();
        out.push_str(&format!("|{}|\n", cells.join("|")));
    }
    out.push_str(&rule);
    out
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).unwrap_or(&Value::Null).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_none_and_affected() {
        assert_eq!(render(&QueryResult::None), "Query executed successfully");
        assert_eq!(
            render(&QueryResult::Affected(3)),
            "Query executed successfully. 3 rows affected"
        );
    }

    #[test]
    fn test_render_empty_rows() {
        let result = QueryResult::Rows {
            columns: vec!["id".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(render(&result), "No rows returned.");
    }

    #[test]
    fn test_render_table_pads_columns() {
        let result = QueryResult::Rows {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                row(&[("id", Value::Integer(1)), ("name", Value::String("Alice".into()))]),
                row(&[("id", Value::Integer(20)), ("name", Value::Null)]),
            ],
        };
        let text = render(&result);
        let expected = "\
+----+-------+
| id |  name |
+----+-------+
|  1 | Alice |
| 20 |  null |
+----+-------+";
        assert_eq!(text, expected);
    }
}
