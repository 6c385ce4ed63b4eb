//! Tree-walking evaluator for OpalDB
//!
//! Dispatches on the root statement node, binds identifiers against rows,
//! coerces dynamically, and commits mutations back to the catalog.
//! UPDATE and DELETE always work from a snapshot of the matched rows: the
//! tree is not safe to mutate while it is being iterated.

use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::catalog::{Column, Database};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::storage::{Row, Table, Value};

/// The result of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// DDL succeeded
    None,
    /// Row count for UPDATE/DELETE
    Affected(usize),
    /// Result rows for SELECT, or the inserted rows for INSERT
    Rows { columns: Vec<String>, rows: Vec<Row> },
}

/// Tree-walking evaluator over a database
pub struct Evaluator<'a> {
    db: &'a mut Database,
}

/// Where identifiers and aggregates resolve during evaluation
enum EvalContext<'a> {
    /// No row in scope (INSERT value lists)
    Const,
    /// A single row in scope (WHERE, UPDATE assignments)
    Row(&'a Row),
    /// A group in scope (aggregate projection, HAVING). Identifiers try
    /// the group's result row first, then the first source row.
    Group { rows: &'a [Row], result: &'a Row },
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over the given database
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Execute one statement
    pub fn execute(&mut self, stmt: Statement) -> Result<QueryResult> {
        match stmt {
            Statement::Select(s) => self.execute_select(s),
            Statement::Insert(s) => self.execute_insert(s),
            Statement::Update(s) => self.execute_update(s),
            Statement::Delete(s) => self.execute_delete(s),
            Statement::CreateTable(s) => self.execute_create_table(s),
            Statement::DropTable(s) => self.execute_drop_table(s),
        }
    }

    // ========== SELECT ==========

    fn execute_select(&mut self, stmt: SelectStatement) -> Result<QueryResult> {
        let table = self.db.get_table(&stmt.from.name)?;
        let binding = stmt.from.alias.as_deref().unwrap_or_else(|| table.name());
        tracing::debug!(table = table.name(), binding, rows = table.len(), "select");

        let schema_names: Vec<String> = table
            .schema()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows: Vec<Row> = table.store().iter().map(|(_, r)| r.clone()).collect();

        if let Some(pred) = &stmt.where_clause {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if eval(pred, &EvalContext::Row(&row))?.is_truthy() {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        let columns = output_columns(&stmt.columns, &schema_names);
        let aggregated = !stmt.group_by.is_empty()
            || stmt.columns.iter().any(|item| {
                matches!(item, SelectItem::Expr { expr, .. } if expr.contains_aggregate())
            });

        if aggregated {
            let rows = self.project_groups(&stmt, rows, &schema_names)?;
            Ok(QueryResult::Rows { columns, rows })
        } else {
            let mut out = Vec::with_capacity(rows.len());
            for row in &rows {
                out.push(project_row(&stmt.columns, row, &schema_names)?);
            }
            Ok(QueryResult::Rows { columns, rows: out })
        }
    }

    /// Group the filtered rows, project one output row per group, and
    /// apply HAVING. Without GROUP BY the whole set is a single group.
    fn project_groups(
        &self,
        stmt: &SelectStatement,
        rows: Vec<Row>,
        schema_names: &[String],
    ) -> Result<Vec<Row>> {
        let mut groups: Vec<(String, Vec<Row>)> = Vec::new();
        if stmt.group_by.is_empty() {
            groups.push((String::new(), rows));
        } else {
            for row in rows {
                let mut parts = Vec::with_capacity(stmt.group_by.len());
                for name in &stmt.group_by {
                    let value = row
                        .get(name)
                        .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
                    parts.push(value.to_string());
                }
                let key = parts.join(":");
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, members)) => members.push(row),
                    None => groups.push((key, vec![row])),
                }
            }
        }

        let empty = Row::new();
        let mut out = Vec::with_capacity(groups.len());
        for (_, members) in &groups {
            let mut result = Row::new();
            for item in &stmt.columns {
                match item {
                    SelectItem::Wildcard => {
                        if let Some(first) = members.first() {
                            for name in schema_names {
                                result.set(
                                    name.clone(),
                                    first.get(name).cloned().unwrap_or(Value::Null),
                                );
                            }
                        }
                    }
                    SelectItem::Expr { expr, alias } => {
                        let value = eval(
                            expr,
                            &EvalContext::Group {
                                rows: members,
                                result: &empty,
                            },
                        )?;
                        result.set(output_name(expr, alias), value);
                    }
                }
            }

            if let Some(having) = &stmt.having {
                let keep = eval(
                    having,
                    &EvalContext::Group {
                        rows: members,
                        result: &result,
                    },
                )?
                .is_truthy();
                if !keep {
                    continue;
                }
            }
            out.push(result);
        }
        Ok(out)
    }

    // ========== INSERT ==========

    fn execute_insert(&mut self, stmt: InsertStatement) -> Result<QueryResult> {
        self.db.get_table(&stmt.table_name)?;

        let mut staged = Vec::with_capacity(stmt.values.len());
        for tuple in &stmt.values {
            if tuple.len() != stmt.columns.len() {
                return Err(Error::ArityError {
                    expected: stmt.columns.len(),
                    found: tuple.len(),
                });
            }
            let mut row = Row::new();
            for (name, expr) in stmt.columns.iter().zip(tuple) {
                row.set(name.clone(), eval(expr, &EvalContext::Const)?);
            }
            staged.push(row);
        }

        let table = self.db.get_table_mut(&stmt.table_name)?;
        let columns: Vec<String> = table
            .schema()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut inserted = Vec::with_capacity(staged.len());
        for row in staged {
            inserted.push(table.insert(row)?);
        }
        tracing::debug!(table = %stmt.table_name, count = inserted.len(), "insert");

        Ok(QueryResult::Rows {
            columns,
            rows: inserted,
        })
    }

    // ========== UPDATE ==========

    fn execute_update(&mut self, stmt: UpdateStatement) -> Result<QueryResult> {
        let table = self.db.get_table(&stmt.table_name)?;
        let snapshot = table.scan();

        let mut planned: Vec<(String, Row)> = Vec::new();
        for (key, row) in &snapshot {
            let matched = match &stmt.where_clause {
                Some(pred) => eval(pred, &EvalContext::Row(row))?.is_truthy(),
                None => true,
            };
            if !matched {
                continue;
            }

            let mut updated = row.clone();
            for assignment in &stmt.assignments {
                let column = table
                    .schema()
                    .column(&assignment.column)
                    .ok_or_else(|| Error::ColumnNotFound(assignment.column.clone()))?;
                let value = eval(&assignment.value, &EvalContext::Row(row))?;
                updated.set(column.name.clone(), Table::coerce(column, value)?);
            }
            planned.push((key.clone(), updated));
        }

        let count = planned.len();
        let table = self.db.get_table_mut(&stmt.table_name)?;
        for (old_key, updated) in planned {
            let new_key = table.row_key(&updated)?;
            if new_key != old_key {
                table.remove(&old_key)?;
            }
            table.insert(updated)?;
        }
        tracing::debug!(table = %stmt.table_name, count, "update");

        Ok(QueryResult::Affected(count))
    }

    // ========== DELETE ==========

    fn execute_delete(&mut self, stmt: DeleteStatement) -> Result<QueryResult> {
        let table = self.db.get_table(&stmt.table_name)?;
        let snapshot = table.scan();

        let mut doomed = Vec::new();
        for (key, row) in &snapshot {
            let matched = match &stmt.where_clause {
                Some(pred) => eval(pred, &EvalContext::Row(row))?.is_truthy(),
                None => true,
            };
            if matched {
                doomed.push(key.clone());
            }
        }

        let count = doomed.len();
        let table = self.db.get_table_mut(&stmt.table_name)?;
        for key in doomed {
            table.remove(&key)?;
        }
        tracing::debug!(table = %stmt.table_name, count, "delete");

        Ok(QueryResult::Affected(count))
    }

    // ========== CREATE / DROP ==========

    fn execute_create_table(&mut self, stmt: CreateTableStatement) -> Result<QueryResult> {
        let columns = stmt
            .columns
            .into_iter()
            .map(|def| {
                Column::new(def.name, def.data_type)
                    .primary_key(def.primary_key)
                    .nullable(!def.not_null && !def.primary_key)
            })
            .collect();

        // Table construction validates the schema before any state change.
        let table = Table::new(stmt.table_name, columns)?;
        tracing::debug!(table = table.name(), "create table");
        self.db.create_table(table)?;
        Ok(QueryResult::None)
    }

    fn execute_drop_table(&mut self, stmt: DropTableStatement) -> Result<QueryResult> {
        self.db.drop_table(&stmt.table_name)?;
        tracing::debug!(table = %stmt.table_name, "drop table");
        Ok(QueryResult::None)
    }
}

/// Column headers for a select list
fn output_columns(items: &[SelectItem], schema_names: &[String]) -> Vec<String> {
    let mut columns = Vec::new();
    for item in items {
        match item {
            SelectItem::Wildcard => columns.extend(schema_names.iter().cloned()),
            SelectItem::Expr { expr, alias } => columns.push(output_name(expr, alias)),
        }
    }
    columns
}

/// Output key for a projected expression: the alias if present, otherwise
/// the expression's printed form.
fn output_name(expr: &Expr, alias: &Option<String>) -> String {
    alias.clone().unwrap_or_else(|| expr.to_string())
}

/// Project one source row through the select list
fn project_row(items: &[SelectItem], row: &Row, schema_names: &[String]) -> Result<Row> {
    let mut out = Row::new();
    for item in items {
        match item {
            SelectItem::Wildcard => {
                for name in schema_names {
                    out.set(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
                }
            }
            SelectItem::Expr { expr, alias } => {
                let value = eval(expr, &EvalContext::Row(row))?;
                out.set(output_name(expr, alias), value);
            }
        }
    }
    Ok(out)
}

// ========== Expression evaluation ==========

fn eval(expr: &Expr, ctx: &EvalContext) -> Result<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),

        Expr::Identifier(name) => match ctx {
            EvalContext::Const => Err(Error::ColumnNotFound(name.clone())),
            EvalContext::Row(row) => row
                .get(name)
                .cloned()
                .ok_or_else(|| Error::ColumnNotFound(name.clone())),
            EvalContext::Group { rows, result } => {
                if let Some(value) = result.get(name) {
                    return Ok(value.clone());
                }
                match rows.first() {
                    Some(first) => first
                        .get(name)
                        .cloned()
                        .ok_or_else(|| Error::ColumnNotFound(name.clone())),
                    None => Ok(Value::Null),
                }
            }
        },

        Expr::Aggregate { func, arg } => match ctx {
            EvalContext::Group { rows, .. } => compute_aggregate(*func, arg, rows),
            _ => Err(Error::InvalidArgument(
                "aggregate functions are only allowed in a grouped SELECT".to_string(),
            )),
        },

        Expr::BinaryOp { left, op, right } => match op {
            // AND/OR short-circuit.
            BinaryOperator::And => {
                if !eval(left, ctx)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(eval(right, ctx)?.is_truthy()))
            }
            BinaryOperator::Or => {
                if eval(left, ctx)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(eval(right, ctx)?.is_truthy()))
            }
            _ => {
                let lhs = eval(left, ctx)?;
                let rhs = eval(right, ctx)?;
                apply_binary(*op, &lhs, &rhs)
            }
        },
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Decimal(d) => Value::Decimal(*d),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOperator::Eq => Ok(Value::Boolean(left.equals(right))),
        BinaryOperator::Neq => Ok(Value::Boolean(!left.equals(right))),
        BinaryOperator::Lt => Ok(Value::Boolean(left.compare(right) == Ordering::Less)),
        BinaryOperator::Lte => Ok(Value::Boolean(left.compare(right) != Ordering::Greater)),
        BinaryOperator::Gt => Ok(Value::Boolean(left.compare(right) == Ordering::Greater)),
        BinaryOperator::Gte => Ok(Value::Boolean(left.compare(right) != Ordering::Less)),
        BinaryOperator::Like => like(left, right),
        BinaryOperator::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::Mod => arithmetic(op, left, right),
    }
}

/// Binary arithmetic. Strings concatenate under `+` and reject the other
/// operators; everything else converts to decimal. NULL operands yield
/// NULL.
fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        if op == BinaryOperator::Add {
            return Ok(Value::String(format!("{}{}", left, right)));
        }
        return Err(Error::TypeMismatch {
            from: left.type_name().to_string(),
            to: right.type_name().to_string(),
        });
    }

    let mismatch = |v: &Value| Error::TypeMismatch {
        from: v.type_name().to_string(),
        to: "DECIMAL".to_string(),
    };
    let a = left.as_decimal().ok_or_else(|| mismatch(left))?;
    let b = right.as_decimal().ok_or_else(|| mismatch(right))?;

    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            if b.is_zero() {
                return Err(Error::DivisionByZero);
            }
            a / b
        }
        BinaryOperator::Mod => {
            if b.is_zero() {
                return Err(Error::DivisionByZero);
            }
            // Mathematical definition: a - floor(a/b) * b.
            a - (a / b).floor() * b
        }
        _ => unreachable!("arithmetic is only called for arithmetic operators"),
    };
    Ok(Value::Decimal(result))
}

/// Case-insensitive SQL LIKE: `%` matches any substring, `_` exactly one
/// character, everything else literally.
fn like(value: &Value, pattern: &Value) -> Result<Value> {
    if value.is_null() || pattern.is_null() {
        return Ok(Value::Boolean(false));
    }
    let re = Regex::new(&like_to_regex(&pattern.to_string()))
        .map_err(|e| Error::InvalidArgument(format!("invalid LIKE pattern: {}", e)))?;
    Ok(Value::Boolean(re.is_match(&value.to_string())))
}

/// Translate a LIKE pattern into an anchored, case-insensitive regex
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            ch => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out.push('$');
    out
}

/// Compute one aggregate over a group's source rows
fn compute_aggregate(func: AggregateFunc, arg: &AggregateArg, rows: &[Row]) -> Result<Value> {
    let expr = match arg {
        AggregateArg::Star => {
            return match func {
                AggregateFunc::Count => Ok(Value::Integer(rows.len() as i32)),
                _ => Err(Error::InvalidArgument(format!(
                    "{}(*) is not supported; pass a column or expression",
                    func
                ))),
            };
        }
        AggregateArg::Expr(expr) => expr,
    };

    // Aggregates skip NULL inputs.
    let mut values = Vec::new();
    for row in rows {
        let value = eval(expr, &EvalContext::Row(row))?;
        if !value.is_null() {
            values.push(value);
        }
    }

    match func {
        AggregateFunc::Count => Ok(Value::Integer(values.len() as i32)),
        AggregateFunc::Sum | AggregateFunc::Avg => {
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let mut sum = Decimal::ZERO;
            for value in &values {
                sum += value.numeric().ok_or_else(|| Error::TypeMismatch {
                    from: value.type_name().to_string(),
                    to: "DECIMAL".to_string(),
                })?;
            }
            match func {
                AggregateFunc::Sum => Ok(Value::Decimal(sum)),
                _ => Ok(Value::Decimal(sum / Decimal::from(values.len() as i64))),
            }
        }
        AggregateFunc::Min | AggregateFunc::Max => {
            let mut best: Option<Value> = None;
            for value in values {
                best = Some(match best {
                    None => value,
                    Some(current) => {
                        let replace = match func {
                            AggregateFunc::Min => value.compare(&current) == Ordering::Less,
                            _ => value.compare(&current) == Ordering::Greater,
                        };
                        if replace {
                            value
                        } else {
                            current
                        }
                    }
                });
            }
            Ok(best.unwrap_or(Value::Null))
        }
    }
}
