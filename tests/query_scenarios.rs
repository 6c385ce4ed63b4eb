//! End-to-end query scenarios against the standard users fixture.

use opaldb::storage::Value;
use opaldb::{Engine, QueryResult};

/// Build the users table with six rows; Charlie Smith appears twice.
fn users_fixture() -> Engine {
    let mut engine = Engine::in_memory();
    exec_ok(
        &mut engine,
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR, email VARCHAR, created_at DATETIME)",
    );
    exec_ok(
        &mut engine,
        "INSERT INTO users VALUES \
         (1, 'John Doe', 'john@example.com', '2024-01-01 09:00:00'), \
         (2, 'Jane Smith', 'jane@example.com', '2024-01-02 10:00:00'), \
         (3, 'Bob Johnson', 'bob@example.com', '2024-01-03 11:00:00'), \
         (4, 'Alice Brown', 'alice@example.com', '2024-01-01 12:00:00'), \
         (5, 'Charlie Smith', 'charlie@example.com', '2024-01-04 13:00:00'), \
         (6, 'Charlie Smith', 'charlie2@example.com', '2024-01-05 14:00:00')",
    );
    engine
}

fn exec_ok(engine: &mut Engine, sql: &str) {
    let out = engine.execute(sql);
    assert!(!out.starts_with("Error:"), "'{}' failed: {}", sql, out);
}

fn rows(engine: &mut Engine, sql: &str) -> Vec<opaldb::storage::Row> {
    match engine.query(sql).unwrap() {
        QueryResult::Rows { rows, .. } => rows,
        other => panic!("'{}' did not return rows: {:?}", sql, other),
    }
}

fn affected(engine: &mut Engine, sql: &str) -> usize {
    match engine.query(sql).unwrap() {
        QueryResult::Affected(n) => n,
        other => panic!("'{}' did not return a count: {:?}", sql, other),
    }
}

#[test]
fn count_star_over_fixture() {
    let mut engine = users_fixture();
    let rows = rows(&mut engine, "SELECT COUNT(*) FROM users");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("COUNT(*)"), Some(&Value::Integer(6)));
}

#[test]
fn group_by_name_counts() {
    let mut engine = users_fixture();
    let rows = rows(&mut engine, "SELECT name, COUNT(*) FROM users GROUP BY name");

    // One row per distinct name.
    assert_eq!(rows.len(), 5);
    let charlie = rows
        .iter()
        .find(|r| r.get("name") == Some(&Value::String("Charlie Smith".into())))
        .expect("Charlie Smith group present");
    assert_eq!(charlie.get("COUNT(*)"), Some(&Value::Integer(2)));
}

#[test]
fn where_group_having_pipeline() {
    let mut engine = users_fixture();
    let rows = rows(
        &mut engine,
        "SELECT name, COUNT(*) FROM users \
         WHERE created_at >= '2024-01-02' GROUP BY name HAVING COUNT(*) > 1",
    );

    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("name"),
        Some(&Value::String("Charlie Smith".into()))
    );
    assert_eq!(rows[0].get("COUNT(*)"), Some(&Value::Integer(2)));
}

#[test]
fn update_then_read_back() {
    let mut engine = users_fixture();
    assert_eq!(
        affected(&mut engine, "UPDATE users SET email = 'x@y' WHERE id = 1"),
        1
    );

    let rows = rows(&mut engine, "SELECT email FROM users WHERE id = 1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("email"), Some(&Value::String("x@y".into())));
}

#[test]
fn delete_then_count() {
    let mut engine = users_fixture();
    assert_eq!(affected(&mut engine, "DELETE FROM users WHERE id = 2"), 1);

    let rows = rows(&mut engine, "SELECT COUNT(*) FROM users");
    assert_eq!(rows[0].get("COUNT(*)"), Some(&Value::Integer(5)));
}

#[test]
fn like_is_a_case_insensitive_glob() {
    let mut engine = users_fixture();
    let rows = rows(
        &mut engine,
        "SELECT name FROM users WHERE name LIKE '%Smith'",
    );

    let names: Vec<String> = rows
        .iter()
        .map(|r| r.get("name").unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Jane Smith", "Charlie Smith", "Charlie Smith"]
    );
}

#[test]
fn duplicate_column_fails_before_any_state_change() {
    let mut engine = Engine::in_memory();
    let out = engine.execute("CREATE TABLE t (a INT PRIMARY KEY, a VARCHAR)");
    assert!(out.starts_with("Error:"), "expected failure, got: {}", out);
    assert!(out.contains("duplicate column"), "got: {}", out);

    // Nothing was registered.
    let out = engine.execute("SELECT * FROM t");
    assert_eq!(out, "Error: Table 't' not found");
}

// ========== Beyond the core scenarios ==========

#[test]
fn insert_returns_inserted_rows() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY, v INT)");

    match engine.query("INSERT INTO t VALUES (1, 10), (2, 20)").unwrap() {
        QueryResult::Rows { columns, rows } => {
            assert_eq!(columns, vec!["id".to_string(), "v".to_string()]);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1].get("v"), Some(&Value::Integer(20)));
        }
        other => panic!("expected inserted rows, got {:?}", other),
    }
}

#[test]
fn insert_on_existing_key_upserts() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY, v INT)");
    exec_ok(&mut engine, "INSERT INTO t VALUES (1, 10)");
    exec_ok(&mut engine, "INSERT INTO t VALUES (1, 99)");

    let rows = rows(&mut engine, "SELECT v FROM t WHERE id = 1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("v"), Some(&Value::Integer(99)));
}

#[test]
fn arity_mismatch_is_rejected() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY, v INT)");

    let out = engine.execute("INSERT INTO t (id, v) VALUES (1)");
    assert_eq!(out, "Error: Column count 2 does not match value count 1");
}

#[test]
fn null_primary_key_is_rejected() {
    let mut engine = Engine::in_memory();
    exec_ok(
        &mut engine,
        "CREATE TABLE t (id INT PRIMARY KEY, v VARCHAR)",
    );

    let out = engine.execute("INSERT INTO t (v) VALUES ('x')");
    assert_eq!(out, "Error: Null value not allowed for column 'id'");
}

#[test]
fn not_null_columns_reject_missing_values() {
    let mut engine = Engine::in_memory();
    exec_ok(
        &mut engine,
        "CREATE TABLE t (id INT PRIMARY KEY, v VARCHAR NOT NULL)",
    );

    let out = engine.execute("INSERT INTO t (id) VALUES (1)");
    assert_eq!(out, "Error: Null value not allowed for column 'v'");
}

#[test]
fn type_mismatch_is_rejected() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY)");

    let out = engine.execute("INSERT INTO t VALUES ('not a number')");
    assert!(out.starts_with("Error: Cannot convert"), "got: {}", out);
}

#[test]
fn aliases_rename_output_columns() {
    let mut engine = users_fixture();
    let result = engine
        .query("SELECT name AS who, COUNT(*) AS n FROM users AS u GROUP BY name HAVING COUNT(*) > 1")
        .unwrap();
    match result {
        QueryResult::Rows { columns, rows } => {
            assert_eq!(columns, vec!["who".to_string(), "n".to_string()]);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get("n"), Some(&Value::Integer(2)));
        }
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn identifiers_are_case_insensitive() {
    let mut engine = users_fixture();
    let rows = rows(&mut engine, "SELECT NAME FROM USERS WHERE ID = 3");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("name"),
        Some(&Value::String("Bob Johnson".into()))
    );
}

#[test]
fn update_can_move_a_primary_key() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY, v INT)");
    exec_ok(&mut engine, "INSERT INTO t VALUES (1, 10), (2, 20)");

    assert_eq!(affected(&mut engine, "UPDATE t SET id = 9 WHERE id = 1"), 1);

    let all = rows(&mut engine, "SELECT id FROM t");
    let ids: Vec<String> = all.iter().map(|r| r.get("id").unwrap().to_string()).collect();
    assert_eq!(ids, vec!["2", "9"]);
}

#[test]
fn where_clause_arithmetic_and_boolean_logic() {
    let mut engine = users_fixture();
    let rows = rows(
        &mut engine,
        "SELECT id FROM users WHERE id % 2 = 0 AND id > 2 OR id = 1",
    );
    let ids: Vec<String> = rows.iter().map(|r| r.get("id").unwrap().to_string()).collect();
    assert_eq!(ids, vec!["1", "4", "6"]);
}

#[test]
fn division_by_zero_surfaces_as_error() {
    let mut engine = users_fixture();
    let out = engine.execute("SELECT id / 0 FROM users");
    assert_eq!(out, "Error: Division by zero");
}

#[test]
fn aggregates_without_group_by_collapse_to_one_row() {
    let mut engine = users_fixture();
    let rows = rows(
        &mut engine,
        "SELECT COUNT(*) AS n, MIN(id) AS lo, MAX(id) AS hi, AVG(id) AS mid FROM users",
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("n"), Some(&Value::Integer(6)));
    assert_eq!(rows[0].get("lo"), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get("hi"), Some(&Value::Integer(6)));
    assert_eq!(rows[0].get("mid").unwrap().to_string(), "3.5");
}

#[test]
fn aggregates_over_empty_table_return_null_and_zero() {
    let mut engine = Engine::in_memory();
    exec_ok(&mut engine, "CREATE TABLE t (id INT PRIMARY KEY)");

    let rows = rows(&mut engine, "SELECT COUNT(*) AS n, SUM(id) AS s FROM t");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("n"), Some(&Value::Integer(0)));
    assert_eq!(rows[0].get("s"), Some(&Value::Null));
}

#[test]
fn min_max_compare_dates_as_dates() {
    let mut engine = users_fixture();
    let rows = rows(
        &mut engine,
        "SELECT MIN(created_at) AS first, MAX(created_at) AS last FROM users",
    );
    assert_eq!(rows[0].get("first").unwrap().to_string(), "2024-01-01 09:00:00");
    assert_eq!(rows[0].get("last").unwrap().to_string(), "2024-01-05 14:00:00");
}

#[test]
fn drop_table_removes_it() {
    let mut engine = users_fixture();
    assert_eq!(engine.execute("DROP TABLE users"), "Query executed successfully");
    assert_eq!(
        engine.execute("SELECT * FROM users"),
        "Error: Table 'users' not found"
    );
    assert_eq!(
        engine.execute("DROP TABLE users"),
        "Error: Table 'users' not found"
    );
}

#[test]
fn select_star_renders_all_columns() {
    let mut engine = users_fixture();
    let result = engine.query("SELECT * FROM users WHERE id = 1").unwrap();
    match result {
        QueryResult::Rows { columns, rows } => {
            assert_eq!(
                columns,
                vec!["id", "name", "email", "created_at"]
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>()
            );
            assert_eq!(rows.len(), 1);
        }
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn empty_result_renders_no_rows_message() {
    let mut engine = users_fixture();
    assert_eq!(
        engine.execute("SELECT * FROM users WHERE id = 99"),
        "No rows returned."
    );
}
