//! SQL parser
//!
//! Recursive descent over the token stream. The parser needs read access
//! to the catalog: an INSERT without a column list expands to the target
//! table's declared columns, which only the catalog knows.

use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::catalog::{Database, DataType};
use crate::error::{Error, Result};

/// SQL parser
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    db: &'a Database,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a SQL string
    pub fn new(sql: &str, db: &'a Database) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            db,
        })
    }

    /// Parse a single SQL statement. The statement must be terminated by
    /// `;` or the end of input.
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        if self.check(TokenKind::Semicolon) {
            self.advance();
        }
        if !self.is_at_end() {
            return Err(self.unexpected("end of statement"));
        }
        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current().kind {
            TokenKind::Select => self.parse_select().map(Statement::Select),
            TokenKind::Insert => self.parse_insert().map(Statement::Insert),
            TokenKind::Update => self.parse_update().map(Statement::Update),
            TokenKind::Delete => self.parse_delete().map(Statement::Delete),
            TokenKind::Create => self.parse_create_table().map(Statement::CreateTable),
            TokenKind::Drop => self.parse_drop_table().map(Statement::DropTable),
            _ => Err(self.unexpected("SELECT, INSERT, UPDATE, DELETE, CREATE, or DROP")),
        }
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(TokenKind::Select)?;

        let columns = self.parse_select_list()?;

        self.expect(TokenKind::From)?;
        let from = self.parse_table_reference()?;

        let where_clause = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        let group_by = if self.check(TokenKind::Group) {
            self.advance();
            self.expect(TokenKind::By)?;
            self.parse_identifier_list()?
        } else {
            Vec::new()
        };

        if self.check(TokenKind::Having) && group_by.is_empty() {
            return Err(self.error_here("HAVING requires a GROUP BY clause"));
        }
        let having = if self.check(TokenKind::Having) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        // Clause order is fixed: WHERE cannot follow GROUP BY.
        if self.check(TokenKind::Where) {
            return Err(self.error_here("WHERE clause must appear before GROUP BY"));
        }

        Ok(SelectStatement {
            columns,
            from,
            where_clause,
            group_by,
            having,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.check(TokenKind::Asterisk) {
            self.advance();
            return Ok(SelectItem::Wildcard);
        }

        let expr = self.parse_expr()?;
        let alias = if self.check(TokenKind::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Ok(SelectItem::Expr { expr, alias })
    }

    fn parse_table_reference(&mut self) -> Result<TableReference> {
        let name = self.expect_identifier()?;

        // Table aliases may be written with or without AS.
        let alias = if self.check(TokenKind::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if self.check(TokenKind::Identifier) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(TableReference { name, alias })
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(TokenKind::Insert)?;
        self.expect(TokenKind::Into)?;

        let table_name = self.expect_identifier()?;

        let columns = if self.check(TokenKind::LParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(TokenKind::RParen)?;
            cols
        } else {
            // No column list means every column in declared order.
            let table = self.db.get_table(&table_name)?;
            table
                .schema()
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        self.expect(TokenKind::Values)?;

        let mut values = Vec::new();
        loop {
            self.expect(TokenKind::LParen)?;
            values.push(self.parse_expr_list()?);
            self.expect(TokenKind::RParen)?;
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ========== UPDATE ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(TokenKind::Update)?;
        let table_name = self.expect_identifier()?;
        self.expect(TokenKind::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_expr()?;
            assignments.push(Assignment { column, value });
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        let where_clause = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    // ========== DELETE ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(TokenKind::Delete)?;
        self.expect(TokenKind::From)?;
        let table_name = self.expect_identifier()?;

        let where_clause = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== CREATE / DROP ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(TokenKind::Create)?;
        self.expect(TokenKind::Table)?;
        let table_name = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;

        let mut primary_key = false;
        let mut not_null = false;
        loop {
            if self.check(TokenKind::Primary) {
                self.advance();
                self.expect(TokenKind::Key)?;
                primary_key = true;
            } else if self.check(TokenKind::Not) {
                self.advance();
                // NULL is not a keyword in this dialect; match it by text.
                if self.check(TokenKind::Identifier)
                    && self.current().text.eq_ignore_ascii_case("null")
                {
                    self.advance();
                    not_null = true;
                } else {
                    return Err(self.unexpected("NULL"));
                }
            } else {
                break;
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            primary_key,
            not_null,
        })
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let kind = self.current().kind;
        let data_type = match kind {
            TokenKind::Int => DataType::Int,
            TokenKind::Varchar => DataType::Varchar,
            TokenKind::Text => DataType::Text,
            TokenKind::Decimal => DataType::Decimal,
            TokenKind::Boolean => DataType::Boolean,
            TokenKind::DateTime => DataType::DateTime,
            TokenKind::Date => DataType::Date,
            _ => return Err(self.unexpected("data type")),
        };
        self.advance();

        // VARCHAR(100) and DECIMAL(10, 2) are accepted for compatibility;
        // the engine stores unsized types, so the numbers are discarded.
        if matches!(kind, TokenKind::Varchar | TokenKind::Decimal)
            && self.check(TokenKind::LParen)
        {
            self.advance();
            self.expect(TokenKind::Number)?;
            if self.check(TokenKind::Comma) {
                self.advance();
                self.expect(TokenKind::Number)?;
            }
            self.expect(TokenKind::RParen)?;
        }

        Ok(data_type)
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect(TokenKind::Drop)?;
        self.expect(TokenKind::Table)?;
        let table_name = self.expect_identifier()?;
        Ok(DropTableStatement { table_name })
    }

    // ========== Expressions ==========

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expr()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_comparison_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Comparisons do not chain: at most one operator at this level.
    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let left = self.parse_additive_expr()?;

        let op = match self.current().kind {
            TokenKind::Eq => Some(BinaryOperator::Eq),
            TokenKind::Neq => Some(BinaryOperator::Neq),
            TokenKind::Lt => Some(BinaryOperator::Lt),
            TokenKind::Lte => Some(BinaryOperator::Lte),
            TokenKind::Gt => Some(BinaryOperator::Gt),
            TokenKind::Gte => Some(BinaryOperator::Gte),
            TokenKind::Like => Some(BinaryOperator::Like),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let right = self.parse_additive_expr()?;
                Ok(Expr::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                })
            }
            None => Ok(left),
        }
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_primary_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Asterisk => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_primary_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Literal(parse_number(&token)?))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::Literal(Literal::String(token.text)))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier(token.text))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            kind if kind.is_aggregate() => self.parse_aggregate(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_aggregate(&mut self) -> Result<Expr> {
        let func = match self.current().kind {
            TokenKind::Count => AggregateFunc::Count,
            TokenKind::Sum => AggregateFunc::Sum,
            TokenKind::Avg => AggregateFunc::Avg,
            TokenKind::Min => AggregateFunc::Min,
            TokenKind::Max => AggregateFunc::Max,
            _ => return Err(self.unexpected("aggregate function")),
        };
        self.advance();

        self.expect(TokenKind::LParen)?;
        let arg = if self.check(TokenKind::Asterisk) {
            self.advance();
            AggregateArg::Star
        } else {
            AggregateArg::Expr(Box::new(self.parse_expr()?))
        };
        self.expect(TokenKind::RParen)?;

        Ok(Expr::Aggregate { func, arg })
    }

    // ========== Helpers ==========

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expr()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(exprs)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        loop {
            names.push(self.expect_identifier()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(names)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        self.expect(TokenKind::Identifier).map(|t| t.text)
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_here(format!("expected {}, found '{}'", expected, self.current()))
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let token = self.current();
        Error::SyntaxError {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Convert a numeric token into a literal: integers stay integral,
/// anything with a decimal point (or beyond i32 range) becomes a decimal.
fn parse_number(token: &Token) -> Result<Literal> {
    if !token.text.contains('.') {
        if let Ok(i) = token.text.parse::<i32>() {
            return Ok(Literal::Integer(i));
        }
    }
    token
        .text
        .parse()
        .map(Literal::Decimal)
        .map_err(|_| Error::SyntaxError {
            message: format!("invalid number '{}'", token.text),
            line: token.line,
            column: token.column,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;
    use crate::storage::Table;

    fn empty_db() -> Database {
        Database::new()
    }

    fn db_with_users() -> Database {
        let mut db = Database::new();
        db.create_table(
            Table::new(
                "users",
                vec![
                    Column::new("id", DataType::Int).primary_key(true),
                    Column::new("name", DataType::Varchar),
                ],
            )
            .unwrap(),
        )
        .unwrap();
        db
    }

    fn parse(sql: &str, db: &Database) -> Result<Statement> {
        Parser::new(sql, db)?.parse()
    }

    #[test]
    fn test_parse_simple_select() {
        let db = empty_db();
        let stmt = parse("SELECT * FROM users", &db).unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.columns, vec![SelectItem::Wildcard]);
                assert_eq!(s.from.name, "users");
                assert!(s.from.alias.is_none());
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_with_alias() {
        let db = empty_db();
        for sql in ["SELECT id FROM users AS u", "SELECT id FROM users u"] {
            match parse(sql, &db).unwrap() {
                Statement::Select(s) => {
                    assert_eq!(s.from.alias.as_deref(), Some("u"));
                }
                other => panic!("expected SELECT, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_group_by_having() {
        let db = empty_db();
        let stmt = parse(
            "SELECT name, COUNT(*) AS c FROM users GROUP BY name HAVING COUNT(*) > 1",
            &db,
        )
        .unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.group_by, vec!["name".to_string()]);
                assert!(s.having.is_some());
                assert!(matches!(
                    &s.columns[1],
                    SelectItem::Expr {
                        alias: Some(a),
                        ..
                    } if a == "c"
                ));
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_where_after_group_by_rejected() {
        let db = empty_db();
        let err = parse(
            "SELECT name FROM users GROUP BY name WHERE name = 'x'",
            &db,
        )
        .unwrap_err();
        match err {
            Error::SyntaxError { column, .. } => {
                // The error points at the offending WHERE token.
                assert_eq!(column, 38);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_having_without_group_by_rejected() {
        let db = empty_db();
        let err = parse("SELECT name FROM users HAVING COUNT(*) > 1", &db).unwrap_err();
        assert!(matches!(err, Error::SyntaxError { column: 24, .. }));
    }

    #[test]
    fn test_insert_with_explicit_columns() {
        let db = empty_db();
        let stmt = parse(
            "INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob')",
            &db,
        )
        .unwrap();
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, vec!["id".to_string(), "name".to_string()]);
                assert_eq!(i.values.len(), 2);
            }
            other => panic!("expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_without_columns_consults_catalog() {
        let db = db_with_users();
        let stmt = parse("INSERT INTO users VALUES (1, 'Alice')", &db).unwrap();
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, vec!["id".to_string(), "name".to_string()]);
            }
            other => panic!("expected INSERT, got {:?}", other),
        }

        let err = parse("INSERT INTO missing VALUES (1)", &empty_db()).unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_parse_create_table() {
        let db = empty_db();
        let stmt = parse(
            "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(100) NOT NULL, bio TEXT)",
            &db,
        )
        .unwrap();
        match stmt {
            Statement::CreateTable(ct) => {
                assert_eq!(ct.table_name, "users");
                assert_eq!(ct.columns.len(), 3);
                assert!(ct.columns[0].primary_key);
                assert!(ct.columns[1].not_null);
                assert_eq!(ct.columns[1].data_type, DataType::Varchar);
            }
            other => panic!("expected CREATE TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_and_delete() {
        let db = empty_db();
        match parse("UPDATE users SET name = 'x', id = 2 WHERE id = 1", &db).unwrap() {
            Statement::Update(u) => {
                assert_eq!(u.assignments.len(), 2);
                assert!(u.where_clause.is_some());
            }
            other => panic!("expected UPDATE, got {:?}", other),
        }

        match parse("DELETE FROM users", &db).unwrap() {
            Statement::Delete(d) => assert!(d.where_clause.is_none()),
            other => panic!("expected DELETE, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_precedence() {
        let db = empty_db();
        let stmt = parse("SELECT a + b * c FROM t", &db).unwrap();
        let Statement::Select(s) = stmt else {
            panic!("expected SELECT");
        };
        let SelectItem::Expr { expr, .. } = &s.columns[0] else {
            panic!("expected expression item");
        };
        // Multiplication binds tighter than addition.
        match expr {
            Expr::BinaryOp { op, right, .. } => {
                assert_eq!(*op, BinaryOperator::Add);
                assert!(matches!(
                    right.as_ref(),
                    Expr::BinaryOp {
                        op: BinaryOperator::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected binary op, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let db = empty_db();
        assert!(parse("SELECT * FROM t garbage extra", &db).is_err());
        assert!(parse("DROP TABLE t; SELECT", &db).is_err());
    }

    #[test]
    fn test_pretty_print_round_trip() {
        let db = db_with_users();
        let statements = [
            "SELECT * FROM users",
            "SELECT id, name AS who FROM users AS u WHERE id >= 2 AND name LIKE '%ith'",
            "SELECT name, COUNT(*) AS c FROM users GROUP BY name HAVING COUNT(*) > 1",
            "SELECT (a + b) * c FROM t",
            "SELECT SUM(price * qty) AS total FROM t WHERE a = 1 OR b = 2 AND c = 3",
            r"INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'it\'s')",
            "INSERT INTO users VALUES (3, 'Carol')",
            "UPDATE users SET name = 'x', id = id + 1 WHERE id = 1",
            "DELETE FROM users WHERE id % 2 = 0",
            "CREATE TABLE t (id INT PRIMARY KEY, v DECIMAL, note TEXT NOT NULL)",
            "DROP TABLE t",
        ];
        for sql in statements {
            let first = parse(sql, &db)
                .unwrap_or_else(|e| panic!("parse of '{}' failed: {}", sql, e));
            let printed = first.to_string();
            let second = parse(&printed, &db)
                .unwrap_or_else(|e| panic!("reparse of '{}' failed: {}", printed, e));
            assert_eq!(first, second, "round trip changed '{}'", sql);
        }
    }
}
