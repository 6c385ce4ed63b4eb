//! SQL token definitions
//!
//! This module defines all tokens that can appear in SQL statements. Every
//! token carries its literal text and the line/column it started at.

use std::fmt;

/// SQL token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ========== Keywords ==========
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Table,
    From,
    Where,
    Into,
    Values,
    Set,
    And,
    Or,
    Not,
    Primary,
    Key,
    Int,
    Varchar,
    Text,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Like,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Group,
    By,
    Having,
    As,

    // ========== Literals ==========
    /// Numeric literal (integer or decimal)
    Number,
    /// Quoted string literal
    StringLiteral,
    /// Identifier (table name, column name, etc.)
    Identifier,

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// <=
    Lte,
    /// >
    Gt,
    /// >=
    Gte,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Asterisk,
    /// /
    Slash,
    /// %
    Percent,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl TokenKind {
    /// Try to match a keyword (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(TokenKind::Select),
            "INSERT" => Some(TokenKind::Insert),
            "UPDATE" => Some(TokenKind::Update),
            "DELETE" => Some(TokenKind::Delete),
            "CREATE" => Some(TokenKind::Create),
            "DROP" => Some(TokenKind::Drop),
            "TABLE" => Some(TokenKind::Table),
            "FROM" => Some(TokenKind::From),
            "WHERE" => Some(TokenKind::Where),
            "INTO" => Some(TokenKind::Into),
            "VALUES" => Some(TokenKind::Values),
            "SET" => Some(TokenKind::Set),
            "AND" => Some(TokenKind::And),
            "OR" => Some(TokenKind::Or),
            "NOT" => Some(TokenKind::Not),
            "PRIMARY" => Some(TokenKind::Primary),
            "KEY" => Some(TokenKind::Key),
            "INT" => Some(TokenKind::Int),
            "VARCHAR" => Some(TokenKind::Varchar),
            "TEXT" => Some(TokenKind::Text),
            "DECIMAL" => Some(TokenKind::Decimal),
            "BOOLEAN" => Some(TokenKind::Boolean),
            "DATETIME" => Some(TokenKind::DateTime),
            "DATE" => Some(TokenKind::Date),
            "LIKE" => Some(TokenKind::Like),
            "COUNT" => Some(TokenKind::Count),
            "SUM" => Some(TokenKind::Sum),
            "AVG" => Some(TokenKind::Avg),
            "MIN" => Some(TokenKind::Min),
            "MAX" => Some(TokenKind::Max),
            "GROUP" => Some(TokenKind::Group),
            "BY" => Some(TokenKind::By),
            "HAVING" => Some(TokenKind::Having),
            "AS" => Some(TokenKind::As),
            _ => None,
        }
    }

    /// Check if this token names an aggregate function
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            TokenKind::Count | TokenKind::Sum | TokenKind::Avg | TokenKind::Min | TokenKind::Max
        )
    }

    /// Check if this token names a data type
    pub fn is_type_name(&self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Varchar
                | TokenKind::Text
                | TokenKind::Decimal
                | TokenKind::Boolean
                | TokenKind::DateTime
                | TokenKind::Date
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Select => "SELECT",
            TokenKind::Insert => "INSERT",
            TokenKind::Update => "UPDATE",
            TokenKind::Delete => "DELETE",
            TokenKind::Create => "CREATE",
            TokenKind::Drop => "DROP",
            TokenKind::Table => "TABLE",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::Into => "INTO",
            TokenKind::Values => "VALUES",
            TokenKind::Set => "SET",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Primary => "PRIMARY",
            TokenKind::Key => "KEY",
            TokenKind::Int => "INT",
            TokenKind::Varchar => "VARCHAR",
            TokenKind::Text => "TEXT",
            TokenKind::Decimal => "DECIMAL",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::DateTime => "DATETIME",
            TokenKind::Date => "DATE",
            TokenKind::Like => "LIKE",
            TokenKind::Count => "COUNT",
            TokenKind::Sum => "SUM",
            TokenKind::Avg => "AVG",
            TokenKind::Min => "MIN",
            TokenKind::Max => "MAX",
            TokenKind::Group => "GROUP",
            TokenKind::By => "BY",
            TokenKind::Having => "HAVING",
            TokenKind::As => "AS",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Eq => "=",
            TokenKind::Neq => "<>",
            TokenKind::Lt => "<",
            TokenKind::Lte => "<=",
            TokenKind::Gt => ">",
            TokenKind::Gte => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", text)
    }
}

/// A lexed token with its source position (1-based line and column)
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "{}", self.text),
        }
    }
}
