//! SQL lexer (tokenizer)
//!
//! This module converts SQL strings into a stream of tokens, tracking the
//! line and column of every token for error reporting.

use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// SQL lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
    /// Current line (1-based)
    line: usize,
    /// Current column (1-based)
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input, ending with an EOF token
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the next token from the input
    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, "", self.line, self.column));
        }

        let (line, column) = (self.line, self.column);
        let ch = self.current_char();

        let simple = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Asterisk),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '=' => Some(TokenKind::Eq),
            _ => None,
        };
        if let Some(kind) = simple {
            self.advance();
            return Ok(Token::new(kind, ch.to_string(), line, column));
        }

        match ch {
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::new(TokenKind::Lte, "<=", line, column))
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token::new(TokenKind::Neq, "<>", line, column))
                    }
                    _ => Ok(Token::new(TokenKind::Lt, "<", line, column)),
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenKind::Gte, ">=", line, column))
                } else {
                    Ok(Token::new(TokenKind::Gt, ">", line, column))
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenKind::Neq, "!=", line, column))
                } else {
                    Err(self.error_at("unexpected character '!'", line, column))
                }
            }
            '\'' | '"' => self.read_string(ch),
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if ch.is_alphabetic() || ch == '_' => Ok(self.read_identifier()),
            _ => {
                self.advance();
                Err(self.error_at(format!("unexpected character '{}'", ch), line, column))
            }
        }
    }

    fn error_at(&self, message: impl Into<String>, line: usize, column: usize) -> Error {
        Error::LexError {
            message: message.into(),
            line,
            column,
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Peek at the current character without consuming it
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.input.get(self.position) {
            if *ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a string literal. Either quote character delimits a string; a
    /// backslash escapes the closing quote character or another backslash.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote

        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch == '\\' {
                self.advance();
                match self.peek() {
                    Some(next) if next == quote || next == '\\' => {
                        value.push(next);
                        self.advance();
                    }
                    Some(next) => {
                        // Unknown escapes keep the backslash verbatim.
                        value.push('\\');
                        value.push(next);
                        self.advance();
                    }
                    None => break,
                }
            } else if ch == quote {
                self.advance();
                return Ok(Token::new(TokenKind::StringLiteral, value, line, column));
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(self.error_at("unterminated string literal", line, column))
    }

    /// Read a numeric literal: digits with at most one decimal point
    fn read_number(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let mut value = String::new();
        let mut seen_dot = false;

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // "1." is malformed: a dot must be followed by digits.
        if value.ends_with('.') {
            return Err(self.error_at(format!("invalid number '{}'", value), line, column));
        }

        Ok(Token::new(TokenKind::Number, value, line, column))
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = TokenKind::from_keyword(&value).unwrap_or(TokenKind::Identifier);
        Token::new(kind, value, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        Lexer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            kinds("SELECT * FROM users"),
            vec![
                TokenKind::Select,
                TokenKind::Asterisk,
                TokenKind::From,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_positions() {
        let tokens = Lexer::new("SELECT id\nFROM users").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 8));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 1));
        assert_eq!(tokens[2].kind, TokenKind::From);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a = b <> c != d < e <= f > g >= h"),
            vec![
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Identifier,
                TokenKind::Neq,
                TokenKind::Identifier,
                TokenKind::Neq,
                TokenKind::Identifier,
                TokenKind::Lt,
                TokenKind::Identifier,
                TokenKind::Lte,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::Identifier,
                TokenKind::Gte,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals_both_quotes() {
        let tokens = Lexer::new("'hello' \"world\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].text, "world");
    }

    #[test]
    fn test_escaped_quote() {
        let tokens = Lexer::new(r"'it\'s'").tokenize().unwrap();
        assert_eq!(tokens[0].text, "it's");

        let tokens = Lexer::new(r#""a \" b""#).tokenize().unwrap();
        assert_eq!(tokens[0].text, "a \" b");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("SELECT 'oops").tokenize().unwrap_err();
        match err {
            Error::LexError { line, column, .. } => {
                assert_eq!((line, column), (1, 8));
            }
            other => panic!("expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.14").tokenize().unwrap();
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].text, "3.14");

        // A second dot ends the number; the dangling dot is then rejected.
        assert!(Lexer::new("1.2.3").tokenize().is_err());
        assert!(Lexer::new("7.").tokenize().is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("SELECT @").tokenize().unwrap_err();
        assert!(matches!(err, Error::LexError { column: 8, .. }));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("select FROM Group bY"),
            vec![
                TokenKind::Select,
                TokenKind::From,
                TokenKind::Group,
                TokenKind::By,
                TokenKind::Eof,
            ]
        );
    }
}
