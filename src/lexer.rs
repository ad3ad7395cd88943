//! Hand-rolled lexer for the grammar source format described in spec §6:
//!
//! ```text
//! grammar     -> ruleList END_OF_FILE
//! ruleList    -> rule | rule ruleList
//! rule        -> ID ARROW rhs SEMICOLON
//! rhs         -> alternative | alternative OR rhs
//! alternative -> symbolList | EPSILON
//! symbolList  -> symbol | symbol symbolList
//! symbol      -> ID | STRING
//! ```
//!
//! This is external parser glue (spec §1 calls it out of the core's scope)
//! kept in-crate so the binary is self-contained.

use crate::error::{CfgError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Id,
    Epsilon,
    String,
    Arrow,
    Or,
    Semicolon,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
        }
    }
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        self.scan()
    }

    pub fn peek(&mut self) -> Result<Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan()?);
        }
        Ok(self.peeked.clone().unwrap())
    }

    fn scan(&mut self) -> Result<Token> {
        while self.pos < self.input.len() && (self.input[self.pos] as char).is_whitespace() {
            self.pos += 1;
        }

        if self.pos >= self.input.len() {
            return Ok(Token::new(TokenKind::Eof, ""));
        }

        let c = self.input[self.pos] as char;

        if c == '-' && self.pos + 1 < self.input.len() && self.input[self.pos + 1] as char == '>' {
            self.pos += 2;
            return Ok(Token::new(TokenKind::Arrow, "->"));
        }

        if c == '|' {
            self.pos += 1;
            return Ok(Token::new(TokenKind::Or, "|"));
        }

        if c == ';' {
            self.pos += 1;
            return Ok(Token::new(TokenKind::Semicolon, ";"));
        }

        if c == '"' {
            self.pos += 1;
            let start = self.pos;
            while self.pos < self.input.len() && self.input[self.pos] as char != '"' {
                self.pos += 1;
            }
            if self.pos >= self.input.len() {
                return Err(CfgError::Syntax("unterminated string literal".into()));
            }
            let lexeme = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
            self.pos += 1;
            return Ok(Token::new(TokenKind::String, lexeme));
        }

        if c.is_alphabetic() || c == '_' {
            let start = self.pos;
            while self.pos < self.input.len() {
                let ch = self.input[self.pos] as char;
                if ch.is_alphanumeric() || ch == '_' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let lexeme = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
            if lexeme == "epsilon" {
                return Ok(Token::new(TokenKind::Epsilon, lexeme));
            }
            return Ok(Token::new(TokenKind::Id, lexeme));
        }

        Err(CfgError::Syntax(format!(
            "unexpected character in input: {c}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token().unwrap();
            let done = t.kind == TokenKind::Eof;
            out.push(t.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_a_simple_rule() {
        let got = kinds(r#"S -> "a" S | epsilon ;"#);
        use TokenKind::*;
        assert_eq!(
            got,
            vec![Id, Arrow, String, Id, Or, Epsilon, Semicolon, Eof]
        );
    }

    #[test]
    fn epsilon_identifier_is_its_own_token_kind() {
        let mut lexer = Lexer::new("epsilon");
        let t = lexer.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Epsilon);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("S ->");
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::Id);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Id);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Arrow);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new(r#""unterminated"#);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let mut lexer = Lexer::new("@");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn whitespace_between_tokens_is_skipped() {
        let got = kinds("  S   ->\n\t\"x\"  ;  ");
        assert_eq!(
            got,
            vec![
                TokenKind::Id,
                TokenKind::Arrow,
                TokenKind::String,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }
}
