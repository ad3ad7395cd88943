//! Recursive-descent parser for the grammar source format (spec §6). Builds
//! a `Grammar` value; all other components only ever see the result.

use crate::error::{CfgError, Result};
use crate::grammar::{Grammar, Rule};
use crate::lexer::{Lexer, TokenKind};
use crate::symbol::{Production, Symbol};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(input),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<String> {
        let t = self.lexer.next_token()?;
        if t.kind != kind {
            return Err(CfgError::Syntax(format!(
                "expected {kind:?}, got {:?} ({:?})",
                t.kind, t.lexeme
            )));
        }
        Ok(t.lexeme)
    }

    /// `grammar -> ruleList END_OF_FILE`
    pub fn parse_grammar(mut self) -> Result<Grammar> {
        let mut rules: Vec<Rule> = Vec::new();

        loop {
            let (lhs, mut alts) = self.parse_rule()?;
            match rules.iter_mut().find(|r| r.lhs == lhs) {
                Some(existing) => existing.rhs.append(&mut alts),
                None => rules.push(Rule { lhs, rhs: alts }),
            }

            if self.lexer.peek()?.kind != TokenKind::Id {
                break;
            }
        }

        self.expect(TokenKind::Eof)?;

        let start = rules
            .first()
            .map(|r| r.lhs.clone())
            .ok_or_else(|| CfgError::Syntax("grammar has no rules".into()))?;

        let mut grammar = Grammar::new(start);
        grammar.rules = rules;
        grammar.rebuild_symbol_sets();
        Ok(grammar)
    }

    /// `rule -> ID ARROW rhs SEMICOLON`
    fn parse_rule(&mut self) -> Result<(String, Vec<Production>)> {
        let lhs = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Arrow)?;
        let rhs = self.parse_rhs()?;
        self.expect(TokenKind::Semicolon)?;
        Ok((lhs, rhs))
    }

    /// `rhs -> alternative | alternative OR rhs`
    fn parse_rhs(&mut self) -> Result<Vec<Production>> {
        let mut alts = vec![self.parse_alternative()?];
        while self.lexer.peek()?.kind == TokenKind::Or {
            self.lexer.next_token()?;
            alts.push(self.parse_alternative()?);
        }
        Ok(alts)
    }

    /// `alternative -> symbolList | EPSILON`
    fn parse_alternative(&mut self) -> Result<Production> {
        if self.lexer.peek()?.kind == TokenKind::Epsilon {
            self.lexer.next_token()?;
            return Ok(vec![Symbol::epsilon()]);
        }
        self.parse_symbol_list()
    }

    /// `symbolList -> symbol | symbol symbolList`
    fn parse_symbol_list(&mut self) -> Result<Production> {
        let mut symbols = vec![self.parse_symbol()?];
        loop {
            let kind = self.lexer.peek()?.kind;
            if kind == TokenKind::Id || kind == TokenKind::String {
                symbols.push(self.parse_symbol()?);
            } else {
                break;
            }
        }
        Ok(symbols)
    }

    /// `symbol -> ID | STRING`
    fn parse_symbol(&mut self) -> Result<Symbol> {
        let t = self.lexer.next_token()?;
        match t.kind {
            TokenKind::Id => Ok(Symbol::nonterminal(t.lexeme)),
            TokenKind::String => Ok(Symbol::terminal(t.lexeme)),
            other => Err(CfgError::Syntax(format!(
                "expected a symbol, got {other:?} ({:?})",
                t.lexeme
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_rules_sharing_an_lhs() {
        let g = Parser::new("S -> \"a\" ; S -> \"b\" ;").parse_grammar().unwrap();
        assert_eq!(g.rules.len(), 1);
        assert_eq!(g.rules[0].rhs.len(), 2);
    }

    #[test]
    fn start_is_lhs_of_first_rule() {
        let g = Parser::new("A -> \"x\" ; B -> \"y\" ;").parse_grammar().unwrap();
        assert_eq!(g.start, "A");
    }

    #[test]
    fn epsilon_alternative_parses_as_sole_symbol() {
        let g = Parser::new("S -> epsilon | \"a\" ;").parse_grammar().unwrap();
        assert_eq!(g.rules[0].rhs.len(), 2);
        assert!(g.rules[0].rhs[0][0].is_epsilon());
    }

    #[test]
    fn terminals_set_excludes_epsilon() {
        let g = Parser::new("S -> epsilon ;").parse_grammar().unwrap();
        assert!(!g.terminals.contains("epsilon"));
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let err = Parser::new("S -> \"a ;").parse_grammar();
        assert!(matches!(err, Err(CfgError::Syntax(_))));
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let err = Parser::new("S -> \"a\"").parse_grammar();
        assert!(matches!(err, Err(CfgError::Syntax(_))));
    }
}
