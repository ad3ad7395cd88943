//! The grammar's smallest unit: a tagged `(kind, name)` pair.

use std::fmt;

/// The reserved terminal name that denotes the empty string. It may only
/// occur as the sole symbol of a production.
pub const EPSILON: &str = "epsilon";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Symbol {
        Symbol {
            kind: SymbolKind::Terminal,
            name: name.into(),
        }
    }

    pub fn nonterminal(name: impl Into<String>) -> Symbol {
        Symbol {
            kind: SymbolKind::Nonterminal,
            name: name.into(),
        }
    }

    pub fn epsilon() -> Symbol {
        Symbol::terminal(EPSILON)
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }

    pub fn is_nonterminal(&self) -> bool {
        self.kind == SymbolKind::Nonterminal
    }

    pub fn is_epsilon(&self) -> bool {
        self.is_terminal() && self.name == EPSILON
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Terminal if self.name != EPSILON => write!(f, "\"{}\"", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// A single right-hand side: an ordered sequence of symbols.
pub type Production = Vec<Symbol>;

/// True for a length-1 production whose sole symbol is the epsilon terminal.
pub fn is_epsilon_production(prod: &[Symbol]) -> bool {
    prod.len() == 1 && prod[0].is_epsilon()
}

/// True for a length-1 production whose sole symbol is a nonterminal.
pub fn is_unit_production(prod: &[Symbol]) -> bool {
    prod.len() == 1 && prod[0].is_nonterminal()
}

/// Number of non-epsilon terminal occurrences in a production.
pub fn count_terminals(prod: &[Symbol]) -> usize {
    prod.iter().filter(|s| s.is_terminal() && !s.is_epsilon()).count()
}

/// Number of nonterminal occurrences in a production.
pub fn count_nonterminals(prod: &[Symbol]) -> usize {
    prod.iter().filter(|s| s.is_nonterminal()).count()
}

/// A canonical string key for deduplicating alternatives, independent of
/// any particular `Hash`/`Eq` derive on `Symbol`.
pub fn production_key(prod: &[Symbol]) -> String {
    let mut key = String::with_capacity(prod.len() * 8);
    for s in prod {
        key.push(if s.is_terminal() { 'T' } else { 'N' });
        key.push(':');
        key.push_str(&s.name);
        key.push('|');
    }
    key
}
