//! The `Rule`/`Grammar` model every CNF stage and the CYK/generator code
//! consumes. Construction is the parser's job; everything past that point
//! treats a `Grammar` as a value to be folded through transformation stages.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;

use crate::symbol::{Production, Symbol};

/// One nonterminal's complete set of alternatives. Multiple source rules
/// sharing an LHS are merged into a single `Rule` by the parser, so every
/// later stage may assume at most one `Rule` per `lhs`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: String,
    pub rhs: Vec<Production>,
}

impl Rule {
    pub fn new(lhs: impl Into<String>) -> Rule {
        Rule {
            lhs: lhs.into(),
            rhs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    pub rules: Vec<Rule>,
    pub terminals: HashSet<String>,
    pub nonterminals: HashSet<String>,
    pub start: String,
}

impl Grammar {
    /// An empty grammar with the given start symbol name; `rules` must be
    /// populated (and `rebuild_symbol_sets` called) before use.
    pub fn new(start: impl Into<String>) -> Grammar {
        Grammar {
            rules: Vec::new(),
            terminals: HashSet::new(),
            nonterminals: HashSet::new(),
            start: start.into(),
        }
    }

    pub fn rule(&self, lhs: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.lhs == lhs)
    }

    pub fn rule_mut(&mut self, lhs: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.lhs == lhs)
    }

    /// Recomputes `terminals`/`nonterminals` from `rules`. Must be invoked
    /// after any transformation that alters `rules` in place.
    pub fn rebuild_symbol_sets(&mut self) {
        self.terminals.clear();
        self.nonterminals.clear();

        for rule in &self.rules {
            self.nonterminals.insert(rule.lhs.clone());
            for prod in &rule.rhs {
                for symbol in prod {
                    if symbol.is_terminal() {
                        if !symbol.is_epsilon() {
                            self.terminals.insert(symbol.name.clone());
                        }
                    } else {
                        self.nonterminals.insert(symbol.name.clone());
                    }
                }
            }
        }
    }

    /// Picks a nonterminal name not already in `nonterminals`, trying `base`,
    /// then `base_1`, `base_2`, ... The fresh-name discipline every helper
    /// introducing stage relies on.
    pub fn fresh_nonterminal(&self, base: &str) -> String {
        if !self.nonterminals.contains(base) {
            return base.to_string();
        }
        for i in 1.. {
            let candidate = format!("{base}_{i}");
            if !self.nonterminals.contains(&candidate) {
                return candidate;
            }
        }
        unreachable!()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            let alts = rule
                .rhs
                .iter()
                .map(|prod| prod.iter().map(Symbol::to_string).join(" "));
            writeln!(f, "{} -> {} ;", rule.lhs, alts.format(" | "))?;
        }
        Ok(())
    }
}
