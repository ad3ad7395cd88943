//! CYK indexer and decider (spec §4.2, §4.3): two lookup tables precomputed
//! once per CNF grammar, then consulted by the O(n^3 * |N|) membership
//! algorithm as many times as needed. `CykIndex` must be treated as
//! immutable for the lifetime of any decision built on top of it.

use std::collections::HashSet;

use crate::grammar::Grammar;
use crate::intern::{NtId, SymbolTable};
use crate::symbol::is_epsilon_production;

pub struct CykIndex {
    symtab: SymbolTable,
    /// terminal name -> nonterminals with a `A -> t` production.
    term_map: std::collections::HashMap<String, HashSet<NtId>>,
    /// (B, C) -> nonterminals with an `A -> B C` production. Keyed on the
    /// interned ids so the O(n^3) inner loop of `cyk_accepts` hashes a pair
    /// of `u32`s rather than a pair of `String`s.
    bin_map: std::collections::HashMap<(NtId, NtId), HashSet<NtId>>,
}

impl CykIndex {
    /// Builds the index from a grammar already in CNF. A pure function of
    /// the rule set: same rules (in any order) produce an index with the
    /// same accept behavior.
    pub fn build(g: &Grammar) -> CykIndex {
        let mut symtab = SymbolTable::new();
        let mut term_map: std::collections::HashMap<String, HashSet<NtId>> =
            std::collections::HashMap::new();
        let mut bin_map: std::collections::HashMap<(NtId, NtId), HashSet<NtId>> =
            std::collections::HashMap::new();

        for rule in &g.rules {
            let lhs = symtab.intern(&rule.lhs);
            for prod in &rule.rhs {
                if prod.len() == 1 && prod[0].is_terminal() && !is_epsilon_production(prod) {
                    term_map.entry(prod[0].name.clone()).or_default().insert(lhs);
                } else if prod.len() == 2 && prod[0].is_nonterminal() && prod[1].is_nonterminal() {
                    let b = symtab.intern(&prod[0].name);
                    let c = symtab.intern(&prod[1].name);
                    bin_map.entry((b, c)).or_default().insert(lhs);
                }
            }
        }

        CykIndex {
            symtab,
            term_map,
            bin_map,
        }
    }

    fn nt_id(&self, name: &str) -> Option<NtId> {
        self.symtab.id_of(name)
    }
}

/// Whether `g`'s `start` nonterminal has an `epsilon` alternative.
fn start_accepts_empty(g: &Grammar, start: &str) -> bool {
    g.rule(start)
        .map(|r| r.rhs.iter().any(|p| is_epsilon_production(p)))
        .unwrap_or(false)
}

/// Decides membership of a token sequence in `L(g)` with start symbol
/// `start`, given a precomputed `idx`.
pub fn cyk_accepts(g: &Grammar, idx: &CykIndex, start: &str, w: &[String]) -> bool {
    let n = w.len();

    if n == 0 {
        return start_accepts_empty(g, start);
    }

    let Some(start_id) = idx.nt_id(start) else {
        return false;
    };

    // T[i][len] (1-indexed len) holds the set of nonterminals deriving
    // w[i..i+len].
    let mut table: Vec<Vec<HashSet<NtId>>> = vec![vec![HashSet::new(); n + 1]; n];

    for i in 0..n {
        if let Some(producers) = idx.term_map.get(&w[i]) {
            table[i][1] = producers.clone();
        }
    }

    for len in 2..=n {
        for i in 0..=(n - len) {
            for k in 1..len {
                let left = &table[i][k];
                let right = &table[i + k][len - k];
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let mut additions: Vec<NtId> = Vec::new();
                for &b in left {
                    for &c in right {
                        if let Some(producers) = idx.bin_map.get(&(b, c)) {
                            additions.extend(producers.iter().copied());
                        }
                    }
                }
                table[i][len].extend(additions);
            }
        }
    }

    table[0][n].contains(&start_id)
}

/// Splits an ASCII/byte string into the one-token-per-byte sequence the
/// generator and decider both expect (spec §4.4).
pub fn tokenize_bytes(s: &str) -> Vec<String> {
    s.bytes().map(|b| (b as char).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::to_cnf;
    use crate::parser::Parser;

    fn build(src: &str) -> (Grammar, CykIndex) {
        let g = Parser::new(src).parse_grammar().unwrap();
        let g = to_cnf(g).unwrap();
        let idx = CykIndex::build(&g);
        (g, idx)
    }

    #[test]
    fn matching_parens_s1() {
        let (g, idx) = build("S -> \"(\" S \")\" S | epsilon ;");
        let start = g.start.clone();
        assert!(cyk_accepts(&g, &idx, &start, &tokenize_bytes("")));
        assert!(cyk_accepts(&g, &idx, &start, &tokenize_bytes("()")));
        assert!(!cyk_accepts(&g, &idx, &start, &tokenize_bytes("(()")));
    }

    #[test]
    fn epsilon_handling_s3() {
        let (g, idx) = build("S -> A B ; A -> \"a\" | epsilon ; B -> \"b\" | epsilon ;");
        let start = g.start.clone();
        for s in ["", "a", "b", "ab"] {
            assert!(cyk_accepts(&g, &idx, &start, &tokenize_bytes(s)), "{s}");
        }
        for s in ["ba", "aa", "bb"] {
            assert!(!cyk_accepts(&g, &idx, &start, &tokenize_bytes(s)), "{s}");
        }
    }

    #[test]
    fn unit_chain_s4() {
        let (g, idx) = build("S -> A ; A -> B ; B -> \"x\" ;");
        let start = g.start.clone();
        assert!(cyk_accepts(&g, &idx, &start, &tokenize_bytes("x")));
        assert!(!cyk_accepts(&g, &idx, &start, &tokenize_bytes("xx")));
    }

    #[test]
    fn long_binarized_production_s6() {
        let (g, idx) = build("S -> \"a\" \"b\" \"c\" \"d\" ;");
        let start = g.start.clone();
        assert!(cyk_accepts(&g, &idx, &start, &tokenize_bytes("abcd")));
        assert!(!cyk_accepts(&g, &idx, &start, &tokenize_bytes("abc")));
        assert!(!cyk_accepts(&g, &idx, &start, &tokenize_bytes("abcde")));
    }

    #[test]
    fn index_independent_of_rule_order() {
        let g1 = Parser::new("S -> \"a\" S | \"a\" ;").parse_grammar().unwrap();
        let g1 = to_cnf(g1).unwrap();
        let mut g2 = g1.clone();
        g2.rules.reverse();

        let idx1 = CykIndex::build(&g1);
        let idx2 = CykIndex::build(&g2);

        for s in ["a", "aa", "aaa", ""] {
            assert_eq!(
                cyk_accepts(&g1, &idx1, &g1.start, &tokenize_bytes(s)),
                cyk_accepts(&g2, &idx2, &g2.start, &tokenize_bytes(s)),
            );
        }
    }
}
