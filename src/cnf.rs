//! The six-stage Chomsky Normal Form transformer (spec §4.1). Stages run in
//! a fixed order — `START`, `DEL`, `UNIT`, `USELESS`, `TERM`, `BIN` — because
//! later stages depend on invariants only the earlier ones establish (most
//! notably: running `UNIT` before `DEL` can miss unit productions that only
//! appear once nullable symbols are elided).

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{CfgError, Result};
use crate::grammar::{Grammar, Rule};
use crate::symbol::{
    is_epsilon_production, is_unit_production, production_key, Production, Symbol,
};

/// Runs all six stages and returns a grammar in Chomsky Normal Form.
pub fn to_cnf(mut g: Grammar) -> Result<Grammar> {
    fresh_start(&mut g);
    debug!("START: new start symbol {}", g.start);

    remove_epsilon(&mut g)?;
    debug!("DEL: eliminated epsilon productions");

    remove_unit(&mut g);
    debug!("UNIT: eliminated unit productions");

    remove_useless(&mut g);
    debug!(
        "USELESS: {} nonterminals remain reachable and generating",
        g.nonterminals.len()
    );

    lift_terminals(&mut g);
    debug!("TERM: terminals lifted out of long productions");

    binarize(&mut g);
    debug!("BIN: productions binarized");

    Ok(g)
}

/// `START` — prepend `S0 -> oldStart` with a fresh `S0`, so the start symbol
/// never appears on any RHS (a precondition for safely adding `S0 -> epsilon`
/// later).
pub fn fresh_start(g: &mut Grammar) {
    let new_start = g.fresh_nonterminal("S0");

    let mut rule = Rule::new(new_start.clone());
    rule.rhs.push(vec![Symbol::nonterminal(g.start.clone())]);

    g.rules.insert(0, rule);
    g.nonterminals.insert(new_start.clone());
    g.start = new_start;
}

fn compute_nullable(g: &Grammar) -> Result<HashSet<String>> {
    let mut nullable: HashSet<String> = HashSet::new();

    for rule in &g.rules {
        for prod in &rule.rhs {
            if is_epsilon_production(prod) {
                nullable.insert(rule.lhs.clone());
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for rule in &g.rules {
            if nullable.contains(&rule.lhs) {
                continue;
            }
            for prod in &rule.rhs {
                if is_epsilon_production(prod) {
                    continue;
                }
                let mut all_nullable = true;
                for symbol in prod {
                    if symbol.is_epsilon() {
                        return Err(CfgError::Semantic(
                            "epsilon appeared mixed with other symbols in a production".into(),
                        ));
                    }
                    if symbol.is_terminal() || !nullable.contains(&symbol.name) {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable {
                    nullable.insert(rule.lhs.clone());
                    changed = true;
                    break;
                }
            }
        }
    }

    Ok(nullable)
}

/// `DEL` — epsilon elimination: enumerate every subset of nullable-nonterminal
/// positions in each alternative, keeping the variant with those positions
/// deleted. Preserves a single `Start -> epsilon` iff the (new) start symbol
/// was nullable.
pub fn remove_epsilon(g: &mut Grammar) -> Result<()> {
    let nullable = compute_nullable(g)?;
    let keep_start_epsilon = nullable.contains(&g.start);
    let start = g.start.clone();

    for rule in &mut g.rules {
        let mut new_alts: Vec<Production> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for prod in &rule.rhs {
            if is_epsilon_production(prod) {
                continue;
            }

            let nullable_positions: Vec<usize> = prod
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_nonterminal() && nullable.contains(&s.name))
                .map(|(i, _)| i)
                .collect();

            if seen.insert(production_key(prod)) {
                new_alts.push(prod.clone());
            }

            let m = nullable_positions.len();
            if m >= 64 {
                return Err(CfgError::Semantic(format!(
                    "production for {} has {m} nullable positions, too many to bitmask-enumerate",
                    rule.lhs
                )));
            }
            let total_masks: u64 = 1u64 << m;

            for mask in 1..total_masks {
                let mut candidate: Production = Vec::with_capacity(prod.len());
                for (i, symbol) in prod.iter().enumerate() {
                    let delete_this = nullable_positions
                        .iter()
                        .position(|&p| p == i)
                        .map(|j| mask & (1u64 << j) != 0)
                        .unwrap_or(false);
                    if !delete_this {
                        candidate.push(symbol.clone());
                    }
                }

                if candidate.is_empty() {
                    if keep_start_epsilon && rule.lhs == start {
                        let eps = vec![Symbol::epsilon()];
                        if seen.insert(production_key(&eps)) {
                            new_alts.push(eps);
                        }
                    }
                    continue;
                }

                if seen.insert(production_key(&candidate)) {
                    new_alts.push(candidate);
                }
            }
        }

        if keep_start_epsilon && rule.lhs == start {
            let eps = vec![Symbol::epsilon()];
            if !new_alts.iter().any(|a| is_epsilon_production(a)) {
                new_alts.push(eps);
            }
        }

        rule.rhs = new_alts;
    }

    Ok(())
}

fn unit_closure(g: &Grammar, index: &HashMap<&str, usize>, start: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack = vec![start.to_string()];
    seen.insert(start.to_string());

    while let Some(a) = stack.pop() {
        let Some(&i) = index.get(a.as_str()) else {
            continue;
        };
        for prod in &g.rules[i].rhs {
            if is_unit_production(prod) {
                let b = prod[0].name.clone();
                if seen.insert(b.clone()) {
                    stack.push(b);
                }
            }
        }
    }

    seen
}

/// `UNIT` — for every nonterminal, replace its alternatives with the
/// deduplicated union of all non-unit alternatives reachable via unit
/// productions.
pub fn remove_unit(g: &mut Grammar) {
    let index: HashMap<&str, usize> = g
        .rules
        .iter()
        .enumerate()
        .map(|(i, r)| (r.lhs.as_str(), i))
        .collect();

    let closures: HashMap<String, HashSet<String>> = g
        .rules
        .iter()
        .map(|r| (r.lhs.clone(), unit_closure(g, &index, &r.lhs)))
        .collect();

    let mut new_rhs: Vec<Vec<Production>> = Vec::with_capacity(g.rules.len());

    for rule in &g.rules {
        let mut alts: Vec<Production> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for b in &closures[&rule.lhs] {
            let Some(&i) = index.get(b.as_str()) else {
                continue;
            };
            for prod in &g.rules[i].rhs {
                if is_unit_production(prod) {
                    continue;
                }
                if seen.insert(production_key(prod)) {
                    alts.push(prod.clone());
                }
            }
        }

        new_rhs.push(alts);
    }

    for (rule, alts) in g.rules.iter_mut().zip(new_rhs) {
        rule.rhs = alts;
    }
}

fn compute_generating(g: &Grammar) -> HashSet<String> {
    let mut gen: HashSet<String> = HashSet::new();
    let mut changed = true;

    while changed {
        changed = false;
        for rule in &g.rules {
            if gen.contains(&rule.lhs) {
                continue;
            }
            let ok = rule.rhs.iter().any(|prod| {
                is_epsilon_production(prod)
                    || prod.iter().all(|s| s.is_terminal() || gen.contains(&s.name))
            });
            if ok {
                gen.insert(rule.lhs.clone());
                changed = true;
            }
        }
    }

    gen
}

fn compute_reachable(g: &Grammar, start: &str) -> HashSet<String> {
    let index: HashMap<&str, usize> = g
        .rules
        .iter()
        .enumerate()
        .map(|(i, r)| (r.lhs.as_str(), i))
        .collect();

    let mut reach = HashSet::new();
    let mut stack = vec![start.to_string()];
    reach.insert(start.to_string());

    while let Some(a) = stack.pop() {
        let Some(&i) = index.get(a.as_str()) else {
            continue;
        };
        for prod in &g.rules[i].rhs {
            for symbol in prod {
                if symbol.is_nonterminal() && reach.insert(symbol.name.clone()) {
                    stack.push(symbol.name.clone());
                }
            }
        }
    }

    reach
}

/// `USELESS` — two fixed-point passes: drop non-generating symbols, then
/// drop symbols unreachable from the start.
pub fn remove_useless(g: &mut Grammar) {
    let gen = compute_generating(g);

    g.rules.retain(|r| gen.contains(&r.lhs));
    for rule in &mut g.rules {
        rule.rhs.retain(|prod| {
            is_epsilon_production(prod)
                || prod.iter().all(|s| s.is_terminal() || gen.contains(&s.name))
        });
    }
    g.rules.retain(|r| !r.rhs.is_empty());

    let reach = compute_reachable(g, &g.start.clone());

    g.rules.retain(|r| reach.contains(&r.lhs));
    for rule in &mut g.rules {
        rule.rhs
            .retain(|prod| prod.iter().all(|s| s.is_terminal() || reach.contains(&s.name)));
    }
    g.rules.retain(|r| !r.rhs.is_empty());

    g.rebuild_symbol_sets();
}

/// Same probing scheme as `Grammar::fresh_nonterminal`, but against a local
/// scratch set rather than `&self`, so callers can pick fresh names while
/// a `&mut` borrow of `g.rules` is already live.
fn fresh_against(taken: &HashSet<String>, base: &str) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    for i in 1.. {
        let candidate = format!("{base}_{i}");
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
    unreachable!()
}

fn sanitize(name: &str) -> String {
    let out: String = name
        .bytes()
        .map(|b| if b.is_ascii_alphanumeric() { b as char } else { '_' })
        .collect();
    if out.is_empty() {
        "tok".to_string()
    } else {
        out
    }
}

/// `TERM` — lift every terminal occurrence out of a length->=2 production
/// into a fresh helper nonterminal `T_t' -> t`, shared across the grammar.
///
/// Two passes: first decide every helper name against a scratch copy of
/// `g.nonterminals` (no borrow of `g.rules` is live while `g.fresh_nonterminal`
/// needs `&g`), then rewrite `rule.rhs` in place in a second pass.
pub fn lift_terminals(g: &mut Grammar) {
    let mut term_to_nt: HashMap<String, String> = HashMap::new();
    let mut scratch = g.nonterminals.clone();

    for rule in &g.rules {
        for prod in &rule.rhs {
            if is_epsilon_production(prod) || prod.len() < 2 {
                continue;
            }
            for symbol in prod {
                if !symbol.is_terminal() || term_to_nt.contains_key(&symbol.name) {
                    continue;
                }
                let base = format!("T_{}", sanitize(&symbol.name));
                let helper = fresh_against(&scratch, &base);
                scratch.insert(helper.clone());
                term_to_nt.insert(symbol.name.clone(), helper);
            }
        }
    }

    let mut new_rules: Vec<Rule> = Vec::new();
    for rule in &mut g.rules {
        for prod in &mut rule.rhs {
            if is_epsilon_production(prod) || prod.len() < 2 {
                continue;
            }
            for symbol in prod.iter_mut() {
                if !symbol.is_terminal() {
                    continue;
                }
                let helper = term_to_nt[&symbol.name].clone();
                *symbol = Symbol::nonterminal(helper);
            }
        }
    }

    for (terminal, helper) in term_to_nt {
        let mut tr = Rule::new(helper);
        tr.rhs.push(vec![Symbol::terminal(terminal)]);
        new_rules.push(tr);
    }

    g.rules.extend(new_rules);
    g.rebuild_symbol_sets();
}

/// `BIN` — right-binarize every production of length > 2 with fresh helper
/// nonterminals, base name `"X"`.
///
/// Two passes, for the same reason as `lift_terminals`: first size and draw
/// a pool of fresh helper names against a scratch copy of `g.nonterminals`
/// (no live borrow of `g.rules` at that point), then consume the pool while
/// rewriting `rule.rhs` in place. `g.rebuild_symbol_sets` picks up every
/// helper's name from its new `Rule`'s `lhs`, so the scratch set itself
/// never needs to be written back into `g.nonterminals`.
pub fn binarize(g: &mut Grammar) {
    let needed: usize = g
        .rules
        .iter()
        .flat_map(|r| &r.rhs)
        .map(|prod| prod.len().saturating_sub(2))
        .sum();

    let mut scratch = g.nonterminals.clone();
    let mut pool: Vec<String> = Vec::with_capacity(needed);
    for _ in 0..needed {
        let name = fresh_against(&scratch, "X");
        scratch.insert(name.clone());
        pool.push(name);
    }
    let mut pool = pool.into_iter();

    let mut extra_rules: Vec<Rule> = Vec::new();

    for rule in &mut g.rules {
        let mut new_rhs: Vec<Production> = Vec::with_capacity(rule.rhs.len());

        for prod in &rule.rhs {
            if prod.len() <= 2 {
                new_rhs.push(prod.clone());
                continue;
            }

            let first = prod[0].clone();
            let mut prev_helper = pool.next().expect("pool sized to exact helper demand");

            new_rhs.push(vec![first, Symbol::nonterminal(prev_helper.clone())]);

            let m = prod.len();
            for i in 1..m {
                if i == m - 2 {
                    let mut rr = Rule::new(prev_helper.clone());
                    rr.rhs.push(vec![prod[i].clone(), prod[i + 1].clone()]);
                    extra_rules.push(rr);
                    break;
                }

                let next_helper = pool.next().expect("pool sized to exact helper demand");

                let mut rr = Rule::new(prev_helper.clone());
                rr.rhs
                    .push(vec![prod[i].clone(), Symbol::nonterminal(next_helper.clone())]);
                extra_rules.push(rr);

                prev_helper = next_helper;
            }
        }

        rule.rhs = new_rhs;
    }

    g.rules.extend(extra_rules);
    g.rebuild_symbol_sets();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn parse(src: &str) -> Grammar {
        Parser::new(src).parse_grammar().unwrap()
    }

    #[test]
    fn fresh_start_never_appears_on_rhs() {
        let mut g = parse("S -> \"a\" S | epsilon ;");
        fresh_start(&mut g);
        let new_start = g.start.clone();
        assert!(g
            .rules
            .iter()
            .all(|r| r.rhs.iter().all(|p| p.iter().all(|s| s.name != new_start))));
    }

    #[test]
    fn epsilon_removal_s3() {
        // S -> A B ; A -> "a" | epsilon ; B -> "b" | epsilon ;
        let mut g = parse("S -> A B ; A -> \"a\" | epsilon ; B -> \"b\" | epsilon ;");
        fresh_start(&mut g);
        remove_epsilon(&mut g).unwrap();

        // No alternative is epsilon except possibly the new start's.
        for rule in &g.rules {
            if rule.lhs == g.start {
                continue;
            }
            assert!(rule.rhs.iter().all(|p| !is_epsilon_production(p)));
        }
    }

    #[test]
    fn unit_chain_s4() {
        let mut g = parse("S -> A ; A -> B ; B -> \"x\" ;");
        fresh_start(&mut g);
        remove_epsilon(&mut g).unwrap();
        remove_unit(&mut g);
        for rule in &g.rules {
            for p in &rule.rhs {
                assert!(!is_unit_production(p));
            }
        }
    }

    #[test]
    fn useless_removal_s5() {
        let mut g = parse("S -> \"a\" ; U -> U \"b\" ; V -> \"c\" ;");
        fresh_start(&mut g);
        remove_epsilon(&mut g).unwrap();
        remove_unit(&mut g);
        remove_useless(&mut g);

        assert!(!g.nonterminals.contains("U"));
        assert!(!g.nonterminals.contains("V"));
    }

    #[test]
    fn binarization_s6_accepts_exactly_abcd() {
        let g = parse("S -> \"a\" \"b\" \"c\" \"d\" ;");
        let g = to_cnf(g).unwrap();

        for rule in &g.rules {
            for p in &rule.rhs {
                assert!(p.len() <= 2);
                if p.len() == 2 {
                    assert!(p.iter().all(|s| s.is_nonterminal()));
                }
            }
        }
    }

    #[test]
    fn cnf_postcondition_holds_after_full_pipeline() {
        let g = parse("S -> \"(\" S \")\" S | epsilon ;");
        let g = to_cnf(g).unwrap();
        for rule in &g.rules {
            for p in &rule.rhs {
                assert!(p.len() <= 2);
                if p.len() == 2 {
                    assert!(p.iter().all(|s| s.is_nonterminal()));
                } else if p.len() == 1 && !p[0].is_epsilon() {
                    assert!(p[0].is_terminal());
                }
            }
        }
    }

    #[test]
    fn useless_is_idempotent() {
        let mut g = parse("S -> \"a\" ; U -> U \"b\" ;");
        fresh_start(&mut g);
        remove_epsilon(&mut g).unwrap();
        remove_unit(&mut g);
        remove_useless(&mut g);
        let once: Vec<String> = g.rules.iter().map(|r| r.lhs.clone()).collect();
        remove_useless(&mut g);
        let twice: Vec<String> = g.rules.iter().map(|r| r.lhs.clone()).collect();
        assert_eq!(once, twice);
    }
}
