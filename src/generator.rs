//! Biased random sentential-form generator (spec §4.5). Not a uniform
//! sampler: weights push derivations toward the `targetMin..targetMax`
//! terminal-count corridor so the differential tester spends its trial
//! budget on strings likely to expose a real difference rather than on
//! immediate epsilons or runaway expansions.
//!
//! The `rules: RuleMap` plus a leftmost/non-leftmost expansion choice here
//! is the same shape this crate's earlier `Generator` used (a `HashMap<
//! Symbol, Vec<Vec<Symbol>>>` plus a `left: bool` flag); this version
//! generalizes that fixed leftmost-or-rightmost choice into `pLeftmost`-
//! weighted leftmost-or-uniform-random, and replaces exhaustive BFS
//! enumeration with a single bounded random derivation per call, since the
//! tester wants candidate witnesses, not the whole language.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::grammar::Grammar;
use crate::symbol::{count_nonterminals, count_terminals, is_epsilon_production, Production, Symbol};

pub type RuleMap = HashMap<String, Vec<Production>>;

#[derive(Debug, Clone)]
pub struct GenSettings {
    /// Hard ceiling on expansion steps per attempt.
    pub max_steps: usize,
    /// Hard ceiling on terminal count in the final output.
    pub max_len: usize,
    /// Soft corridor used to bias weights, lower bound.
    pub target_min: usize,
    /// Soft corridor used to bias weights, upper bound.
    pub target_max: usize,
    /// Probability of expanding the leftmost nonterminal rather than a
    /// uniformly random one.
    pub p_leftmost: f64,
}

impl Default for GenSettings {
    fn default() -> GenSettings {
        GenSettings {
            max_steps: 200,
            max_len: 50,
            target_min: 1,
            target_max: 20,
            p_leftmost: 0.8,
        }
    }
}

/// Builds the `lhs -> alternatives` lookup the generator walks. One entry
/// per nonterminal; assumes `g` already has at most one `Rule` per `lhs`.
pub fn build_rule_map(g: &Grammar) -> RuleMap {
    g.rules
        .iter()
        .map(|r| (r.lhs.clone(), r.rhs.clone()))
        .collect()
}

fn nonterminal_positions(sentential: &[Symbol]) -> Vec<usize> {
    sentential
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_nonterminal())
        .map(|(i, _)| i)
        .collect()
}

fn count_terminals_sentential(sentential: &[Symbol]) -> usize {
    sentential.iter().filter(|s| s.is_terminal() && !s.is_epsilon()).count()
}

/// Weight assigned to alternative `prod` given the current derivation state
/// (spec §4.5's weighting rules, applied multiplicatively).
fn alternative_weight(prod: &Production, cur_len: usize, steps_used: usize, cfg: &GenSettings) -> f64 {
    let mut weight = 1.0;

    if is_epsilon_production(prod) {
        weight *= if cur_len < cfg.target_min { 0.1 } else { 0.6 };
        return weight;
    }

    let nt = count_nonterminals(prod) as f64;
    let tm = count_terminals(prod) as f64;

    let near_step_limit = steps_used >= (cfg.max_steps * 3) / 4;
    let near_len_limit = cur_len >= cfg.target_max;

    if near_step_limit || near_len_limit {
        weight *= 1.0 / (1.0 + nt);
    }
    if cur_len < cfg.target_min {
        weight *= 1.0 + tm;
    }
    if cur_len > cfg.target_max {
        weight *= 1.0 / (1.0 + tm);
    }

    weight
}

fn choose_alternative<'a>(
    alts: &'a [Production],
    rng: &mut impl Rng,
    cur_len: usize,
    steps_used: usize,
    cfg: &GenSettings,
) -> &'a Production {
    let weights: Vec<f64> = alts
        .iter()
        .map(|p| alternative_weight(p, cur_len, steps_used, cfg))
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        let idx = rng.gen_range(0..alts.len());
        return &alts[idx];
    }

    let dist = WeightedIndex::new(&weights).expect("at least one positive weight");
    &alts[dist.sample(rng)]
}

/// Attempts one bounded random derivation of `rm`'s `start` symbol. Returns
/// `None` on step/length exhaustion or a nonterminal with no alternatives —
/// callers retry silently (spec §4.5, §7).
pub fn generate_string(
    rm: &RuleMap,
    start: &str,
    rng: &mut impl Rng,
    cfg: &GenSettings,
) -> Option<Vec<String>> {
    let mut sentential: Vec<Symbol> = vec![Symbol::nonterminal(start)];

    for step in 0..cfg.max_steps {
        let positions = nonterminal_positions(&sentential);

        if positions.is_empty() {
            let out: Vec<String> = sentential
                .iter()
                .filter(|s| s.is_terminal() && !s.is_epsilon())
                .map(|s| s.name.clone())
                .collect();
            return if out.len() <= cfg.max_len { Some(out) } else { None };
        }

        let cur_len = count_terminals_sentential(&sentential);
        if cur_len > cfg.max_len {
            return None;
        }

        let mut pos = positions[0];
        if rng.gen::<f64>() > cfg.p_leftmost {
            pos = positions[rng.gen_range(0..positions.len())];
        }

        let a = sentential[pos].name.clone();
        let alts = rm.get(&a)?;
        if alts.is_empty() {
            return None;
        }

        let chosen = choose_alternative(alts, rng, cur_len, step, cfg).clone();

        let mut next = Vec::with_capacity(sentential.len() + chosen.len());
        next.extend_from_slice(&sentential[..pos]);
        if !is_epsilon_production(&chosen) {
            next.extend(chosen);
        }
        next.extend_from_slice(&sentential[pos + 1..]);

        sentential = next;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::to_cnf;
    use crate::cyk::{cyk_accepts, CykIndex};
    use crate::parser::Parser;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_strings_are_accepted_by_their_own_grammar() {
        let g = Parser::new("S -> \"a\" \"a\" S | epsilon ;")
            .parse_grammar()
            .unwrap();
        let g = to_cnf(g).unwrap();
        let idx = CykIndex::build(&g);
        let rm = build_rule_map(&g);
        let cfg = GenSettings::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mut successes = 0;
        for _ in 0..200 {
            if let Some(w) = generate_string(&rm, &g.start, &mut rng, &cfg) {
                assert!(cyk_accepts(&g, &idx, &g.start, &w));
                successes += 1;
            }
        }
        assert!(successes > 0);
    }

    #[test]
    fn deterministic_under_fixed_seed() {
        let g = Parser::new("S -> \"a\" S | \"a\" ;").parse_grammar().unwrap();
        let g = to_cnf(g).unwrap();
        let rm = build_rule_map(&g);
        let cfg = GenSettings::default();

        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);

        let a: Vec<_> = (0..20).map(|_| generate_string(&rm, &g.start, &mut rng1, &cfg)).collect();
        let b: Vec<_> = (0..20).map(|_| generate_string(&rm, &g.start, &mut rng2, &cfg)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn respects_max_len() {
        let g = Parser::new("S -> \"a\" S | \"a\" ;").parse_grammar().unwrap();
        let g = to_cnf(g).unwrap();
        let rm = build_rule_map(&g);
        let cfg = GenSettings {
            max_len: 3,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            if let Some(w) = generate_string(&rm, &g.start, &mut rng, &cfg) {
                assert!(w.len() <= 3);
            }
        }
    }
}