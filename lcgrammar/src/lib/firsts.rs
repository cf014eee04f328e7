use vob::Vob;

use crate::{
    RIdx, empty_vob,
    grammar::{Rhs, Rule, RuleOption},
};

/// `Firsts` stores the first set of every rule in a grammar. Since terminals live in the same
/// arena as non-terminals, each first set is a bit vector over rule indices in which only
/// terminal (and embedded) rules are ever set. For example, given:
/// ```text
///   S = A 'b' ;
///   A = 'a' | <empty> ;
/// ```
/// then the following assertions (and only the following assertions) about the firsts set are
/// correct:
/// ```text
///   assert!(firsts.is_set(S, 'a'));
///   assert!(firsts.is_set(S, 'b'));
///   assert!(firsts.is_set(A, 'a'));
///   assert!(firsts.is_epsilon_set(A));
/// ```
/// `<empty>` itself has an empty first set and its epsilon bit set.
#[derive(Debug)]
pub struct Firsts {
    firsts: Vec<Vob>,
    epsilons: Vob,
}

impl Firsts {
    pub(crate) fn from_rules(rules: &[Rule]) -> Self {
        let mut firsts = Firsts {
            firsts: vec![empty_vob(rules.len()); rules.len()],
            epsilons: empty_vob(rules.len()),
        };

        for (i, rule) in rules.iter().enumerate() {
            match rule.rhs() {
                Rhs::Empty => {
                    firsts.epsilons.set(i, true);
                }
                Rhs::Terminal(_) | Rhs::EndOfText | Rhs::Undefined | Rhs::Embedded { .. } => {
                    firsts.firsts[i].set(i, true);
                }
                _ => (),
            }
        }

        // Loop looking for changes to the firsts set until we reach a fixed point.
        loop {
            let mut changed = false;
            for (i, rule) in rules.iter().enumerate() {
                let ridx = RIdx::from(i);
                for o in 0..rule.options_len() {
                    let (nullable, items): (bool, &[RIdx]) = match rule.option(o) {
                        RuleOption::Sequence(items) => (true, items),
                        RuleOption::Multi { min, item, .. } => {
                            changed |= firsts.union(ridx, item);
                            (min == 0 || firsts.is_epsilon_set(item), &[])
                        }
                        RuleOption::SeparatedList {
                            min,
                            item,
                            separator,
                            ..
                        } => {
                            changed |= firsts.union(ridx, item);
                            if firsts.is_epsilon_set(item) {
                                // With an empty item, the separator can be the first thing seen.
                                changed |= firsts.union(ridx, separator);
                                (true, &[])
                            } else {
                                (min == 0, &[])
                            }
                        }
                    };
                    let mut all_nullable = nullable;
                    for &item in items {
                        changed |= firsts.union(ridx, item);
                        if !firsts.is_epsilon_set(item) {
                            all_nullable = false;
                            break;
                        }
                    }
                    if all_nullable && !firsts.epsilons[i] {
                        firsts.epsilons.set(i, true);
                        changed = true;
                    }
                }
            }
            if !changed {
                return firsts;
            }
        }
    }

    /// Union the firsts of `from` into the firsts of `into`, returning true if anything changed.
    fn union(&mut self, into: RIdx, from: RIdx) -> bool {
        if into == from {
            return false;
        }
        let src = self.firsts[usize::from(from)].clone();
        self.firsts[usize::from(into)].or(&src)
    }

    /// Return all the firsts for rule `ridx`.
    pub fn firsts(&self, ridx: RIdx) -> &Vob {
        &self.firsts[usize::from(ridx)]
    }

    /// Returns true if the terminal `tidx` is in the first set for rule `ridx`.
    pub fn is_set(&self, ridx: RIdx, tidx: RIdx) -> bool {
        self.firsts[usize::from(ridx)][usize::from(tidx)]
    }

    /// Returns true if the rule `ridx` can match the empty string.
    pub fn is_epsilon_set(&self, ridx: RIdx) -> bool {
        self.epsilons[usize::from(ridx)]
    }

    /// Union the first sets of `items` into `into` up to and including the first item which
    /// can't match the empty string. Returns true if every item can match the empty string.
    pub fn sequence_firsts(&self, items: &[RIdx], into: &mut Vob) -> bool {
        for &item in items {
            into.or(&self.firsts[usize::from(item)]);
            if !self.is_epsilon_set(item) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use crate::{
        Grammar,
        def::{GrammarDef, concat, empty, lit, longest, multi, nt, slist},
    };

    fn has(grm: &Grammar, rn: &str, should_be: &[&str], epsilon: bool) {
        let ridx = grm.rule_idx(rn).unwrap();
        let firsts = grm.firsts();
        for t in grm.iter_rules() {
            let n = grm.rule_name(t);
            match should_be.iter().position(|x| x == &n) {
                Some(_) => {
                    if !firsts.is_set(ridx, t) {
                        panic!("{} is not set in {}", n, rn);
                    }
                }
                None => {
                    if firsts.is_set(ridx, t) {
                        panic!("{} is incorrectly set in {}", n, rn);
                    }
                }
            }
        }
        assert_eq!(firsts.is_epsilon_set(ridx), epsilon, "epsilon of {}", rn);
    }

    #[test]
    fn test_first() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("C", longest(vec![vec![lit("c")], vec![nt("D")]]))
                .rule(
                    "D",
                    longest(vec![vec![lit("d")], vec![nt("E")], vec![]]),
                )
                .rule("E", concat(vec![nt("D"), nt("C"), lit("e")]))
                .rule("F", concat(vec![nt("C"), nt("D"), lit("f")])),
        )
        .unwrap();
        has(&grm, "C", &["'c'", "'d'", "'e'"], true);
        has(&grm, "D", &["'d'", "'c'", "'e'"], true);
        has(&grm, "E", &["'c'", "'d'", "'e'"], false);
        has(&grm, "F", &["'c'", "'d'", "'e'", "'f'"], false);
        has(&grm, "'c'", &["'c'"], false);
        has(&grm, "<empty>", &[], true);
    }

    #[test]
    fn test_first_no_subsequent_rules() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("C", lit("c"))
                .rule("D", concat(vec![lit("d"), nt("C")])),
        )
        .unwrap();
        has(&grm, "C", &["'c'"], false);
        has(&grm, "D", &["'d'"], false);
    }

    #[test]
    fn test_lists() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("A", multi(0, None, lit("a")))
                .rule("B", multi(1, None, lit("b")))
                .rule("L", slist(1, None, nt("O"), lit(",")))
                .rule("O", longest(vec![vec![lit("o")], vec![empty()]]))
                .rule("M", concat(vec![nt("A"), nt("B")])),
        )
        .unwrap();
        has(&grm, "A", &["'a'"], true);
        has(&grm, "B", &["'b'"], false);
        has(&grm, "L", &["'o'", "','"], true);
        has(&grm, "M", &["'a'", "'b'"], false);
    }
}
