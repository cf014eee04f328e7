use vob::Vob;

use crate::{Grammar, RIdx, empty_vob, grammar::RuleOption};

/// `Follows` stores the follow set of every rule for a given goal. Unlike first sets, follow
/// sets depend on where parsing starts: the goal (and the built-in `<goal>` rule) is followed
/// by `<eot>`. For example, given the goal `S` and:
/// ```text
///   S = A 'b' ;
///   A = 'a' | <empty> ;
/// ```
/// then the following assertions (and only the following assertions) about the follow sets are
/// correct:
/// ```text
///   assert!(follows.is_set(S, <eot>));
///   assert!(follows.is_set(A, 'b'));
///   assert!(follows.is_set('a', 'b'));
///   assert!(follows.is_set('b', <eot>));
/// ```
#[derive(Debug)]
pub struct Follows {
    goal: RIdx,
    follows: Vec<Vob>,
}

impl Follows {
    /// Generates and returns the follow sets of `grm` when parsing for `goal`.
    pub fn new(grm: &Grammar, goal: RIdx) -> Self {
        let len = grm.rules_len();
        let mut follows = vec![empty_vob(len); len];
        follows[usize::from(goal)].set(usize::from(grm.eot_ridx()), true);
        follows[usize::from(grm.goal_ridx())].set(usize::from(grm.eot_ridx()), true);

        let firsts = grm.firsts();
        loop {
            let mut changed = false;
            for ridx in grm.iter_rules() {
                let rule = grm.rule(ridx);
                for o in 0..rule.options_len() {
                    let rfollows = follows[usize::from(ridx)].clone();
                    match rule.option(o) {
                        RuleOption::Sequence(items) => {
                            // Work backwards from the end of the option. While everything to the
                            // right can match the empty string, an item is followed by whatever
                            // follows the rule; it is always followed by the firsts of the items
                            // to its right.
                            let mut rest = empty_vob(len);
                            let mut rest_nullable = true;
                            for &item in items.iter().rev() {
                                let f = &mut follows[usize::from(item)];
                                if rest_nullable {
                                    changed |= f.or(&rfollows);
                                }
                                changed |= f.or(&rest);
                                if firsts.is_epsilon_set(item) {
                                    rest.or(firsts.firsts(item));
                                } else {
                                    rest = firsts.firsts(item).clone();
                                    rest_nullable = false;
                                }
                            }
                        }
                        RuleOption::Multi { max, item, .. } => {
                            let f = &mut follows[usize::from(item)];
                            changed |= f.or(&rfollows);
                            if max != Some(1) {
                                changed |= f.or(firsts.firsts(item));
                            }
                        }
                        RuleOption::SeparatedList {
                            max,
                            item,
                            separator,
                            ..
                        } => {
                            let f = &mut follows[usize::from(item)];
                            changed |= f.or(&rfollows);
                            if max != Some(1) {
                                changed |= f.or(firsts.firsts(separator));
                                let f = &mut follows[usize::from(separator)];
                                changed |= f.or(firsts.firsts(item));
                                if firsts.is_epsilon_set(item) {
                                    changed |= f.or(firsts.firsts(separator));
                                    changed |= f.or(&rfollows);
                                }
                            }
                        }
                    }
                }
            }
            if !changed {
                return Follows { goal, follows };
            }
        }
    }

    pub fn goal(&self) -> RIdx {
        self.goal
    }

    /// Return the follows for rule `ridx`.
    pub fn follows(&self, ridx: RIdx) -> &Vob {
        &self.follows[usize::from(ridx)]
    }

    /// Returns true if the terminal `tidx` is in the follow set for rule `ridx`.
    pub fn is_set(&self, ridx: RIdx, tidx: RIdx) -> bool {
        self.follows[usize::from(ridx)][usize::from(tidx)]
    }
}

#[cfg(test)]
mod test {
    use super::Follows;
    use crate::{
        Grammar,
        def::{GrammarDef, concat, empty, lit, longest, nt, slist, star},
    };

    fn has(grm: &Grammar, follows: &Follows, rn: &str, should_be: &[&str]) {
        let ridx = grm.rule_idx(rn).unwrap();
        for t in grm.iter_rules() {
            let n = grm.rule_name(t);
            match should_be.iter().position(|x| x == &n) {
                Some(_) => {
                    if !follows.is_set(ridx, t) {
                        panic!("{} is not set in {}", n, rn);
                    }
                }
                None => {
                    if follows.is_set(ridx, t) {
                        panic!("{} is incorrectly set in {}", n, rn);
                    }
                }
            }
        }
    }

    #[test]
    fn test_follow() {
        // Adapted from p2 of https://www.cs.uaf.edu/~cs331/notes/FirstFollow.pdf
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("E", concat(vec![nt("T"), nt("E2")]))
                .rule(
                    "E2",
                    longest(vec![vec![lit("+"), nt("T"), nt("E2")], vec![]]),
                )
                .rule("T", concat(vec![nt("F"), nt("T2")]))
                .rule(
                    "T2",
                    longest(vec![vec![lit("*"), nt("F"), nt("T2")], vec![]]),
                )
                .rule(
                    "F",
                    longest(vec![vec![lit("("), nt("E"), lit(")")], vec![lit("ID")]]),
                ),
        )
        .unwrap();
        let follows = Follows::new(&grm, grm.rule_idx("E").unwrap());
        has(&grm, &follows, "E", &["')'", "<eot>"]);
        has(&grm, &follows, "E2", &["')'", "<eot>"]);
        has(&grm, &follows, "T", &["'+'", "')'", "<eot>"]);
        has(&grm, &follows, "T2", &["'+'", "')'", "<eot>"]);
        has(&grm, &follows, "F", &["'+'", "'*'", "')'", "<eot>"]);
        has(&grm, &follows, "'ID'", &["'+'", "'*'", "')'", "<eot>"]);
    }

    #[test]
    fn test_follow_depends_on_goal() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("S", concat(vec![nt("A"), lit("b")]))
                .rule("A", longest(vec![vec![lit("a")], vec![empty()]])),
        )
        .unwrap();
        let follows = Follows::new(&grm, grm.rule_idx("S").unwrap());
        has(&grm, &follows, "S", &["<eot>"]);
        has(&grm, &follows, "A", &["'b'"]);
        has(&grm, &follows, "'a'", &["'b'"]);
        let follows = Follows::new(&grm, grm.rule_idx("A").unwrap());
        assert_eq!(follows.goal(), grm.rule_idx("A").unwrap());
        has(&grm, &follows, "A", &["'b'", "<eot>"]);
        has(&grm, &follows, "'a'", &["'b'", "<eot>"]);
    }

    #[test]
    fn test_follow_lists() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("S", concat(vec![nt("L"), lit(";"), nt("M")]))
                .rule("L", slist(0, None, nt("a"), lit(",")))
                .rule("M", star(nt("a")))
                .rule("a", lit("a")),
        )
        .unwrap();
        let follows = Follows::new(&grm, grm.rule_idx("S").unwrap());
        has(&grm, &follows, "L", &["';'"]);
        has(&grm, &follows, "','", &["'a'"]);
        has(&grm, &follows, "M", &["<eot>"]);
        has(&grm, &follows, "a", &["','", "';'", "'a'", "<eot>"]);
    }
}
