use vob::Vob;

use crate::{Grammar, RIdx, empty_vob, grammar::Rule};

/// The left-corner relation of a grammar. `X` is a direct left corner of `R` if some option of
/// `R` starts with `X`; `LC*(R)` is the reflexive transitive closure of that relation. A
/// left-corner parser recognises a rule bottom-up from its first item, so these sets decide
/// which rules a completed item may start (HEIGHT) and which terminals may begin a rule.
#[derive(Debug)]
pub struct LeftCorners {
    closure: Vec<Vob>,
    /// For each item `X`, the (rule, option) pairs whose option starts with `X`.
    starting_with: Vec<Vec<(RIdx, usize)>>,
}

impl LeftCorners {
    pub(crate) fn from_rules(rules: &[Rule]) -> Self {
        let len = rules.len();
        let mut starting_with = vec![Vec::new(); len];
        let mut closure = vec![empty_vob(len); len];
        for (i, rule) in rules.iter().enumerate() {
            closure[i].set(i, true);
            for o in 0..rule.options_len() {
                let first = rule.first_item(o);
                closure[i].set(usize::from(first), true);
                starting_with[usize::from(first)].push((RIdx::from(i), o));
            }
        }

        loop {
            let mut changed = false;
            for i in 0..len {
                for j in closure[i].iter_set_bits(..).collect::<Vec<_>>() {
                    if i != j {
                        let other = closure[j].clone();
                        changed |= closure[i].or(&other);
                    }
                }
            }
            if !changed {
                return LeftCorners {
                    closure,
                    starting_with,
                };
            }
        }
    }

    /// Is `corner` in `LC*(ridx)`?
    pub fn is_left_corner(&self, ridx: RIdx, corner: RIdx) -> bool {
        self.closure[usize::from(ridx)][usize::from(corner)]
    }

    /// `LC*(ridx)` as a bit vector over rule indices.
    pub fn closure(&self, ridx: RIdx) -> &Vob {
        &self.closure[usize::from(ridx)]
    }

    /// The (rule, option) pairs whose option starts with `item`.
    pub fn starting_with(&self, item: RIdx) -> &[(RIdx, usize)] {
        &self.starting_with[usize::from(item)]
    }

    /// The terminal, `<empty>` and embedded members of `LC*(ridx)`, in arena order.
    pub fn first_terminals(&self, grm: &Grammar, ridx: RIdx) -> Vec<RIdx> {
        self.closure[usize::from(ridx)]
            .iter_set_bits(..)
            .map(RIdx::from)
            .filter(|r| grm.rule(*r).is_terminal() || grm.rule(*r).is_embedded())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        Grammar,
        def::{GrammarDef, concat, lit, longest, nt, opt, slist},
    };

    #[test]
    fn left_recursion() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("S", longest(vec![vec![lit("a")], vec![nt("S1")]]))
                .rule("S1", concat(vec![nt("S"), lit("a")])),
        )
        .unwrap();
        let s = grm.rule_idx("S").unwrap();
        let s1 = grm.rule_idx("S1").unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let lcs = grm.left_corners();
        assert!(lcs.is_left_corner(s, s));
        assert!(lcs.is_left_corner(s, s1));
        assert!(lcs.is_left_corner(s1, s));
        assert!(lcs.is_left_corner(s1, a));
        assert_eq!(grm.first_terminals(s), vec![a]);
        assert_eq!(lcs.starting_with(a), &[(s, 0)]);
        assert_eq!(lcs.starting_with(s), &[(s1, 0)]);
    }

    #[test]
    fn optional_lists_start_with_empty() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("S", concat(vec![nt("O"), lit("b")]))
                .rule("O", opt(lit("a")))
                .rule("L", slist(0, None, lit("x"), lit(","))),
        )
        .unwrap();
        let s = grm.rule_idx("S").unwrap();
        let o = grm.rule_idx("O").unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let b = grm.rule_idx("'b'").unwrap();
        let l = grm.rule_idx("L").unwrap();
        let x = grm.rule_idx("'x'").unwrap();
        let empty = grm.empty_ridx();
        // 'b' follows a nullable item but is not a left corner: it is reached through the
        // EMPTY leaf completing O.
        assert_eq!(grm.first_terminals(s), vec![empty, a]);
        assert!(!grm.left_corners().is_left_corner(s, b));
        assert_eq!(grm.left_corners().starting_with(empty), &[(o, 1), (l, 1)]);
        assert_eq!(grm.first_terminals(l), vec![empty, x]);
        assert_eq!(grm.first_terminals(x), vec![x]);
    }
}
