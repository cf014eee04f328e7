use std::fmt::Write;

use lcgrammar::{Grammar, RIdx, RuleOption};

/// A dotted rule: how far into option `option` of rule `rule` has been matched.
///
/// For sequences, `position` counts the items matched so far, with a fully matched option at
/// [`END`]. Lists reuse `position` as a small state machine rather than a count, since the
/// number of items is unbounded:
///
///   * multi lists: `0` (nothing matched), `1` (one or more items matched) and `END`.
///   * separated lists: `0` (nothing matched), `1` (just matched an item), `2` (just matched
///     a separator) and `END`.
///
/// Whether a list at position `1` may take another item or complete depends on how many items
/// have been matched, which only the parser knows.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RulePosition {
    pub rule: RIdx,
    pub option: u32,
    pub position: u32,
}

/// The position of a rule option which has been fully matched.
pub const END: u32 = u32::MAX;

impl RulePosition {
    pub fn new(rule: RIdx, option: usize, position: u32) -> Self {
        RulePosition {
            rule,
            option: num_traits::cast(option).unwrap(),
            position,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position == END
    }

    /// The item this position expects next in `grm` when parsing for `goal`, if any.
    pub fn expected(&self, grm: &Grammar, goal: RIdx) -> Option<RIdx> {
        if self.rule == grm.goal_ridx() {
            return if self.position == 0 { Some(goal) } else { None };
        }
        if self.is_at_end() {
            return None;
        }
        let rule = grm.rule(self.rule);
        if !rule.is_nonterminal() {
            return None;
        }
        match rule.option(self.option as usize) {
            RuleOption::Sequence(items) => Some(items[self.position as usize]),
            RuleOption::Multi { item, .. } => Some(item),
            RuleOption::SeparatedList {
                item, separator, ..
            } => {
                if self.position == 1 {
                    Some(separator)
                } else {
                    Some(item)
                }
            }
        }
    }

    /// The position after this one has matched its expected item.
    pub fn advance(&self, grm: &Grammar) -> RulePosition {
        let next = match grm.rule(self.rule).option(self.option as usize) {
            RuleOption::Sequence(items) => {
                if self.position as usize + 1 == items.len() {
                    END
                } else {
                    self.position + 1
                }
            }
            RuleOption::Multi { .. } => 1,
            RuleOption::SeparatedList { .. } => {
                if self.position == 1 {
                    2
                } else {
                    1
                }
            }
        };
        RulePosition {
            position: next,
            ..*self
        }
    }

    /// Can an application at this position complete (given enough list items)?
    pub fn may_complete(&self, grm: &Grammar) -> bool {
        if self.is_at_end() {
            return true;
        }
        let rule = grm.rule(self.rule);
        rule.is_nonterminal()
            && match rule.option(self.option as usize) {
                RuleOption::Sequence(_) => false,
                RuleOption::Multi { .. } | RuleOption::SeparatedList { .. } => self.position == 1,
            }
    }

    /// Render this position as `[R ::= a . b]`.
    pub fn pp(&self, grm: &Grammar, goal: RIdx) -> String {
        let rule = grm.rule(self.rule);
        if self.rule != grm.goal_ridx() && !rule.is_nonterminal() {
            // A matched terminal.
            return format!("[{}]", rule.name());
        }
        let mut o = format!("[{} ::=", rule.name());
        if self.rule == grm.goal_ridx() {
            if self.position == 0 {
                o.push_str(" .");
            }
            write!(o, " {}", grm.rule_name(goal)).ok();
            if self.position != 0 {
                o.push_str(" .");
            }
            o.push(']');
            return o;
        }
        let dot = |o: &mut String, here: bool| {
            if here {
                o.push_str(" .");
            }
        };
        match rule.option(self.option as usize) {
            RuleOption::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    dot(&mut o, i == self.position as usize);
                    write!(o, " {}", grm.rule_name(*item)).ok();
                }
            }
            RuleOption::Multi { min, max, item } => {
                dot(&mut o, self.position == 0);
                write!(o, " {}{}", grm.rule_name(item), multiplicity(min, max)).ok();
                dot(&mut o, self.position == 1);
            }
            RuleOption::SeparatedList {
                min,
                max,
                item,
                separator,
            } => {
                o.push_str(" [");
                dot(&mut o, self.position == 0 || self.position == 2);
                write!(o, " {}", grm.rule_name(item)).ok();
                dot(&mut o, self.position == 1);
                write!(o, " / {} ]{}", grm.rule_name(separator), multiplicity(min, max)).ok();
            }
        }
        dot(&mut o, self.is_at_end());
        o.push(']');
        o
    }
}

fn multiplicity(min: u32, max: Option<u32>) -> String {
    match (min, max) {
        (0, None) => "*".to_owned(),
        (1, None) => "+".to_owned(),
        (0, Some(1)) => "?".to_owned(),
        (min, None) => format!("{{{},}}", min),
        (min, Some(max)) => format!("{{{},{}}}", min, max),
    }
}

/// A parser state: a non-empty, sorted, duplicate free set of positions in options of one rule.
/// States are hash-consed by their positions within a [`StateSet`](crate::StateSet).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ParserState {
    positions: Vec<RulePosition>,
}

impl ParserState {
    pub(crate) fn new(mut positions: Vec<RulePosition>) -> Self {
        debug_assert!(!positions.is_empty());
        debug_assert!(positions.iter().all(|rp| rp.rule == positions[0].rule));
        positions.sort();
        positions.dedup();
        ParserState { positions }
    }

    /// The rule every position of this state is in.
    pub fn rule(&self) -> RIdx {
        self.positions[0].rule
    }

    pub fn positions(&self) -> &[RulePosition] {
        &self.positions
    }

    /// The distinct items this state expects next.
    pub fn expected(&self, grm: &Grammar, goal: RIdx) -> Vec<RIdx> {
        let mut exp = self
            .positions
            .iter()
            .filter_map(|rp| rp.expected(grm, goal))
            .collect::<Vec<_>>();
        exp.sort();
        exp.dedup();
        exp
    }

    /// The positions (and so the options) which can complete an application in this state.
    pub fn completable<'a>(
        &'a self,
        grm: &'a Grammar,
    ) -> impl Iterator<Item = &'a RulePosition> + 'a {
        let grm_goal = grm.goal_ridx();
        self.positions
            .iter()
            .filter(move |rp| rp.rule != grm_goal && rp.may_complete(grm))
    }
}

#[cfg(test)]
mod test {
    use super::{END, ParserState, RulePosition};
    use lcgrammar::{
        Grammar,
        def::{GrammarDef, concat, lit, nt, plus, slist},
    };

    #[test]
    fn positions() {
        let grm = Grammar::new(
            &GrammarDef::new("T")
                .rule("S", concat(vec![lit("a"), nt("L"), nt("M")]))
                .rule("L", slist(0, None, lit("x"), lit(",")))
                .rule("M", plus(lit("m"))),
        )
        .unwrap();
        let s = grm.rule_idx("S").unwrap();
        let l = grm.rule_idx("L").unwrap();
        let m = grm.rule_idx("M").unwrap();
        let x = grm.rule_idx("'x'").unwrap();
        let comma = grm.rule_idx("','").unwrap();

        let rp = RulePosition::new(s, 0, 1);
        assert_eq!(rp.expected(&grm, s), Some(l));
        assert_eq!(rp.advance(&grm), RulePosition::new(s, 0, 2));
        assert_eq!(rp.advance(&grm).advance(&grm), RulePosition::new(s, 0, END));
        assert_eq!(rp.pp(&grm, s), "[S ::= 'a' . L M]");
        assert_eq!(RulePosition::new(s, 0, END).pp(&grm, s), "[S ::= 'a' L M .]");

        let rp = RulePosition::new(l, 0, 0);
        assert_eq!(rp.expected(&grm, s), Some(x));
        let rp = rp.advance(&grm);
        assert_eq!(rp.position, 1);
        assert!(rp.may_complete(&grm));
        assert_eq!(rp.expected(&grm, s), Some(comma));
        assert_eq!(rp.pp(&grm, s), "[L ::= [ 'x' . / ',' ]*]");
        let rp = rp.advance(&grm);
        assert_eq!(rp.position, 2);
        assert!(!rp.may_complete(&grm));
        assert_eq!(rp.expected(&grm, s), Some(x));
        assert_eq!(rp.advance(&grm).position, 1);
        assert_eq!(RulePosition::new(l, 1, 0).expected(&grm, s), Some(grm.empty_ridx()));

        let rp = RulePosition::new(m, 0, 0).advance(&grm);
        assert_eq!(rp.pp(&grm, s), "[M ::= 'm'+ .]");
        assert_eq!(rp.advance(&grm), rp);

        let goal = RulePosition::new(grm.goal_ridx(), 0, 0);
        assert_eq!(goal.expected(&grm, s), Some(s));
        assert_eq!(goal.pp(&grm, s), "[<goal> ::= . S]");
        let st = ParserState::new(vec![goal]);
        assert_eq!(st.completable(&grm).count(), 0);
    }

    #[test]
    fn states_are_normalised() {
        let grm = Grammar::new(
            &GrammarDef::new("T").rule(
                "S",
                lcgrammar::def::longest(vec![vec![lit("a"), lit("b")], vec![lit("a"), lit("c")]]),
            ),
        )
        .unwrap();
        let s = grm.rule_idx("S").unwrap();
        let st1 = ParserState::new(vec![RulePosition::new(s, 1, 1), RulePosition::new(s, 0, 1)]);
        let st2 = ParserState::new(vec![
            RulePosition::new(s, 0, 1),
            RulePosition::new(s, 1, 1),
            RulePosition::new(s, 0, 1),
        ]);
        assert_eq!(st1, st2);
        assert_eq!(st1.rule(), s);
        assert_eq!(
            st1.expected(&grm, s),
            vec![grm.rule_idx("'b'").unwrap(), grm.rule_idx("'c'").unwrap()]
        );
    }
}
