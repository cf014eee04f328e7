use std::{
    fmt::Write,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use fnv::{FnvHashMap, FnvHashSet};
use lcgrammar::{Follows, Grammar, RIdx, RuleOption, empty_vob};
use vob::Vob;

use crate::{
    AutomatonError, AutomatonErrorKind, LookaheadSet, LookaheadStrategy, StIdx,
    position::{END, ParserState, RulePosition},
};

/// The four kinds of transition of a left-corner automaton.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Action {
    /// Match a terminal expected (directly or as a left corner) by the current state.
    Width,
    /// Start a new application of a rule whose first item has just been completed.
    Height,
    /// Advance the current application past an item it expected.
    Graft,
    /// The goal has been completed from the start state.
    Goal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub action: Action,
    pub to: StIdx,
    /// The state whose application is resumed (`Graft`) or which started the new application
    /// (`Height`). `None` for `Width`.
    pub context: Option<StIdx>,
    /// The terminals which must be able to come next for the transition to be taken.
    pub guard: LookaheadSet,
}

struct Inner {
    states: Vec<Arc<ParserState>>,
    index: FnvHashMap<Arc<ParserState>, StIdx>,
    widths: FnvHashMap<StIdx, Arc<[Transition]>>,
    completes: FnvHashMap<(StIdx, RIdx), Arc<[Transition]>>,
}

/// The left-corner automaton for one goal of a grammar and one lookahead strategy.
///
/// States and transitions are created on first use, so a `StateSet` only ever holds what the
/// parses run against it have needed; [`StateSet::build_for`] instead creates everything
/// reachable from the start state up front. A `StateSet` may be shared between threads: lookups
/// take a read lock, and the write lock is only taken (and the lookup repeated) when something
/// is missing, so concurrent parses never compute divergent states.
pub struct StateSet {
    grm: Arc<Grammar>,
    goal: RIdx,
    strategy: LookaheadStrategy,
    follows: Follows,
    inner: RwLock<Inner>,
}

impl StateSet {
    /// Create a lazily populated state set holding only the start state.
    pub fn new(
        grm: Arc<Grammar>,
        goal: RIdx,
        strategy: LookaheadStrategy,
    ) -> Result<Self, AutomatonError> {
        if usize::from(goal) >= grm.rules_len() {
            return Err(AutomatonError {
                kind: AutomatonErrorKind::UnknownGoal(goal.to_string()),
            });
        }
        if [
            grm.empty_ridx(),
            grm.eot_ridx(),
            grm.goal_ridx(),
            grm.undefined_ridx(),
        ]
        .contains(&goal)
        {
            return Err(AutomatonError {
                kind: AutomatonErrorKind::BuiltinGoal(grm.rule_name(goal).to_owned()),
            });
        }
        let follows = Follows::new(&grm, goal);
        let start = Arc::new(ParserState::new(vec![RulePosition::new(
            grm.goal_ridx(),
            0,
            0,
        )]));
        let mut index = FnvHashMap::default();
        index.insert(Arc::clone(&start), StIdx(0));
        log::debug!(
            "New state set for goal '{}' of grammar '{}' ({:?} lookahead)",
            grm.rule_name(goal),
            grm.name(),
            strategy
        );
        Ok(StateSet {
            grm,
            goal,
            strategy,
            follows,
            inner: RwLock::new(Inner {
                states: vec![start],
                index,
                widths: FnvHashMap::default(),
                completes: FnvHashMap::default(),
            }),
        })
    }

    /// Create a state set with every state and transition reachable from the start state.
    pub fn build_for(
        grm: Arc<Grammar>,
        goal: RIdx,
        strategy: LookaheadStrategy,
    ) -> Result<Self, AutomatonError> {
        let ss = StateSet::new(grm, goal, strategy)?;
        ss.build();
        Ok(ss)
    }

    /// Create every state and transition reachable from the start state which hasn't been
    /// created yet.
    pub fn build(&self) {
        let mut seen = FnvHashSet::default();
        let mut todo = vec![self.start_state()];
        seen.insert(self.start_state());
        while let Some(st) = todo.pop() {
            let mut next = self
                .width_transitions(st)
                .iter()
                .map(|t| t.to)
                .collect::<Vec<_>>();
            for c in self.completions_for(st) {
                next.extend(
                    self.complete_transitions(st, c)
                        .iter()
                        .filter(|t| t.action != Action::Goal)
                        .map(|t| t.to),
                );
            }
            for n in next {
                if seen.insert(n) {
                    todo.push(n);
                }
            }
        }
        log::debug!(
            "Built state set for goal '{}': {} states",
            self.grm.rule_name(self.goal),
            self.states_len()
        );
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grm
    }

    pub fn goal(&self) -> RIdx {
        self.goal
    }

    pub fn strategy(&self) -> LookaheadStrategy {
        self.strategy
    }

    pub fn follows(&self) -> &Follows {
        &self.follows
    }

    pub fn start_state(&self) -> StIdx {
        StIdx(0)
    }

    /// How many states have been created so far?
    pub fn states_len(&self) -> usize {
        self.read().states.len()
    }

    /// Return the state `stidx`. Panics if it doesn't exist.
    pub fn state(&self, stidx: StIdx) -> Arc<ParserState> {
        Arc::clone(&self.read().states[usize::from(stidx)])
    }

    /// Return the index of the state with exactly `positions`, if it has been created.
    pub fn state_idx(&self, positions: &[RulePosition]) -> Option<StIdx> {
        let ps = ParserState::new(positions.to_vec());
        self.read().index.get(&ps).cloned()
    }

    /// The WIDTH transitions of `stidx`: one per terminal (including `<empty>` and embedded
    /// rules) that `stidx` expects, directly or as the first terminal of an expected rule.
    pub fn width_transitions(&self, stidx: StIdx) -> Arc<[Transition]> {
        if let Some(ts) = self.read().widths.get(&stidx) {
            return Arc::clone(ts);
        }
        let mut inner = self.write();
        if let Some(ts) = inner.widths.get(&stidx) {
            return Arc::clone(ts);
        }
        let ts: Arc<[Transition]> = self.compute_widths(&mut inner, stidx).into();
        inner.widths.insert(stidx, Arc::clone(&ts));
        ts
    }

    /// The transitions to take when an application of `completed` (or a leaf, if `completed` is
    /// a terminal) started by a node in state `context` has been completed.
    pub fn complete_transitions(&self, context: StIdx, completed: RIdx) -> Arc<[Transition]> {
        if let Some(ts) = self.read().completes.get(&(context, completed)) {
            return Arc::clone(ts);
        }
        let mut inner = self.write();
        if let Some(ts) = inner.completes.get(&(context, completed)) {
            return Arc::clone(ts);
        }
        let ts: Arc<[Transition]> = self
            .compute_completes(&mut inner, context, completed)
            .into();
        inner.completes.insert((context, completed), Arc::clone(&ts));
        ts
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn intern(&self, inner: &mut Inner, ps: ParserState) -> StIdx {
        if let Some(stidx) = inner.index.get(&ps) {
            return *stidx;
        }
        let stidx = StIdx::from(inner.states.len());
        log::trace!(
            "New state {}: {}",
            stidx,
            ps.positions()
                .iter()
                .map(|rp| rp.pp(&self.grm, self.goal))
                .collect::<Vec<_>>()
                .join(" ")
        );
        let ps = Arc::new(ps);
        inner.states.push(Arc::clone(&ps));
        inner.index.insert(ps, stidx);
        stidx
    }

    /// Every item whose completion may be announced to a node in state `stidx`: the rules (and
    /// terminals) in the left-corner closure of what `stidx` expects.
    fn completions_for(&self, stidx: StIdx) -> Vec<RIdx> {
        let state = self.state(stidx);
        let mut reach = empty_vob(self.grm.rules_len());
        for x in state.expected(&self.grm, self.goal) {
            reach.or(self.grm.left_corners().closure(x));
        }
        reach.iter_set_bits(..).map(RIdx::from).collect()
    }

    fn compute_widths(&self, inner: &mut Inner, stidx: StIdx) -> Vec<Transition> {
        let state = Arc::clone(&inner.states[usize::from(stidx)]);
        let mut cands = Vec::new();
        for x in state.expected(&self.grm, self.goal) {
            cands.extend(self.grm.first_terminals(x));
        }
        cands.sort();
        cands.dedup();
        cands
            .into_iter()
            .map(|t| Transition {
                action: Action::Width,
                to: self.intern(inner, ParserState::new(vec![RulePosition::new(t, 0, END)])),
                context: None,
                guard: LookaheadSet::single(&self.grm, t),
            })
            .collect()
    }

    fn compute_completes(
        &self,
        inner: &mut Inner,
        context: StIdx,
        completed: RIdx,
    ) -> Vec<Transition> {
        let state = Arc::clone(&inner.states[usize::from(context)]);
        let expected = state.expected(&self.grm, self.goal);
        let mut ts = Vec::new();

        if context == self.start_state() && completed == self.goal {
            ts.push(Transition {
                action: Action::Goal,
                to: context,
                context: Some(context),
                guard: LookaheadSet::single(&self.grm, self.grm.eot_ridx()),
            });
        } else if expected.contains(&completed) {
            let ps = ParserState::new(
                state
                    .positions()
                    .iter()
                    .filter(|rp| rp.expected(&self.grm, self.goal) == Some(completed))
                    .map(|rp| rp.advance(&self.grm))
                    .collect(),
            );
            let guard = self.guard(&ps);
            ts.push(Transition {
                action: Action::Graft,
                to: self.intern(inner, ps),
                context: Some(context),
                guard,
            });
        }

        let mut reach = empty_vob(self.grm.rules_len());
        for x in &expected {
            reach.or(self.grm.left_corners().closure(*x));
        }
        let mut groups: Vec<(RIdx, Vec<RulePosition>)> = Vec::new();
        for &(r, o) in self.grm.left_corners().starting_with(completed) {
            if !reach[usize::from(r)] {
                continue;
            }
            let rp = RulePosition::new(r, o, 0).advance(&self.grm);
            match groups.iter_mut().find(|(gr, _)| *gr == r) {
                Some((_, rps)) => rps.push(rp),
                None => groups.push((r, vec![rp])),
            }
        }
        for (_, rps) in groups {
            let ps = ParserState::new(rps);
            let guard = self.guard(&ps);
            ts.push(Transition {
                action: Action::Height,
                to: self.intern(inner, ps),
                context: Some(context),
                guard,
            });
        }
        ts
    }

    /// The terminals which may follow the positions of `ps`.
    fn guard(&self, ps: &ParserState) -> LookaheadSet {
        match self.strategy {
            LookaheadStrategy::None => LookaheadSet::any(),
            LookaheadStrategy::Lc1 => {
                let mut la = empty_vob(self.grm.rules_len());
                for rp in ps.positions() {
                    self.position_lookahead(rp, &mut la);
                }
                LookaheadSet::from_vob(la)
            }
        }
    }

    fn position_lookahead(&self, rp: &RulePosition, la: &mut Vob) {
        let firsts = self.grm.firsts();
        let follow = self.follows.follows(rp.rule);
        if rp.rule == self.grm.goal_ridx() {
            la.set(usize::from(self.grm.eot_ridx()), true);
            return;
        }
        if rp.is_at_end() {
            la.or(follow);
            return;
        }
        match self.grm.rule(rp.rule).option(rp.option as usize) {
            RuleOption::Sequence(items) => {
                if firsts.sequence_firsts(&items[rp.position as usize..], la) {
                    la.or(follow);
                }
            }
            RuleOption::Multi { min, item, .. } => {
                la.or(firsts.firsts(item));
                if rp.position == 1 || min == 0 || firsts.is_epsilon_set(item) {
                    la.or(follow);
                }
            }
            RuleOption::SeparatedList {
                min,
                item,
                separator,
                ..
            } => {
                if rp.position == 1 {
                    la.or(firsts.firsts(separator));
                    la.or(follow);
                    if firsts.is_epsilon_set(separator) {
                        la.or(firsts.firsts(item));
                    }
                } else {
                    la.or(firsts.firsts(item));
                    if firsts.is_epsilon_set(item) {
                        la.or(firsts.firsts(separator));
                        la.or(follow);
                    }
                    if rp.position == 0 && min == 0 {
                        la.or(follow);
                    }
                }
            }
        }
    }

    /// Does every transition created so far in `self` also exist (or, when `other` is lazily
    /// built, get created) in `other`, between states with the same positions and with the same
    /// guards? State numbers are ignored, since they depend on the order states were created.
    pub fn is_consistent_with(&self, other: &StateSet) -> bool {
        if self.grm.id() != other.grm.id()
            || self.goal != other.goal
            || self.strategy != other.strategy
        {
            return false;
        }
        // Snapshot what we hold so that `other` may be `self` without deadlocking.
        type Described = Vec<(Action, Arc<ParserState>, Option<Arc<ParserState>>, LookaheadSet)>;
        let (widths, completes) = {
            let inner = self.read();
            let describe = |ts: &[Transition]| -> Described {
                ts.iter()
                    .map(|t| {
                        (
                            t.action,
                            Arc::clone(&inner.states[usize::from(t.to)]),
                            t.context.map(|c| Arc::clone(&inner.states[usize::from(c)])),
                            t.guard.clone(),
                        )
                    })
                    .collect()
            };
            let widths = inner
                .widths
                .iter()
                .map(|(st, ts)| (Arc::clone(&inner.states[usize::from(*st)]), describe(ts)))
                .collect::<Vec<_>>();
            let completes = inner
                .completes
                .iter()
                .map(|((st, c), ts)| {
                    (Arc::clone(&inner.states[usize::from(*st)]), *c, describe(ts))
                })
                .collect::<Vec<_>>();
            (widths, completes)
        };

        let other_describe = |ts: &[Transition]| -> Described {
            ts.iter()
                .map(|t| {
                    (
                        t.action,
                        other.state(t.to),
                        t.context.map(|c| other.state(c)),
                        t.guard.clone(),
                    )
                })
                .collect()
        };
        let other_idx = |ps: &ParserState| -> StIdx {
            let mut inner = other.write();
            other.intern(&mut inner, ps.clone())
        };
        for (ps, mine) in widths {
            if other_describe(&other.width_transitions(other_idx(ps.as_ref()))) != mine {
                return false;
            }
        }
        for (ps, c, mine) in completes {
            if other_describe(&other.complete_transitions(other_idx(ps.as_ref()), c)) != mine {
                return false;
            }
        }
        true
    }

    /// Are `self` and `other` the same automaton? Lazily built sets are completed as a side
    /// effect, so a lazily built set matches the eagerly built set for the same goal.
    pub fn matches(&self, other: &StateSet) -> bool {
        if !self.is_consistent_with(other) || !other.is_consistent_with(self) {
            return false;
        }
        let mine = self.read().states.clone();
        mine.len() == other.states_len()
            && mine.iter().all(|ps| other.read().index.contains_key(ps))
    }

    /// Pretty print the states and the transitions created so far as a `String`.
    pub fn pp(&self) -> String {
        fn num_digits(i: usize) -> usize {
            if i == 0 {
                1
            } else {
                ((i as f64).log10() as usize) + 1
            }
        }

        let inner = self.read();
        let width = num_digits(inner.states.len());
        let grm = &self.grm;
        let mut completes = inner.completes.iter().collect::<Vec<_>>();
        completes.sort_by_key(|((st, c), _)| (*st, *c));
        let mut o = String::new();
        for (i, ps) in inner.states.iter().enumerate() {
            let stidx = StIdx::from(i);
            if i > 0 {
                o.push('\n');
            }
            write!(o, "{}:{}", i, " ".repeat(width - num_digits(i))).ok();
            for (j, rp) in ps.positions().iter().enumerate() {
                if j > 0 {
                    write!(o, "\n{}", " ".repeat(width + 1)).ok();
                }
                write!(o, " {}", rp.pp(grm, self.goal)).ok();
            }
            let indent = " ".repeat(width + 2);
            if let Some(ts) = inner.widths.get(&stidx) {
                for t in ts.iter() {
                    write!(o, "\n{}WIDTH -> {}", indent, t.to).ok();
                }
            }
            for ((_, c), ts) in completes.iter().filter(|((st, _), _)| *st == stidx) {
                for t in ts.iter() {
                    let action = match t.action {
                        Action::Width => "WIDTH",
                        Action::Height => "HEIGHT",
                        Action::Graft => "GRAFT",
                        Action::Goal => "GOAL",
                    };
                    write!(
                        o,
                        "\n{}{}: {} -> {} {}",
                        indent,
                        grm.rule_name(*c),
                        action,
                        t.to,
                        t.guard.pp(grm)
                    )
                    .ok();
                }
            }
        }
        o
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{Action, StateSet};
    use crate::{
        AutomatonErrorKind, LookaheadStrategy, StIdx,
        position::{END, RulePosition},
    };
    use lcgrammar::{
        Grammar, RIdx,
        def::{GrammarDef, concat, lit, longest, nt, opt, slist},
    };

    fn left_recursive() -> Arc<Grammar> {
        Arc::new(
            Grammar::new(
                &GrammarDef::new("LR")
                    .rule("S", longest(vec![vec![lit("a")], vec![nt("S1")]]))
                    .rule("S1", concat(vec![nt("S"), lit("a")])),
            )
            .unwrap(),
        )
    }

    /// Panics unless a state with exactly the positions `rps` (given as `(rule, option,
    /// position)`) exists.
    fn state_exists(ss: &StateSet, rps: &[(&str, usize, u32)]) -> StIdx {
        let grm = ss.grammar();
        let rps = rps
            .iter()
            .map(|(n, o, p)| RulePosition::new(grm.rule_idx(n).unwrap(), *o, *p))
            .collect::<Vec<_>>();
        match ss.state_idx(&rps) {
            Some(st) => st,
            None => panic!("No state {:?} in\n{}", rps, ss.pp()),
        }
    }

    #[test]
    fn left_recursion() {
        let grm = left_recursive();
        let s = grm.rule_idx("S").unwrap();
        let s1 = grm.rule_idx("S1").unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let ss = StateSet::build_for(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        assert_eq!(ss.states_len(), 6);
        let start = ss.start_state();

        let widths = ss.width_transitions(start);
        assert_eq!(widths.len(), 1);
        assert_eq!(ss.state(widths[0].to).rule(), a);

        let ts = ss.complete_transitions(start, a);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].action, Action::Height);
        assert_eq!(ts[0].to, state_exists(&ss, &[("S", 0, END)]));
        assert_eq!(ts[0].guard.pp(&grm), "{<eot>, 'a'}");

        let ts = ss.complete_transitions(start, s);
        assert_eq!(
            ts.iter().map(|t| t.action).collect::<Vec<_>>(),
            vec![Action::Goal, Action::Height]
        );
        let s1_1 = state_exists(&ss, &[("S1", 0, 1)]);
        assert_eq!(ts[1].to, s1_1);
        assert_eq!(ts[1].guard.pp(&grm), "{'a'}");

        let ts = ss.complete_transitions(s1_1, a);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].action, Action::Graft);
        assert_eq!(ts[0].to, state_exists(&ss, &[("S1", 0, END)]));
        assert_eq!(ts[0].context, Some(s1_1));

        state_exists(&ss, &[("S", 1, END)]);
        assert!(ss.complete_transitions(start, s1).iter().all(|t| t.action == Action::Height));
    }

    #[test]
    fn shared_prefixes_share_a_state() {
        let grm = Arc::new(
            Grammar::new(&GrammarDef::new("T").rule(
                "S",
                longest(vec![
                    vec![lit("a"), lit("b")],
                    vec![lit("a"), lit("c")],
                    vec![lit("d")],
                ]),
            ))
            .unwrap(),
        );
        let s = grm.rule_idx("S").unwrap();
        let ss = StateSet::new(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let ts = ss.complete_transitions(ss.start_state(), a);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].to, state_exists(&ss, &[("S", 0, 1), ("S", 1, 1)]));
        assert_eq!(ts[0].guard.pp(&grm), "{'b', 'c'}");
        assert_eq!(ss.width_transitions(ts[0].to).len(), 2);
    }

    #[test]
    fn lists_and_empty() {
        let grm = Arc::new(
            Grammar::new(
                &GrammarDef::new("T")
                    .rule("S", concat(vec![nt("O"), nt("L")]))
                    .rule("O", opt(lit("o")))
                    .rule("L", slist(0, None, lit("x"), lit(","))),
            )
            .unwrap(),
        );
        let s = grm.rule_idx("S").unwrap();
        let o = grm.rule_idx("O").unwrap();
        let x = grm.rule_idx("'x'").unwrap();
        let empty = grm.empty_ridx();
        let ss = StateSet::build_for(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        let start = ss.start_state();
        let widths = ss
            .width_transitions(start)
            .iter()
            .map(|t| ss.state(t.to).rule())
            .collect::<Vec<_>>();
        assert_eq!(widths, vec![empty, grm.rule_idx("'o'").unwrap()]);

        let ts = ss.complete_transitions(start, empty);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].to, state_exists(&ss, &[("O", 1, END)]));
        // O may be followed by L, which may be empty, so by <eot> too.
        assert_eq!(ts[0].guard.pp(&grm), "{<eot>, 'x'}");

        let after_o = ss.complete_transitions(start, o);
        assert_eq!(after_o[0].to, state_exists(&ss, &[("S", 0, 1)]));
        let l_item = state_exists(&ss, &[("L", 0, 1)]);
        let ts = ss.complete_transitions(after_o[0].to, x);
        assert_eq!(ts[0].to, l_item);
        assert_eq!(ts[0].guard.pp(&grm), "{<eot>, ','}");
        let sep = ss.complete_transitions(l_item, grm.rule_idx("','").unwrap());
        assert_eq!(sep[0].action, Action::Graft);
        assert_eq!(sep[0].to, state_exists(&ss, &[("L", 0, 2)]));
        assert_eq!(sep[0].guard.pp(&grm), "{'x'}");
    }

    #[test]
    fn no_lookahead() {
        let grm = left_recursive();
        let s = grm.rule_idx("S").unwrap();
        let ss = StateSet::build_for(Arc::clone(&grm), s, LookaheadStrategy::None).unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let ts = ss.complete_transitions(ss.start_state(), a);
        assert!(ts[0].guard.is_any());
        // The goal transition always needs the end of the text.
        let ts = ss.complete_transitions(ss.start_state(), s);
        assert!(!ts[0].guard.is_any());
    }

    #[test]
    fn lazy_and_eager_agree() {
        let grm = left_recursive();
        let s = grm.rule_idx("S").unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let eager = StateSet::build_for(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        let lazy = StateSet::new(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        lazy.width_transitions(lazy.start_state());
        lazy.complete_transitions(lazy.start_state(), a);
        assert!(lazy.states_len() < eager.states_len());
        assert!(lazy.is_consistent_with(&eager));
        assert!(eager.matches(&lazy));
        assert_eq!(lazy.states_len(), eager.states_len());

        let eager2 = StateSet::build_for(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        assert!(eager.matches(&eager2));
        assert!(eager.matches(&eager));
        let s1 = grm.rule_idx("S1").unwrap();
        let other_goal = StateSet::build_for(Arc::clone(&grm), s1, LookaheadStrategy::Lc1).unwrap();
        assert!(!eager.matches(&other_goal));
    }

    #[test]
    fn pp() {
        let grm = left_recursive();
        let s = grm.rule_idx("S").unwrap();
        let ss = StateSet::new(Arc::clone(&grm), s, LookaheadStrategy::Lc1).unwrap();
        ss.width_transitions(ss.start_state());
        ss.complete_transitions(ss.start_state(), grm.rule_idx("'a'").unwrap());
        assert_eq!(
            ss.pp(),
            "0: [<goal> ::= . S]
   WIDTH -> 1
   'a': HEIGHT -> 2 {<eot>, 'a'}
1: ['a']
2: [S ::= 'a' .]"
        );
    }

    #[test]
    fn bad_goals() {
        let grm = left_recursive();
        match StateSet::new(Arc::clone(&grm), RIdx(999), LookaheadStrategy::Lc1) {
            Err(e) => assert_eq!(e.kind, AutomatonErrorKind::UnknownGoal("999".to_owned())),
            Ok(_) => panic!(),
        }
        match StateSet::new(Arc::clone(&grm), grm.eot_ridx(), LookaheadStrategy::Lc1) {
            Err(e) => assert_eq!(e.kind, AutomatonErrorKind::BuiltinGoal("<eot>".to_owned())),
            Ok(_) => panic!(),
        }
    }
}
