use std::{error::Error, fmt, sync::Arc};

use fnv::FnvHashMap;
use lcauto::{
    Action, AutomatonError, AutomatonErrorKind, LookaheadSet, LookaheadStrategy, StateSet,
    state_set_for,
};
use lcgrammar::{Grammar, GrammarId, RIdx, Rhs, RuleOption, Span};
use lcscan::{LeafData, ScanError, Scanner, Sentence, TerminalTable};

use crate::{
    IssueKind, IssueSet, ParseIssue, Sppt,
    gss::{GnIdx, Gss, GrowingNode},
    treedata::{ChildRef, TreeData},
};

/// The ways a parse can be stopped before it has finished.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AbortKind {
    /// A node had more alternatives than [`ParseOptions::max_alternatives`].
    AmbiguityLimit,
    /// The GSS grew beyond [`ParseOptions::max_gss_nodes`].
    GssLimit,
}

/// A parse which was stopped because it exceeded a resource limit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AbortError {
    pub kind: AbortKind,
    /// The limit which was exceeded.
    pub limit: usize,
    /// The position the parse had reached.
    pub position: usize,
}

impl Error for AbortError {}

impl fmt::Display for AbortError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            AbortKind::AmbiguityLimit => write!(
                f,
                "Parse aborted at position {}: more than {} alternatives",
                self.position, self.limit
            ),
            AbortKind::GssLimit => write!(
                f,
                "Parse aborted at position {}: more than {} GSS nodes",
                self.position, self.limit
            ),
        }
    }
}

/// Any failure to produce a parse tree.
#[derive(Debug)]
pub enum ParseError {
    /// The sentence is not in the language of the grammar.
    Issues(IssueSet),
    Abort(AbortError),
    /// The goal could not be parsed for.
    Automaton(AutomatonError),
    /// One of the grammar's terminals could not be compiled.
    Scan(ScanError),
}

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Issues(e) => fmt::Display::fmt(e, f),
            ParseError::Abort(e) => fmt::Display::fmt(e, f),
            ParseError::Automaton(e) => fmt::Display::fmt(e, f),
            ParseError::Scan(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<IssueSet> for ParseError {
    fn from(err: IssueSet) -> Self {
        ParseError::Issues(err)
    }
}

impl From<AbortError> for ParseError {
    fn from(err: AbortError) -> Self {
        ParseError::Abort(err)
    }
}

impl From<AutomatonError> for ParseError {
    fn from(err: AutomatonError) -> Self {
        ParseError::Automaton(err)
    }
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> Self {
        ParseError::Scan(err)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    pub lookahead: LookaheadStrategy,
    /// Succeed if a prefix of the sentence (rather than all of it) matches the goal. The
    /// longest matching prefix is used.
    pub accept_prefix: bool,
    /// The most alternatives any one node may have before the parse is aborted.
    pub max_alternatives: usize,
    /// The most growing nodes a parse may create before it is aborted. `None` is unlimited.
    pub max_gss_nodes: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            lookahead: LookaheadStrategy::default(),
            accept_prefix: false,
            max_alternatives: 64,
            max_gss_nodes: None,
        }
    }
}

/// Counts of what a parse created. Sub-parses of embedded grammars are included.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ParseStats {
    pub gss_nodes: usize,
    pub completed_nodes: usize,
    pub leaves: usize,
}

impl ParseStats {
    fn add(&mut self, other: ParseStats) {
        self.gss_nodes += other.gss_nodes;
        self.completed_nodes += other.completed_nodes;
        self.leaves += other.leaves;
    }
}

pub struct LcParserBuilder {
    grm: Arc<Grammar>,
    options: ParseOptions,
}

impl LcParserBuilder {
    pub fn new(grm: Arc<Grammar>) -> Self {
        LcParserBuilder {
            grm,
            options: ParseOptions::default(),
        }
    }

    /// Set the lookahead strategy of the automata this parser uses.
    pub fn lookahead(mut self, lookahead: LookaheadStrategy) -> Self {
        self.options.lookahead = lookahead;
        self
    }

    pub fn accept_prefix(mut self, accept_prefix: bool) -> Self {
        self.options.accept_prefix = accept_prefix;
        self
    }

    pub fn max_alternatives(mut self, max_alternatives: usize) -> Self {
        self.options.max_alternatives = max_alternatives;
        self
    }

    pub fn max_gss_nodes(mut self, max_gss_nodes: Option<usize>) -> Self {
        self.options.max_gss_nodes = max_gss_nodes;
        self
    }

    /// Build the parser, compiling the terminals of the grammar and of every grammar embedded
    /// in it.
    pub fn build(self) -> Result<LcParser, ParseError> {
        let mut tables = FnvHashMap::default();
        let mut todo = vec![Arc::clone(&self.grm)];
        while let Some(grm) = todo.pop() {
            if tables.contains_key(&grm.id()) {
                continue;
            }
            tables.insert(grm.id(), TerminalTable::new(&grm)?);
            for ridx in grm.iter_rules() {
                if let Rhs::Embedded { grammar, .. } = grm.rule(ridx).rhs() {
                    todo.push(Arc::clone(grammar));
                }
            }
        }
        Ok(LcParser {
            grm: self.grm,
            tables,
            options: self.options,
        })
    }
}

/// A parser for one grammar. It may be used for any number of parses, of any goal, and shared
/// between threads.
pub struct LcParser {
    grm: Arc<Grammar>,
    tables: FnvHashMap<GrammarId, TerminalTable>,
    options: ParseOptions,
}

impl LcParser {
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grm
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The automaton this parser uses for `goal`.
    pub fn state_set(&self, goal: &str) -> Result<Arc<StateSet>, ParseError> {
        let ridx = self.goal_idx(goal)?;
        Ok(state_set_for(&self.grm, ridx, self.options.lookahead)?)
    }

    /// Parse all of `sentence` (or, if this parser accepts prefixes, the longest prefix
    /// possible) as `goal`.
    pub fn parse_for_goal(&self, goal: &str, sentence: &Sentence) -> Result<Sppt, ParseError> {
        self.parse_for_goal_at(goal, sentence, 0)
    }

    /// Parse `sentence` from byte `start` as `goal`.
    ///
    /// # Panics
    ///
    /// If `start` exceeds the sentence length or is not on a `char` boundary.
    pub fn parse_for_goal_at(
        &self,
        goal: &str,
        sentence: &Sentence,
        start: usize,
    ) -> Result<Sppt, ParseError> {
        self.parse_with_stats(goal, sentence, start).0
    }

    /// As [`LcParser::parse_for_goal_at`], also returning counts of what the parse created.
    pub fn parse_with_stats(
        &self,
        goal: &str,
        sentence: &Sentence,
        start: usize,
    ) -> (Result<Sppt, ParseError>, ParseStats) {
        if start > sentence.len() {
            panic!(
                "Start position {} exceeds known input length {}",
                start,
                sentence.len()
            );
        }
        let ridx = match self.goal_idx(goal) {
            Ok(ridx) => ridx,
            Err(e) => return (Err(e), ParseStats::default()),
        };
        let text = Arc::from(sentence.text());
        self.run(
            &self.grm,
            ridx,
            sentence,
            &text,
            start,
            self.options.accept_prefix,
        )
    }

    fn goal_idx(&self, goal: &str) -> Result<RIdx, ParseError> {
        self.grm.rule_idx(goal).ok_or_else(|| {
            ParseError::Automaton(AutomatonError {
                kind: AutomatonErrorKind::UnknownGoal(goal.to_owned()),
            })
        })
    }

    /// Parse `sentence` from `start` as `goal` of `grm`, which is either this parser's grammar or
    /// one embedded in it.
    fn run(
        &self,
        grm: &Arc<Grammar>,
        goal: RIdx,
        sentence: &Sentence,
        text: &Arc<str>,
        start: usize,
        accept_prefix: bool,
    ) -> (Result<Sppt, ParseError>, ParseStats) {
        let states = match state_set_for(grm, goal, self.options.lookahead) {
            Ok(states) => states,
            Err(e) => return (Err(e.into()), ParseStats::default()),
        };
        let built;
        let table = match self.tables.get(&grm.id()) {
            Some(table) => table,
            None => match TerminalTable::new(grm) {
                Ok(table) => {
                    built = table;
                    &built
                }
                Err(e) => return (Err(e.into()), ParseStats::default()),
            },
        };
        log::debug!(
            "Parsing for '{}' of grammar '{}' from position {}",
            grm.rule_name(goal),
            grm.name(),
            start
        );
        let mut engine = Engine {
            parser: self,
            grm,
            states,
            scanner: Scanner::new(grm, table, sentence),
            text,
            len: sentence.len(),
            start,
            accept_prefix,
            gss: Gss::new(),
            tree: TreeData::new(),
            failure: Failure::default(),
            subparses: FnvHashMap::default(),
            sub_stats: ParseStats::default(),
        };
        let res = engine.grow();
        let stats = engine.stats();
        let res = res.and_then(|()| engine.finish());
        log::debug!(
            "Parse for '{}' {}: {} GSS nodes, {} completed nodes, {} leaves",
            grm.rule_name(goal),
            if res.is_ok() { "succeeded" } else { "failed" },
            stats.gss_nodes,
            stats.completed_nodes,
            stats.leaves
        );
        (res, stats)
    }
}

/// The furthest point any parse path reached before failing, and what would have let it go on.
#[derive(Default)]
struct Failure {
    position: Option<usize>,
    expected: Vec<RIdx>,
    trying_for: Vec<RIdx>,
}

impl Failure {
    fn record<I>(&mut self, position: usize, expected: I, trying_for: RIdx)
    where
        I: IntoIterator<Item = RIdx>,
    {
        match self.position {
            Some(p) if p > position => return,
            Some(p) if p == position => (),
            _ => {
                self.position = Some(position);
                self.expected.clear();
                self.trying_for.clear();
            }
        }
        for t in expected {
            if let Err(i) = self.expected.binary_search(&t) {
                self.expected.insert(i, t);
            }
        }
        if let Err(i) = self.trying_for.binary_search(&trying_for) {
            self.trying_for.insert(i, trying_for);
        }
    }
}

/// The state of one parse of one grammar.
struct Engine<'a, 'input> {
    parser: &'a LcParser,
    grm: &'a Arc<Grammar>,
    states: Arc<StateSet>,
    scanner: Scanner<'a, 'input>,
    text: &'a Arc<str>,
    len: usize,
    start: usize,
    accept_prefix: bool,
    gss: Gss,
    tree: TreeData,
    failure: Failure,
    /// The result of each sub-parse of an embedded rule at a position: the embedded tree and
    /// where it ends.
    subparses: FnvHashMap<(RIdx, usize), Option<(ChildRef, usize)>>,
    sub_stats: ParseStats,
}

impl Engine<'_, '_> {
    fn stats(&self) -> ParseStats {
        let mut stats = ParseStats {
            gss_nodes: self.gss.len(),
            completed_nodes: self.tree.completes_len(),
            leaves: self.tree.leaves_len(),
        };
        stats.add(self.sub_stats);
        stats
    }

    /// Process growing nodes in order of position until none are left.
    fn grow(&mut self) -> Result<(), ParseError> {
        let start_node = GrowingNode {
            state: self.states.start_state(),
            rule: self.grm.goal_ridx(),
            start: self.start,
            next: self.start,
            nchildren: 0,
        };
        self.add_node(start_node)?;
        while let Some(gn) = self.gss.pop() {
            self.process(gn)?;
        }
        Ok(())
    }

    fn add_node(&mut self, node: GrowingNode) -> Result<GnIdx, ParseError> {
        let (gn, new) = self.gss.add_node(node);
        if new {
            if let Some(max) = self.parser.options.max_gss_nodes {
                if self.gss.len() > max {
                    return Err(AbortError {
                        kind: AbortKind::GssLimit,
                        limit: max,
                        position: node.next,
                    }
                    .into());
                }
            }
        }
        Ok(gn)
    }

    /// Complete every option `gn` can complete, then match whatever it expects next.
    fn process(&mut self, gn: GnIdx) -> Result<(), ParseError> {
        let grm = self.grm;
        let node = *self.gss.node(gn);
        let trying_for = if node.rule == grm.goal_ridx() {
            self.states.goal()
        } else {
            node.rule
        };
        let state = self.states.state(node.state);
        let mut options = state
            .completable(grm)
            .map(|rp| rp.option as usize)
            .filter(|o| self.list_may_complete(&node, *o))
            .collect::<Vec<_>>();
        options.sort();
        options.dedup();
        for o in options {
            self.complete(gn, o)?;
        }

        let widths = self.states.width_transitions(node.state);
        if widths.is_empty() {
            return Ok(());
        }
        let q = self.scanner.skip_end(node.next);
        let mut candidates = Vec::new();
        for t in widths.iter() {
            let term = self.states.state(t.to).rule();
            if term == grm.empty_ridx() {
                let child = self.tree.leaf(LeafData {
                    rule: term,
                    is_pattern: false,
                    start: q,
                    len: 0,
                });
                self.use_complete(gn, term, q, q, child)?;
            } else if let Rhs::Embedded { grammar, goal } = grm.rule(term).rhs() {
                match self.subparse(term, grammar, *goal, q)? {
                    Some((child, end)) => self.use_complete(gn, term, q, end, child)?,
                    None => self.failure.record(q, [term], trying_for),
                }
            } else {
                candidates.push(term);
            }
        }
        if !candidates.is_empty() {
            match self.scanner.find_best(q, candidates.iter().cloned()) {
                Some(leaf) => {
                    let child = self.tree.leaf(leaf);
                    self.use_complete(gn, leaf.rule, q, leaf.end(), child)?;
                }
                None => self.failure.record(q, candidates, trying_for),
            }
        }
        Ok(())
    }

    /// Has a list node matched enough items to complete? A list matching nothing completes
    /// through the list's empty option instead, when it has one.
    fn list_may_complete(&self, node: &GrowingNode, option: usize) -> bool {
        let items = match self.grm.rule(node.rule).option(option) {
            RuleOption::Sequence(_) => return true,
            RuleOption::Multi { min, .. } => (node.nchildren, min),
            RuleOption::SeparatedList { min, .. } => (node.nchildren.div_ceil(2), min),
        };
        if items.1 == 0 && node.start == node.next {
            return false;
        }
        items.0 >= items.1.max(1) as usize
    }

    /// May `node`, a list node extending `prev` (if any) with `child`, exist? It mustn't have
    /// more items than the list's maximum. Once it has the list's minimum, an empty item is
    /// only allowed after a separator that matched something, as otherwise empty items could
    /// repeat forever.
    fn list_accepts(&self, node: &GrowingNode, prev: Option<GnIdx>, child: ChildRef) -> bool {
        let rule = self.grm.rule(node.rule);
        if !rule.is_list() || self.states.state(node.state).positions()[0].option != 0 {
            return true;
        }
        let (min, max, separated) = match rule.option(0) {
            RuleOption::Multi { min, max, .. } => (min, max, false),
            RuleOption::SeparatedList { min, max, .. } => (min, max, true),
            RuleOption::Sequence(_) => return true,
        };
        let items = |nchildren: usize| {
            if separated {
                nchildren.div_ceil(2)
            } else {
                nchildren
            }
        };
        let k = node.nchildren;
        if let Some(max) = max {
            if items(k) > max as usize {
                return false;
            }
        }
        let is_item = !separated || (k - 1) % 2 == 0;
        if !is_item || !self.tree.child_span(child).is_empty() {
            return true;
        }
        if separated {
            match prev {
                Some(sep) if self.tree.ends_with_empty(sep) => (),
                _ => return true,
            }
        }
        items(k - 1) < min as usize
    }

    /// Record that `gn` completed option `option`, announcing the completion to every node
    /// waiting for it if it is the first derivation of its rule and span.
    fn complete(&mut self, gn: GnIdx, option: usize) -> Result<(), ParseError> {
        let node = *self.gss.node(gn);
        let (cidx, new) = self
            .tree
            .complete(gn, node.rule, option, node.start, node.next);
        if new {
            log::trace!(
                "Completed '{}' over {}..{}",
                self.grm.rule_name(node.rule),
                node.start,
                node.next
            );
            let child = ChildRef::Complete(cidx);
            for ctx in self.gss.add_end(node.rule, node.start, node.next) {
                self.use_complete(ctx, node.rule, node.start, node.next, child)?;
            }
        }
        Ok(())
    }

    /// Take the transitions a node in state `ctx` has for `completed`, which was matched over
    /// `start..end` as `child`.
    fn use_complete(
        &mut self,
        ctx: GnIdx,
        completed: RIdx,
        start: usize,
        end: usize,
        child: ChildRef,
    ) -> Result<(), ParseError> {
        let mut todo = vec![(ctx, completed, start, end, child)];
        while let Some((ctx, completed, start, end, child)) = todo.pop() {
            let cnode = *self.gss.node(ctx);
            let ts = self.states.complete_transitions(cnode.state, completed);
            if ts.is_empty() {
                continue;
            }
            let q = self.scanner.skip_end(end);
            for t in ts.iter() {
                let target = match t.action {
                    Action::Goal => self.states.goal(),
                    _ => self.states.state(t.to).rule(),
                };
                if !self.guard_admits(&t.guard, q) {
                    self.failure.record(q, t.guard.iter(), target);
                    continue;
                }
                match t.action {
                    Action::Goal => {
                        if let ChildRef::Complete(cidx) = child {
                            self.tree.set_root_to(cidx);
                        }
                    }
                    Action::Graft => {
                        let node = GrowingNode {
                            state: t.to,
                            rule: target,
                            start: cnode.start,
                            next: end,
                            nchildren: cnode.nchildren + 1,
                        };
                        if self.list_accepts(&node, Some(ctx), child) {
                            let gn = self.add_node(node)?;
                            self.tree.set_next_child(ctx, gn, child);
                        }
                    }
                    Action::Height => {
                        let node = GrowingNode {
                            state: t.to,
                            rule: target,
                            start,
                            next: end,
                            nchildren: 1,
                        };
                        if !self.list_accepts(&node, None, child) {
                            continue;
                        }
                        let gn = self.add_node(node)?;
                        self.tree.set_first_child(gn, child);
                        if let Some(ends) = self.gss.add_context(target, start, ctx) {
                            for e in ends {
                                if let Some(cidx) = self.tree.complete_idx(target, start, e) {
                                    todo.push((ctx, target, start, e, ChildRef::Complete(cidx)));
                                }
                            }
                        }
                    }
                    Action::Width => (),
                }
            }
        }
        Ok(())
    }

    /// Can one of the terminals in `guard` come next at `pos`?
    fn guard_admits(&mut self, guard: &LookaheadSet, pos: usize) -> bool {
        if guard.is_any() {
            return true;
        }
        let grm = self.grm;
        guard.iter().any(|t| {
            if t == grm.eot_ridx() {
                pos == self.len || self.accept_prefix
            } else if t == grm.empty_ridx() || grm.rule(t).is_embedded() {
                true
            } else {
                self.scanner.match_len(t, pos).is_some()
            }
        })
    }

    /// Parse the embedded rule `t` at `pos`, reusing the result of any earlier sub-parse there.
    fn subparse(
        &mut self,
        t: RIdx,
        grammar: &Arc<Grammar>,
        goal: RIdx,
        pos: usize,
    ) -> Result<Option<(ChildRef, usize)>, ParseError> {
        if let Some(r) = self.subparses.get(&(t, pos)) {
            return Ok(*r);
        }
        let (res, stats) =
            self.parser
                .run(grammar, goal, self.scanner.sentence(), self.text, pos, true);
        self.sub_stats.add(stats);
        let r = match res {
            Ok(sppt) => {
                let end = sppt.span().end();
                Some((self.tree.embedded(t, sppt), end))
            }
            Err(ParseError::Issues(_)) => None,
            Err(e) => return Err(e),
        };
        self.subparses.insert((t, pos), r);
        Ok(r)
    }

    /// Build the tree, or explain why there isn't one.
    fn finish(&mut self) -> Result<Sppt, ParseError> {
        let tree = std::mem::replace(&mut self.tree, TreeData::new());
        let end = match tree.root() {
            Some(cidx) => tree.complete_node(cidx).end,
            None => return Err(ParseError::Issues(self.issues())),
        };
        let span = if self.accept_prefix {
            Span::new(self.start, end)
        } else {
            Span::new(self.start, self.len)
        };
        Ok(tree.into_sppt(
            self.grm,
            &self.gss,
            &mut self.scanner,
            Arc::clone(self.text),
            span,
            self.parser.options.max_alternatives,
        )?)
    }

    fn issues(&mut self) -> IssueSet {
        let grm = self.grm;
        let position = self.failure.position.unwrap_or(self.start);
        let (kind, length) = if position == self.len {
            (IssueKind::UnexpectedEnd, 0)
        } else {
            match self.scanner.find_best(position, grm.iter_terminals()) {
                Some(leaf) => (IssueKind::UnexpectedText, leaf.len),
                None => (
                    IssueKind::UnrecognisedText,
                    self.text[position..]
                        .chars()
                        .next()
                        .map_or(0, |c| c.len_utf8()),
                ),
            }
        };
        let names = |rules: &[RIdx]| {
            let mut names = rules
                .iter()
                .filter(|r| **r != grm.empty_ridx())
                .map(|r| grm.rule_name(*r).to_owned())
                .collect::<Vec<_>>();
            names.sort();
            names
        };
        let mut issues = IssueSet::new();
        issues.push(ParseIssue {
            kind,
            location: self.scanner.sentence().location(position, length),
            trying_for: names(self.failure.trying_for.as_slice()),
            expected: names(self.failure.expected.as_slice()),
        });
        issues
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use lcgrammar::{
        Grammar,
        def::{GrammarDef, concat, lit, longest, nt, pat, star},
    };
    use lcscan::Sentence;

    use super::{AbortKind, LcParserBuilder, ParseError};
    use crate::IssueKind;

    fn calc() -> Arc<Grammar> {
        Arc::new(
            Grammar::new(
                &GrammarDef::new("Calc")
                    .rule(
                        "Expr",
                        longest(vec![vec![nt("Expr"), lit("+"), nt("Term")], vec![nt("Term")]]),
                    )
                    .rule(
                        "Term",
                        longest(vec![vec![nt("Term"), lit("*"), nt("Factor")], vec![nt("Factor")]]),
                    )
                    .rule(
                        "Factor",
                        longest(vec![vec![lit("("), nt("Expr"), lit(")")], vec![nt("INT")]]),
                    )
                    .leaf("INT", pat("[0-9]+"))
                    .skip("WS", pat("[ \\t]+")),
            )
            .unwrap(),
        )
    }

    #[test]
    fn calc_parses() {
        let p = LcParserBuilder::new(calc()).build().unwrap();
        let s = Sentence::new("2 + 3 * 4");
        let t = p.parse_for_goal("Expr", &s).unwrap();
        assert_eq!(
            t.to_string(),
            "Expr { Expr : Term : Factor : INT : '2' '+' Term { Term : Factor : INT : '3' '*' \
             Factor : INT : '4' } }"
        );
        assert!(t.ambiguities().is_empty());
    }

    #[test]
    fn unexpected_text() {
        let p = LcParserBuilder::new(calc()).build().unwrap();
        let s = Sentence::new("2 + * 4");
        match p.parse_for_goal("Expr", &s) {
            Err(ParseError::Issues(is)) => {
                assert_eq!(is.len(), 1);
                let i = is.iter().next().unwrap();
                assert_eq!(i.kind(), IssueKind::UnexpectedText);
                assert_eq!(i.location().position, 4);
                assert_eq!(i.location().length, 1);
                assert_eq!(i.expected(), &["'('", "INT"]);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn unrecognised_text() {
        let p = LcParserBuilder::new(calc()).build().unwrap();
        let s = Sentence::new("2 + x");
        match p.parse_for_goal("Expr", &s) {
            Err(ParseError::Issues(is)) => {
                let i = is.iter().next().unwrap();
                assert_eq!(i.kind(), IssueKind::UnrecognisedText);
                assert_eq!(i.location().position, 4);
                assert_eq!(i.location().column, 5);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn unknown_goal() {
        let p = LcParserBuilder::new(calc()).build().unwrap();
        match p.parse_for_goal("Nope", &Sentence::new("1")) {
            Err(ParseError::Automaton(e)) => assert_eq!(e.to_string(), "Unknown goal rule 'Nope'"),
            _ => panic!(),
        }
    }

    #[test]
    fn prefixes_and_offsets() {
        let p = LcParserBuilder::new(calc())
            .accept_prefix(true)
            .build()
            .unwrap();
        let s = Sentence::new("1 + 2 )");
        let t = p.parse_for_goal("Expr", &s).unwrap();
        assert_eq!(t.span().end(), 5);
        assert_eq!(t.matched_text(t.root()), "1 + 2");

        let p = LcParserBuilder::new(calc()).build().unwrap();
        let s = Sentence::new("x = 1 * 2");
        let t = p.parse_for_goal_at("Expr", &s, 3).unwrap();
        assert_eq!(t.span().start(), 3);
        assert_eq!(
            t.to_string(),
            "Expr : Term { Term : Factor : INT : '1' '*' Factor : INT : '2' }"
        );
    }

    #[test]
    fn gss_limit() {
        let grm = Arc::new(
            Grammar::new(&GrammarDef::new("T").rule("S", star(concat(vec![lit("a"), lit("b")]))))
                .unwrap(),
        );
        let p = LcParserBuilder::new(Arc::clone(&grm))
            .max_gss_nodes(Some(10))
            .build()
            .unwrap();
        match p.parse_for_goal("S", &Sentence::new(&"ab".repeat(50))) {
            Err(ParseError::Abort(e)) => {
                assert_eq!(e.kind, AbortKind::GssLimit);
                assert_eq!(e.limit, 10);
            }
            _ => panic!(),
        }
        let p = LcParserBuilder::new(grm).build().unwrap();
        let (res, stats) = p.parse_with_stats("S", &Sentence::new(&"ab".repeat(50)), 0);
        assert!(res.is_ok());
        assert!(stats.gss_nodes > 10);
        assert!(stats.leaves >= 100);
    }
}
