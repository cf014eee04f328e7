use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

use crate::{
    ChoiceKind, RIdx,
    def::{GrammarDef, ItemDef},
    error::{GrammarError, GrammarErrorKind},
    firsts::Firsts,
    leftcorner::LeftCorners,
};

const EMPTY_RIDX: RIdx = RIdx(0);
const EOT_RIDX: RIdx = RIdx(1);
const GOAL_RIDX: RIdx = RIdx(2);
const UNDEFINED_RIDX: RIdx = RIdx(3);
const EMPTY_SEQ: &[RIdx] = &[EMPTY_RIDX];

static NEXT_GRAMMAR_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique identity of a [`Grammar`]. Caches keyed on grammars use this rather than the
/// grammar's name, since two unrelated grammars may well share a name.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GrammarId(usize);

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compile `pattern` the way the scanner matches it: anchored at the scan position, with `^`/`$`
/// matching at line boundaries and `.` matching newlines. The scanner only shows the pattern the
/// text from the scan position on, so `^` and `\b` always treat the scan position as the start
/// of the text.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("\\A(?:{})", pattern))
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminal {
    Literal(String),
    Pattern(String),
}

/// The right hand side of a rule. Nested items have already been lifted into rules of their
/// own, so every item here is an index into the same arena.
#[derive(Debug)]
pub enum Rhs {
    /// The built-in terminal matching the empty string.
    Empty,
    /// The built-in terminal matching only at the end of the sentence.
    EndOfText,
    /// The built-in augmented start rule. Its single option is whatever goal an automaton is
    /// built for.
    Goal,
    /// The built-in tag given to runs of text no terminal matches.
    Undefined,
    Terminal(Terminal),
    Choice {
        kind: ChoiceKind,
        alternatives: Vec<Vec<RIdx>>,
    },
    Concatenation(Vec<RIdx>),
    Multi {
        min: u32,
        max: Option<u32>,
        item: RIdx,
    },
    SeparatedList {
        min: u32,
        max: Option<u32>,
        item: RIdx,
        separator: RIdx,
    },
    /// The goal rule `goal` of a different grammar, matched by a sub-parse.
    Embedded { grammar: Arc<Grammar>, goal: RIdx },
}

/// One option (alternative) of a non-terminal rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleOption<'a> {
    Sequence(&'a [RIdx]),
    Multi {
        min: u32,
        max: Option<u32>,
        item: RIdx,
    },
    SeparatedList {
        min: u32,
        max: Option<u32>,
        item: RIdx,
        separator: RIdx,
    },
}

#[derive(Debug)]
pub struct Rule {
    name: String,
    rhs: Rhs,
    skip: bool,
    leaf: bool,
    anonymous: bool,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rhs(&self) -> &Rhs {
        &self.rhs
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    /// Is this a user-declared terminal (a leaf or skip rule)?
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Was this rule invented while building the arena (inline terminals, nested groups,
    /// built-ins)?
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Terminals are matched by the scanner rather than derived from other rules.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.rhs,
            Rhs::Terminal(_) | Rhs::Empty | Rhs::EndOfText | Rhs::Undefined
        )
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.rhs, Rhs::Embedded { .. })
    }

    pub fn is_nonterminal(&self) -> bool {
        self.options_len() > 0
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.rhs, Rhs::Terminal(Terminal::Pattern(_)))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.rhs, Rhs::Terminal(Terminal::Literal(_)))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.rhs, Rhs::Multi { .. } | Rhs::SeparatedList { .. })
    }

    pub fn choice_kind(&self) -> Option<ChoiceKind> {
        match self.rhs {
            Rhs::Choice { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// How many options does this rule have? Lists with `min == 0` have a second option
    /// matching only the empty string. Terminals, embedded rules and the goal rule have none.
    pub fn options_len(&self) -> usize {
        match &self.rhs {
            Rhs::Choice { alternatives, .. } => alternatives.len(),
            Rhs::Concatenation(_) => 1,
            Rhs::Multi { min, .. } | Rhs::SeparatedList { min, .. } => {
                if *min == 0 {
                    2
                } else {
                    1
                }
            }
            _ => 0,
        }
    }

    /// Return option `option` of this rule. Panics if it doesn't exist.
    pub fn option(&self, option: usize) -> RuleOption<'_> {
        match (&self.rhs, option) {
            (Rhs::Choice { alternatives, .. }, o) => RuleOption::Sequence(&alternatives[o]),
            (Rhs::Concatenation(items), 0) => RuleOption::Sequence(items),
            (Rhs::Multi { min, max, item }, 0) => RuleOption::Multi {
                min: *min,
                max: *max,
                item: *item,
            },
            (
                Rhs::SeparatedList {
                    min,
                    max,
                    item,
                    separator,
                },
                0,
            ) => RuleOption::SeparatedList {
                min: *min,
                max: *max,
                item: *item,
                separator: *separator,
            },
            (Rhs::Multi { min: 0, .. }, 1) | (Rhs::SeparatedList { min: 0, .. }, 1) => {
                RuleOption::Sequence(EMPTY_SEQ)
            }
            _ => panic!("Rule '{}' has no option {}", self.name, option),
        }
    }

    /// The item an application of option `option` starts with.
    pub fn first_item(&self, option: usize) -> RIdx {
        match self.option(option) {
            RuleOption::Sequence(items) => items[0],
            RuleOption::Multi { item, .. } | RuleOption::SeparatedList { item, .. } => item,
        }
    }
}

/// An immutable arena of rules. Rules refer to each other by [`RIdx`], which is what lets
/// recursive grammars exist without ownership cycles.
///
/// The first four rules are always the built-ins `<empty>`, `<eot>`, `<goal>` and
/// `<undefined>`; user rules follow in declaration order, then the rules invented for inline
/// terminals and nested items in the order they were met.
#[derive(Debug)]
pub struct Grammar {
    id: GrammarId,
    name: String,
    rules: Vec<Rule>,
    rule_names: IndexMap<String, RIdx>,
    skip_terminals: Vec<RIdx>,
    firsts: Firsts,
    left_corners: LeftCorners,
}

impl Grammar {
    /// Build a grammar which embeds no other grammars.
    pub fn new(def: &GrammarDef) -> Result<Self, GrammarError> {
        GrammarBuilder::new(def).build()
    }

    pub fn id(&self) -> GrammarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many rules does this grammar have (including built-ins and anonymous rules)?
    pub fn rules_len(&self) -> usize {
        self.rules.len()
    }

    /// Return the rule `ridx`. Panics if it doesn't exist.
    pub fn rule(&self, ridx: RIdx) -> &Rule {
        &self.rules[usize::from(ridx)]
    }

    pub fn rule_name(&self, ridx: RIdx) -> &str {
        self.rule(ridx).name()
    }

    /// Map a rule name to an index. Inline terminals are named by their quoted text (`'a'`,
    /// `"[0-9]+"`).
    pub fn rule_idx(&self, name: &str) -> Option<RIdx> {
        self.rule_names.get(name).cloned()
    }

    /// Return an iterator which produces (in order from `0..self.rules_len()`) all this
    /// grammar's valid `RIdx`s.
    pub fn iter_rules(&self) -> impl Iterator<Item = RIdx> + use<> {
        (0..self.rules.len()).map(RIdx::from)
    }

    /// All terminals, in declaration order, excluding the built-ins.
    pub fn iter_terminals(&self) -> impl Iterator<Item = RIdx> + '_ {
        self.iter_rules()
            .filter(move |r| matches!(self.rule(*r).rhs, Rhs::Terminal(_)))
    }

    pub fn skip_terminals(&self) -> &[RIdx] {
        &self.skip_terminals
    }

    pub fn empty_ridx(&self) -> RIdx {
        EMPTY_RIDX
    }

    pub fn eot_ridx(&self) -> RIdx {
        EOT_RIDX
    }

    pub fn goal_ridx(&self) -> RIdx {
        GOAL_RIDX
    }

    pub fn undefined_ridx(&self) -> RIdx {
        UNDEFINED_RIDX
    }

    pub fn firsts(&self) -> &Firsts {
        &self.firsts
    }

    pub fn left_corners(&self) -> &LeftCorners {
        &self.left_corners
    }

    /// Can `ridx` match the empty string?
    pub fn is_nullable(&self, ridx: RIdx) -> bool {
        self.firsts.is_epsilon_set(ridx)
    }

    /// The terminals (including `<empty>` and embedded rules) which can be the first thing
    /// matched by an application of `ridx`.
    pub fn first_terminals(&self, ridx: RIdx) -> Vec<RIdx> {
        self.left_corners.first_terminals(self, ridx)
    }
}

/// Builds a [`Grammar`] from a [`GrammarDef`], resolving embedded grammar references against
/// the grammars registered with [`embed`](GrammarBuilder::embed).
pub struct GrammarBuilder<'a> {
    def: &'a GrammarDef,
    embedded: HashMap<String, Arc<Grammar>>,
}

impl<'a> GrammarBuilder<'a> {
    pub fn new(def: &'a GrammarDef) -> Self {
        GrammarBuilder {
            def,
            embedded: HashMap::new(),
        }
    }

    /// Make `grm` available to `Embedded` items under the name `name`.
    pub fn embed(mut self, name: &str, grm: Arc<Grammar>) -> Self {
        self.embedded.insert(name.to_owned(), grm);
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut lw = Lowering {
            rules: Vec::new(),
            rule_names: IndexMap::new(),
            literals: HashMap::new(),
            patterns: HashMap::new(),
            embedded: &self.embedded,
        };
        lw.push_rule("<empty>", Rhs::Empty, false, false, true);
        lw.push_rule("<eot>", Rhs::EndOfText, false, false, true);
        lw.push_rule("<goal>", Rhs::Goal, false, false, true);
        lw.push_rule("<undefined>", Rhs::Undefined, false, false, true);

        // All user rule names must be known before any right hand side is lowered, since rules
        // may refer to rules defined after them.
        let mut user_rules = Vec::with_capacity(self.def.rules.len());
        for rd in &self.def.rules {
            if lw.rule_names.contains_key(&rd.name) {
                return Err(GrammarError::new(GrammarErrorKind::DuplicateRule, &rd.name));
            }
            user_rules.push(lw.push_rule(&rd.name, Rhs::Empty, rd.skip, rd.leaf || rd.skip, false));
        }

        let mut skip_terminals = Vec::new();
        for (rd, ridx) in self.def.rules.iter().zip(user_rules) {
            let rhs = if rd.skip || rd.leaf {
                let t = match &rd.rhs {
                    ItemDef::Literal(s) if s.is_empty() => {
                        return Err(GrammarError::new(GrammarErrorKind::EmptyLiteral, &rd.name));
                    }
                    ItemDef::Literal(s) => Terminal::Literal(s.clone()),
                    ItemDef::Pattern(p) => {
                        validate_pattern(p, &rd.name)?;
                        Terminal::Pattern(p.clone())
                    }
                    _ if rd.skip => {
                        return Err(GrammarError::new(
                            GrammarErrorKind::SkipNotTerminal,
                            &rd.name,
                        ));
                    }
                    _ => {
                        return Err(GrammarError::new(
                            GrammarErrorKind::LeafNotTerminal,
                            &rd.name,
                        ));
                    }
                };
                if rd.skip {
                    skip_terminals.push(ridx);
                }
                Rhs::Terminal(t)
            } else {
                let mut counter = 0;
                lw.lower_rhs(&rd.rhs, &rd.name, &mut counter)?
            };
            lw.rules[usize::from(ridx)].rhs = rhs;
        }

        let firsts = Firsts::from_rules(&lw.rules);
        check_circularity(&lw.rules, &firsts)?;
        let left_corners = LeftCorners::from_rules(&lw.rules);
        let id = GrammarId(NEXT_GRAMMAR_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "Built grammar '{}' {} with {} rules",
            self.def.name,
            id,
            lw.rules.len()
        );
        Ok(Grammar {
            id,
            name: self.def.name.clone(),
            rules: lw.rules,
            rule_names: lw.rule_names,
            skip_terminals,
            firsts,
            left_corners,
        })
    }
}

fn validate_pattern(p: &str, rule: &str) -> Result<(), GrammarError> {
    compile_pattern(p).map(|_| ()).map_err(|e| {
        GrammarError::new(
            GrammarErrorKind::InvalidPattern(p.to_owned(), e.to_string()),
            rule,
        )
    })
}

struct Lowering<'a> {
    rules: Vec<Rule>,
    rule_names: IndexMap<String, RIdx>,
    literals: HashMap<String, RIdx>,
    patterns: HashMap<String, RIdx>,
    embedded: &'a HashMap<String, Arc<Grammar>>,
}

impl Lowering<'_> {
    fn push_rule(&mut self, name: &str, rhs: Rhs, skip: bool, leaf: bool, anonymous: bool) -> RIdx {
        let ridx = RIdx::from(self.rules.len());
        self.rules.push(Rule {
            name: name.to_owned(),
            rhs,
            skip,
            leaf,
            anonymous,
        });
        self.rule_names.entry(name.to_owned()).or_insert(ridx);
        ridx
    }

    fn lower_rhs(
        &mut self,
        item: &ItemDef,
        owner: &str,
        counter: &mut usize,
    ) -> Result<Rhs, GrammarError> {
        Ok(match item {
            ItemDef::Literal(_)
            | ItemDef::Pattern(_)
            | ItemDef::NonTerminal(_)
            | ItemDef::Empty => Rhs::Concatenation(vec![self.lower_item(item, owner, counter)?]),
            ItemDef::Concatenation(items) => {
                Rhs::Concatenation(self.lower_sequence(items, owner, counter)?)
            }
            ItemDef::Choice { kind, alternatives } => {
                let mut alts = Vec::with_capacity(alternatives.len());
                for a in alternatives {
                    alts.push(self.lower_sequence(a, owner, counter)?);
                }
                Rhs::Choice {
                    kind: *kind,
                    alternatives: alts,
                }
            }
            ItemDef::Multi { min, max, item } => {
                check_multiplicity(*min, *max, owner)?;
                Rhs::Multi {
                    min: *min,
                    max: *max,
                    item: self.lower_item(item, owner, counter)?,
                }
            }
            ItemDef::SeparatedList {
                min,
                max,
                item,
                separator,
            } => {
                check_multiplicity(*min, *max, owner)?;
                Rhs::SeparatedList {
                    min: *min,
                    max: *max,
                    item: self.lower_item(item, owner, counter)?,
                    separator: self.lower_item(separator, owner, counter)?,
                }
            }
            ItemDef::Embedded { grammar, goal } => {
                let grm = self.embedded.get(grammar).ok_or_else(|| {
                    GrammarError::new(
                        GrammarErrorKind::UnknownEmbeddedGrammar(grammar.clone()),
                        owner,
                    )
                })?;
                let goal_ridx = grm.rule_idx(goal).ok_or_else(|| {
                    GrammarError::new(
                        GrammarErrorKind::UnknownRule(format!("{}::{}", grammar, goal)),
                        owner,
                    )
                })?;
                Rhs::Embedded {
                    grammar: Arc::clone(grm),
                    goal: goal_ridx,
                }
            }
        })
    }

    fn lower_sequence(
        &mut self,
        items: &[ItemDef],
        owner: &str,
        counter: &mut usize,
    ) -> Result<Vec<RIdx>, GrammarError> {
        if items.is_empty() {
            return Ok(vec![EMPTY_RIDX]);
        }
        let mut seq = Vec::with_capacity(items.len());
        for i in items {
            seq.push(self.lower_item(i, owner, counter)?);
        }
        Ok(seq)
    }

    fn lower_item(
        &mut self,
        item: &ItemDef,
        owner: &str,
        counter: &mut usize,
    ) -> Result<RIdx, GrammarError> {
        match item {
            ItemDef::Literal(s) => {
                if s.is_empty() {
                    return Err(GrammarError::new(GrammarErrorKind::EmptyLiteral, owner));
                }
                if let Some(ridx) = self.literals.get(s) {
                    return Ok(*ridx);
                }
                let ridx = self.push_rule(
                    &format!("'{}'", s),
                    Rhs::Terminal(Terminal::Literal(s.clone())),
                    false,
                    false,
                    true,
                );
                self.literals.insert(s.clone(), ridx);
                Ok(ridx)
            }
            ItemDef::Pattern(p) => {
                if let Some(ridx) = self.patterns.get(p) {
                    return Ok(*ridx);
                }
                validate_pattern(p, owner)?;
                let ridx = self.push_rule(
                    &format!("\"{}\"", p),
                    Rhs::Terminal(Terminal::Pattern(p.clone())),
                    false,
                    false,
                    true,
                );
                self.patterns.insert(p.clone(), ridx);
                Ok(ridx)
            }
            ItemDef::NonTerminal(n) => match self.rule_names.get(n) {
                Some(ridx) if !self.rules[usize::from(*ridx)].anonymous => Ok(*ridx),
                _ => Err(GrammarError::new(
                    GrammarErrorKind::UnknownRule(n.clone()),
                    owner,
                )),
            },
            ItemDef::Empty => Ok(EMPTY_RIDX),
            _ => {
                *counter += 1;
                let name = format!("{}§{}", owner, counter);
                let ridx = self.push_rule(&name, Rhs::Empty, false, false, true);
                let rhs = self.lower_rhs(item, owner, counter)?;
                self.rules[usize::from(ridx)].rhs = rhs;
                Ok(ridx)
            }
        }
    }
}

fn check_multiplicity(min: u32, max: Option<u32>, rule: &str) -> Result<(), GrammarError> {
    match max {
        Some(m) if m == 0 || m < min => Err(GrammarError::new(
            GrammarErrorKind::InvalidMultiplicity(min, max),
            rule,
        )),
        _ => Ok(()),
    }
}

/// Reject grammars in which a rule can derive itself while consuming nothing else (`X ⇒+ X`).
/// Such rules would make both the lookahead closure and the packed forest cyclic.
fn check_circularity(rules: &[Rule], firsts: &Firsts) -> Result<(), GrammarError> {
    // unit[r] holds the rules r can derive with every other item of the option matching the
    // empty string.
    let mut unit = vec![Vec::new(); rules.len()];
    for (i, rule) in rules.iter().enumerate() {
        for o in 0..rule.options_len() {
            match rule.option(o) {
                RuleOption::Sequence(items) => {
                    for (j, &it) in items.iter().enumerate() {
                        if items
                            .iter()
                            .enumerate()
                            .all(|(k, &other)| k == j || firsts.is_epsilon_set(other))
                        {
                            unit[i].push(it);
                        }
                    }
                }
                RuleOption::Multi { item, .. } => unit[i].push(item),
                RuleOption::SeparatedList {
                    item, separator, ..
                } => {
                    unit[i].push(item);
                    if firsts.is_epsilon_set(item) {
                        unit[i].push(separator);
                    }
                }
            }
        }
    }

    // Iterative depth first search: 0 = unvisited, 1 = on the stack, 2 = done.
    let mut colour = vec![0u8; rules.len()];
    for root in 0..rules.len() {
        if colour[root] != 0 {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        colour[root] = 1;
        while let Some((r, e)) = stack.pop() {
            if e == unit[r].len() {
                colour[r] = 2;
                continue;
            }
            stack.push((r, e + 1));
            let next = usize::from(unit[r][e]);
            match colour[next] {
                0 => {
                    colour[next] = 1;
                    stack.push((next, 0));
                }
                1 => {
                    let from = stack.iter().position(|&(x, _)| x == next).unwrap_or(0);
                    let mut cycle = stack[from..]
                        .iter()
                        .map(|&(x, _)| rules[x].name.clone())
                        .collect::<Vec<_>>();
                    cycle.push(rules[next].name.clone());
                    return Err(GrammarError::new(
                        GrammarErrorKind::CircularDerivation(cycle),
                        &rules[next].name,
                    ));
                }
                _ => (),
            }
        }
    }
    Ok(())
}
