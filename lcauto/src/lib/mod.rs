#![allow(clippy::new_without_default)]

//! The left-corner automaton of a grammar. A [`StateSet`] is built for one goal rule of a
//! [`lcgrammar::Grammar`] and one [`LookaheadStrategy`]; its states are sets of
//! [`RulePosition`]s within one rule, and its transitions say what a parser should do next:
//!
//!   * `WIDTH`: match a terminal expected by the current state.
//!   * `HEIGHT`: having completed an item, start an application of a rule which begins with it.
//!   * `GRAFT`: having completed an item, advance the application which expected it.
//!   * `GOAL`: the goal has been completed from the start state.
//!
//! `HEIGHT` and `GRAFT` transitions carry a lookahead guard: the terminals which can come next
//! if the transition is taken.
//!
//! States are built on demand, and the first parse against a goal pays for them. Since the
//! same grammar and goal are usually parsed many times, [`state_set_for`] keeps a process-wide
//! cache of state sets keyed by grammar identity, goal and lookahead strategy.

use std::{error::Error, fmt};

mod cache;
mod lookahead;
mod position;
mod stateset;

pub use crate::{
    cache::{clear_cache, state_set_for},
    lookahead::LookaheadSet,
    position::{END, ParserState, RulePosition},
    stateset::{Action, StateSet, Transition},
};

/// StIdx is a wrapper for a 32-bit state index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StIdx(u32);

impl From<u32> for StIdx {
    fn from(v: u32) -> Self {
        StIdx(v)
    }
}

impl From<usize> for StIdx {
    fn from(v: usize) -> Self {
        if v > u32::MAX as usize {
            panic!("Overflow");
        }
        StIdx(v as u32)
    }
}

impl From<StIdx> for usize {
    fn from(st: StIdx) -> Self {
        st.0 as usize
    }
}

impl From<StIdx> for u32 {
    fn from(st: StIdx) -> Self {
        st.0
    }
}

impl fmt::Display for StIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How much lookahead guards a [`StateSet`]'s transitions.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LookaheadStrategy {
    /// Guards admit every terminal.
    None,
    /// Guards hold the terminals which can immediately follow the target state.
    #[default]
    Lc1,
}

/// The various different possible automaton construction errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutomatonErrorKind {
    /// The goal is not a rule of the grammar.
    UnknownGoal(String),
    /// The goal is one of the built-in rules, which cannot be parsed for.
    BuiltinGoal(String),
}

/// Any error from building a [`StateSet`] returns an instance of this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutomatonError {
    pub kind: AutomatonErrorKind,
}

impl Error for AutomatonError {}

impl fmt::Display for AutomatonError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            AutomatonErrorKind::UnknownGoal(g) => write!(f, "Unknown goal rule '{}'", g),
            AutomatonErrorKind::BuiltinGoal(g) => {
                write!(f, "Built-in rule '{}' cannot be a goal", g)
            }
        }
    }
}
