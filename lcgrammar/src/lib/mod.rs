#![allow(clippy::new_without_default)]
#![allow(clippy::upper_case_acronyms)]

//! The rule model of a grammar-driven left-corner parser, and the analyses over it which the
//! automaton needs (first sets, follow sets, left corners).
//!
//! A grammar is an arena of *rules*, each identified by an [`RIdx`]. Terminals and non-terminals
//! share the arena:
//!
//!   * A *terminal* is a literal string or a regular expression pattern, or one of the built-in
//!     rules `<empty>`, `<eot>` and `<undefined>`.
//!   * A *non-terminal* has one or more *options*: a choice has one per alternative, a
//!     concatenation has exactly one, and a list has one for "one or more items" plus, if it
//!     may be empty, one matching only `<empty>`.
//!   * An *embedded* rule is the goal of another grammar, recognised by a sub-parse.
//!
//! For example, in the following grammar:
//!
//!   S = A 'b' | 'c' ;
//!   A = ['a' / ',']* ;
//!
//! the following statements are true:
//!
//!   * `S` is a longest-match choice with two options: `[A, 'b']` and `['c']`.
//!   * `A` is a separated list with two options: the list itself, and `[<empty>]`.
//!   * There are four terminals: `'a'`, `','`, `'b'` and `'c'`. Each is a rule named by its
//!     quoted text, shared by every place the same literal is used.
//!
//! lcgrammar makes the following guarantees about grammars:
//!
//!   * Rules are numbered from `0` to `rules_len() - 1` (inclusive).
//!   * Every `RIdx` stored in a rule refers to a rule of the same grammar.
//!   * No rule can derive itself without consuming input (building such a grammar fails).
//!
//! Grammars are built with [`Grammar::new`] or, when embedding other grammars,
//! [`GrammarBuilder`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vob::Vob;

pub mod def;
mod error;
mod firsts;
mod follows;
pub mod grammar;
mod idxnewtype;
mod leftcorner;
pub mod span;

pub use crate::{
    def::{GrammarDef, ItemDef, RuleDef},
    error::{GrammarError, GrammarErrorKind},
    firsts::Firsts,
    follows::Follows,
    grammar::{
        Grammar, GrammarBuilder, GrammarId, Rhs, Rule, RuleOption, Terminal, compile_pattern,
    },
    idxnewtype::RIdx,
    leftcorner::LeftCorners,
    span::Span,
};

/// How a choice between alternatives is resolved when more than one of them matches.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChoiceKind {
    /// `|`: the derivation covering the most input wins, declaration order on ties.
    Longest,
    /// `<`: the earliest declared alternative wins.
    Priority,
    /// `||`: every derivation is kept.
    Ambiguous,
}

/// Return a bit vector of `len` unset bits.
pub fn empty_vob(len: usize) -> Vob {
    std::iter::repeat_n(false, len).collect()
}
