#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![forbid(unsafe_code)]

//! `lcpar` is a generalised left-corner parser. It parses any context-free grammar built with
//! [`lcgrammar`], including ambiguous and left-recursive ones, into a shared packed parse tree
//! ([`Sppt`]) which keeps every derivation that the grammar's choice annotations don't rule
//! out.
//!
//! The parser keeps a graph structured stack of *growing nodes* (partially matched rule
//! applications) and advances them position by position with the transitions of an
//! [`lcauto::StateSet`]: terminals are matched on demand by an [`lcscan::Scanner`], completed
//! applications start (HEIGHT) or extend (GRAFT) the applications waiting for them, and the
//! parse succeeds when the goal is completed (GOAL). Completed applications of the same rule
//! over the same span are packed into a single node.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lcgrammar::{Grammar, def::{GrammarDef, lit, nt, slist}};
//! use lcpar::LcParserBuilder;
//! use lcscan::Sentence;
//!
//! let grm = Grammar::new(
//!     &GrammarDef::new("List")
//!         .rule("S", slist(0, None, nt("a"), lit(",")))
//!         .rule("a", lit("a")),
//! )
//! .unwrap();
//! let parser = LcParserBuilder::new(Arc::new(grm)).build().unwrap();
//! let sppt = parser.parse_for_goal("S", &Sentence::new("a,a")).unwrap();
//! assert_eq!(sppt.to_string(), "S { a : 'a' ',' a : 'a' }");
//! ```
//!
//! Failed parses return a [`ParseError`]. When the sentence isn't in the grammar's language it
//! holds an [`IssueSet`] describing where the parse got furthest and what was expected there,
//! which [`IssueFormatter`] can render against the source.

mod analyser;
pub mod diagnostics;
mod gss;
mod issues;
mod parser;
mod sppt;
mod treedata;
mod walker;

pub use crate::{
    analyser::{Formatter, SyntaxAnalyser, analyse},
    diagnostics::IssueFormatter,
    issues::{IssueKind, IssueSet, ParseIssue},
    parser::{
        AbortError, AbortKind, LcParser, LcParserBuilder, ParseError, ParseOptions, ParseStats,
    },
    sppt::{Alternative, Node, NodeIdx, Sppt},
    walker::SpptWalker,
};
