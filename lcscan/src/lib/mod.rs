//! `lcscan` is the on-demand scanner of a left-corner parser. There is no separate lexing
//! phase: the parser asks the [`Scanner`] which of the terminals it currently expects match at
//! a position, and the scanner answers from a per-grammar [`TerminalTable`] of compiled
//! matchers. Skip terminals (whitespace, comments) are matched between leaves the same way.
//!
//! A [`Sentence`] is the text being parsed together with a line index, from which it answers
//! basic queries about [`lcgrammar::Span`]s (extracting substrings, calculating line and column
//! numbers).

#![allow(clippy::new_without_default)]

use std::{error::Error, fmt};

mod matchable;
mod scanner;
mod sentence;

pub use crate::{
    matchable::{Matchable, TerminalTable},
    scanner::{LeafData, Scanner},
    sentence::{InputLocation, Sentence},
};

/// The various different possible scanner construction errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanErrorKind {
    RegexError(String),
}

/// Any error from compiling a grammar's terminals returns an instance of this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    /// The terminal whose matcher could not be built.
    pub rule: String,
}

impl Error for ScanError {}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ScanErrorKind::RegexError(e) => {
                write!(f, "Invalid regular expression in '{}': {}", self.rule, e)
            }
        }
    }
}
