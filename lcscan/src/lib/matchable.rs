use lcgrammar::{Grammar, RIdx, Rhs, Terminal, compile_pattern};
use regex::Regex;

use crate::{ScanError, ScanErrorKind};

/// A compiled terminal matcher.
#[derive(Debug)]
pub enum Matchable {
    Literal(String),
    Pattern(Regex),
    EndOfText,
}

impl Matchable {
    /// How many bytes of `text` starting at `pos` does this match? Literals and patterns never
    /// match zero bytes; `EndOfText` matches zero bytes, but only at the end of `text`. Patterns
    /// only see `text[pos..]`, so `^` always matches at `pos`. Panics if `pos` is not on a `char`
    /// boundary.
    pub fn match_len(&self, text: &str, pos: usize) -> Option<usize> {
        match self {
            Matchable::Literal(s) => {
                if text[pos..].starts_with(s.as_str()) {
                    Some(s.len())
                } else {
                    None
                }
            }
            Matchable::Pattern(re) => match re.find(&text[pos..]) {
                Some(m) if m.end() > 0 => Some(m.end()),
                _ => None,
            },
            Matchable::EndOfText => {
                if pos == text.len() {
                    Some(0)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Matchable::Pattern(_))
    }
}

/// The compiled matchers for every terminal of one grammar, indexed by rule. Built once per
/// grammar and shared by every scan over it.
#[derive(Debug)]
pub struct TerminalTable {
    matchables: Vec<Option<Matchable>>,
}

impl TerminalTable {
    pub fn new(grm: &Grammar) -> Result<Self, ScanError> {
        let mut matchables = Vec::with_capacity(grm.rules_len());
        for ridx in grm.iter_rules() {
            let m = match grm.rule(ridx).rhs() {
                Rhs::Terminal(Terminal::Literal(s)) => Some(Matchable::Literal(s.clone())),
                Rhs::Terminal(Terminal::Pattern(p)) => {
                    Some(Matchable::Pattern(compile_pattern(p).map_err(|e| {
                        ScanError {
                            kind: ScanErrorKind::RegexError(e.to_string()),
                            rule: grm.rule_name(ridx).to_owned(),
                        }
                    })?))
                }
                Rhs::EndOfText => Some(Matchable::EndOfText),
                _ => None,
            };
            matchables.push(m);
        }
        Ok(TerminalTable { matchables })
    }

    /// The matcher for terminal `ridx`, or None if `ridx` is not a scannable terminal.
    pub fn matchable(&self, ridx: RIdx) -> Option<&Matchable> {
        self.matchables
            .get(usize::from(ridx))
            .and_then(|m| m.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::{Matchable, TerminalTable};
    use lcgrammar::{
        Grammar,
        def::{GrammarDef, concat, lit, pat},
    };

    #[test]
    fn matchables() {
        let grm = Grammar::new(
            &GrammarDef::new("T").rule("S", concat(vec![lit("ab"), pat("[0-9]*"), pat("^x")])),
        )
        .unwrap();
        let table = TerminalTable::new(&grm).unwrap();
        let ab = table.matchable(grm.rule_idx("'ab'").unwrap()).unwrap();
        let num = table.matchable(grm.rule_idx("\"[0-9]*\"").unwrap()).unwrap();
        let x = table.matchable(grm.rule_idx("\"^x\"").unwrap()).unwrap();
        let eot = table.matchable(grm.eot_ridx()).unwrap();
        assert!(table.matchable(grm.rule_idx("S").unwrap()).is_none());
        assert!(table.matchable(grm.empty_ridx()).is_none());

        assert_eq!(ab.match_len("xab12", 1), Some(2));
        assert_eq!(ab.match_len("xab12", 0), None);
        assert_eq!(num.match_len("xab12", 3), Some(2));
        // A pattern matching the empty string is not a match.
        assert_eq!(num.match_len("xab12", 0), None);
        assert!(num.is_pattern() && !ab.is_pattern());
        assert_eq!(x.match_len("a\nx", 2), Some(1));
        // Nothing before the scan position is visible to a pattern.
        assert_eq!(x.match_len("ax", 1), Some(1));
        assert_eq!(eot.match_len("ab", 2), Some(0));
        assert_eq!(eot.match_len("ab", 1), None);
        assert!(matches!(eot, Matchable::EndOfText));
    }
}
