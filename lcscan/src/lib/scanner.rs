use std::cmp::Ordering;

use fnv::FnvHashMap;
use lcgrammar::{Grammar, RIdx, Span};

use crate::{Sentence, TerminalTable};

/// What the scanner produces for one matched terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LeafData {
    /// The terminal (or `<undefined>`) this leaf was matched as.
    pub rule: RIdx,
    pub is_pattern: bool,
    pub start: usize,
    pub len: usize,
}

impl LeafData {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end())
    }
}

/// An on-demand scanner over one sentence: rather than tokenising the whole sentence up front,
/// it answers "which of these terminals matches here?" for whatever terminals the parser
/// currently expects. Every answer is memoised, since many parser states ask the same question
/// at the same position.
pub struct Scanner<'a, 'input> {
    grm: &'a Grammar,
    table: &'a TerminalTable,
    sentence: &'a Sentence<'input>,
    matches: FnvHashMap<(RIdx, usize), Option<usize>>,
    skips: FnvHashMap<usize, (usize, Vec<LeafData>)>,
}

impl<'a, 'input> Scanner<'a, 'input> {
    pub fn new(grm: &'a Grammar, table: &'a TerminalTable, sentence: &'a Sentence<'input>) -> Self {
        Scanner {
            grm,
            table,
            sentence,
            matches: FnvHashMap::default(),
            skips: FnvHashMap::default(),
        }
    }

    pub fn sentence(&self) -> &'a Sentence<'input> {
        self.sentence
    }

    /// How many bytes does terminal `t` match at `pos`? `<empty>` always matches zero bytes and
    /// `<eot>` matches zero bytes at the end of the sentence; other terminals never match zero
    /// bytes.
    pub fn match_len(&mut self, t: RIdx, pos: usize) -> Option<usize> {
        if t == self.grm.empty_ridx() {
            return Some(0);
        }
        if let Some(m) = self.matches.get(&(t, pos)) {
            return *m;
        }
        let m = self
            .table
            .matchable(t)
            .and_then(|m| m.match_len(self.sentence.text(), pos));
        self.matches.insert((t, pos), m);
        m
    }

    /// Find the best match at `pos` among `candidates`. A literal beats a pattern regardless of
    /// length; otherwise the longer match wins, and then the terminal declared first. Zero
    /// length matches (`<empty>`, `<eot>`) are never returned.
    pub fn find_best<I>(&mut self, pos: usize, candidates: I) -> Option<LeafData>
    where
        I: IntoIterator<Item = RIdx>,
    {
        let mut best: Option<LeafData> = None;
        for t in candidates {
            let len = match self.match_len(t, pos) {
                Some(len) if len > 0 => len,
                _ => continue,
            };
            let is_pattern = self.grm.rule(t).is_pattern();
            let cand = LeafData {
                rule: t,
                is_pattern,
                start: pos,
                len,
            };
            best = match best {
                Some(b) if rank(&b, &cand) != Ordering::Less => Some(b),
                _ => Some(cand),
            };
        }
        best
    }

    /// Match as many skip terminals as possible starting at `pos`, returning the position after
    /// the last of them.
    pub fn skip_end(&mut self, pos: usize) -> usize {
        self.skip_run(pos).0
    }

    /// The skip leaves matched starting at `pos`.
    pub fn skip_leaves(&mut self, pos: usize) -> &[LeafData] {
        &self.skip_run(pos).1
    }

    fn skip_run(&mut self, pos: usize) -> &(usize, Vec<LeafData>) {
        if !self.skips.contains_key(&pos) {
            let grm = self.grm;
            let skip_terminals = grm.skip_terminals();
            let mut leaves = Vec::new();
            let mut p = pos;
            while p < self.sentence.len() {
                match self.find_best(p, skip_terminals.iter().cloned()) {
                    Some(l) => {
                        p = l.end();
                        leaves.push(l);
                    }
                    None => break,
                }
            }
            self.skips.insert(pos, (p, leaves));
        }
        &self.skips[&pos]
    }

    /// Tokenise the whole sentence against every terminal of the grammar, turning each run of
    /// text that no terminal matches into a single `<undefined>` leaf. Used for inputs which
    /// fail to parse, where there is no tree to take leaves from.
    pub fn scan_all(&mut self) -> Vec<LeafData> {
        let terminals = self.grm.iter_terminals().collect::<Vec<_>>();
        let mut leaves = Vec::new();
        let mut undefined_start = None;
        let mut p = 0;
        let text = self.sentence.text();
        while p < text.len() {
            match self.find_best(p, terminals.iter().cloned()) {
                Some(l) => {
                    if let Some(s) = undefined_start.take() {
                        leaves.push(self.undefined(s, p));
                    }
                    p = l.end();
                    leaves.push(l);
                }
                None => {
                    undefined_start.get_or_insert(p);
                    p += text[p..].chars().next().map_or(1, |c| c.len_utf8());
                }
            }
        }
        if let Some(s) = undefined_start {
            leaves.push(self.undefined(s, p));
        }
        log::trace!("Scanned {} leaves from {} bytes", leaves.len(), text.len());
        leaves
    }

    fn undefined(&self, start: usize, end: usize) -> LeafData {
        LeafData {
            rule: self.grm.undefined_ridx(),
            is_pattern: false,
            start,
            len: end - start,
        }
    }
}

/// Order two matches at the same position: `Greater` means `a` is the better match.
fn rank(a: &LeafData, b: &LeafData) -> Ordering {
    (!a.is_pattern)
        .cmp(&!b.is_pattern)
        .then(a.len.cmp(&b.len))
        .then(b.rule.cmp(&a.rule))
}

#[cfg(test)]
mod test {
    use super::{LeafData, Scanner};
    use crate::{Sentence, TerminalTable};
    use lcgrammar::{
        Grammar,
        def::{GrammarDef, concat, lit, nt, pat},
    };

    fn grammar() -> Grammar {
        Grammar::new(
            &GrammarDef::new("T")
                .rule("S", concat(vec![nt("ID"), lit("if"), lit("iff"), nt("NUM")]))
                .leaf("ID", pat("[a-z]+"))
                .leaf("NUM", pat("[0-9]+"))
                .leaf("INT", pat("[0-9]+"))
                .skip("WS", pat("[ \\t\\n]+"))
                .skip("COMMENT", pat("#[^\\n]*")),
        )
        .unwrap()
    }

    #[test]
    fn best_match() {
        let grm = grammar();
        let table = TerminalTable::new(&grm).unwrap();
        let s = Sentence::new("iffy 123");
        let mut sc = Scanner::new(&grm, &table, &s);
        let id = grm.rule_idx("ID").unwrap();
        let kw_if = grm.rule_idx("'if'").unwrap();
        let kw_iff = grm.rule_idx("'iff'").unwrap();
        let num = grm.rule_idx("NUM").unwrap();
        let int = grm.rule_idx("INT").unwrap();

        // Literals beat patterns regardless of length.
        let l = sc.find_best(0, vec![id, kw_if]).unwrap();
        assert_eq!((l.rule, l.len, l.is_pattern), (kw_if, 2, false));
        // Among literals the longer wins.
        assert_eq!(sc.find_best(0, vec![kw_if, kw_iff]).unwrap().rule, kw_iff);
        assert_eq!(sc.find_best(0, vec![id]).unwrap().len, 4);
        // Equal patterns of equal length: the earlier declared wins, whatever the order asked.
        assert_eq!(sc.find_best(5, vec![int, num]).unwrap().rule, num);
        assert_eq!(sc.find_best(5, vec![num, int]).unwrap().rule, num);
        assert!(sc.find_best(4, vec![id, num]).is_none());
        assert!(sc.find_best(5, vec![grm.empty_ridx(), grm.eot_ridx()]).is_none());
        assert_eq!(sc.match_len(grm.eot_ridx(), 8), Some(0));
        assert_eq!(sc.match_len(grm.empty_ridx(), 3), Some(0));
    }

    #[test]
    fn skip_runs() {
        let grm = grammar();
        let table = TerminalTable::new(&grm).unwrap();
        let s = Sentence::new("a  # note\n  b");
        let mut sc = Scanner::new(&grm, &table, &s);
        assert_eq!(sc.skip_end(0), 0);
        assert_eq!(sc.skip_end(1), 12);
        let ws = grm.rule_idx("WS").unwrap();
        let comment = grm.rule_idx("COMMENT").unwrap();
        assert_eq!(
            sc.skip_leaves(1)
                .iter()
                .map(|l| (l.rule, l.start, l.len))
                .collect::<Vec<_>>(),
            vec![(ws, 1, 2), (comment, 3, 6), (ws, 9, 3)]
        );
        assert_eq!(sc.skip_end(13), 13);
    }

    #[test]
    fn scan_all_with_undefined() {
        let grm = grammar();
        let table = TerminalTable::new(&grm).unwrap();
        let s = Sentence::new("ab ?!12 ♠");
        let mut sc = Scanner::new(&grm, &table, &s);
        let leaves = sc.scan_all();
        let undef = grm.undefined_ridx();
        assert_eq!(
            leaves
                .iter()
                .map(|l| (grm.rule_name(l.rule), l.start, l.len))
                .collect::<Vec<_>>(),
            vec![
                ("ID", 0, 2),
                ("WS", 2, 1),
                ("<undefined>", 3, 2),
                ("NUM", 5, 2),
                ("WS", 7, 1),
                ("<undefined>", 8, 3),
            ]
        );
        assert_eq!(leaves[2].rule, undef);
        // Leaves cover the sentence exactly.
        let text = leaves
            .iter()
            .map(|l: &LeafData| s.span_str(l.span()))
            .collect::<String>();
        assert_eq!(text, "ab ?!12 ♠");
    }
}
