use std::fmt;

use lcgrammar::Span;

/// Where something is in a [`Sentence`]: a byte `position`, the 1-based `line` and `column`
/// (in characters) of that position, and a byte `length`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct InputLocation {
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl fmt::Display for InputLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The text being parsed, plus the byte offset of the start of every line in it. Lines are
/// separated by `\n`; a `\r` immediately before a `\n` belongs to the line it ends.
#[derive(Debug)]
pub struct Sentence<'input> {
    text: &'input str,
    /// `line_starts[i]` is the byte offset of the start of line `i + 1`. Always non-empty.
    line_starts: Vec<usize>,
}

impl<'input> Sentence<'input> {
    pub fn new(text: &'input str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i + 1),
        );
        Sentence { text, line_starts }
    }

    pub fn text(&self) -> &'input str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// How many lines does the sentence have? An empty sentence, or one ending in a newline,
    /// still has a (possibly empty) last line.
    pub fn lines_len(&self) -> usize {
        self.line_starts.len()
    }

    /// The byte offset of the start of 1-based line `line`.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            None
        } else {
            self.line_starts.get(line - 1).cloned()
        }
    }

    /// The 1-based line containing byte `pos`. Returns None if `pos` is beyond the sentence.
    pub fn line_of(&self, pos: usize) -> Option<usize> {
        if pos > self.text.len() {
            return None;
        }
        Some(self.line_starts.partition_point(|&s| s <= pos))
    }

    /// Convert byte offset `pos` to 1-based line and column numbers, counting columns in
    /// characters and `\r\n` as a single character. Returns None if `pos` is beyond the sentence.
    pub fn line_col(&self, pos: usize) -> Option<(usize, usize)> {
        let line = self.line_of(pos)?;
        let line_byte = self.line_starts[line - 1];
        let mut column = 1;
        let mut skip_char = None;
        for (c_off, c) in self.text[line_byte..].char_indices() {
            if c_off + line_byte >= pos {
                break;
            }
            if Some(c) != skip_char {
                column += 1;
            }
            skip_char = if c == '\r' { Some('\n') } else { None };
        }
        if skip_char.is_some() && self.text[pos..].starts_with('\n') {
            column -= 1;
        }
        Some((line, column))
    }

    /// Return the location of the `length` bytes at `position`.
    ///
    /// # Panics
    ///
    /// If `position` exceeds the sentence length.
    pub fn location(&self, position: usize, length: usize) -> InputLocation {
        match self.line_col(position) {
            Some((line, column)) => InputLocation {
                position,
                line,
                column,
                length,
            },
            None => panic!(
                "Position {} exceeds known input length {}",
                position,
                self.text.len()
            ),
        }
    }

    /// Return the text covered by `span`.
    pub fn span_str(&self, span: Span) -> &'input str {
        if span.end() > self.text.len() {
            panic!(
                "Span {:?} exceeds known input length {}",
                span,
                self.text.len()
            );
        }
        &self.text[span.start()..span.end()]
    }

    /// Return the lines containing `span`, without the trailing newline of the last one.
    pub fn span_lines_str(&self, span: Span) -> &'input str {
        let st = self.line_of(span.start()).map_or(0, |l| self.line_starts[l - 1]);
        let en = match self.line_of(span.end()) {
            Some(l) if l < self.line_starts.len() => self.line_starts[l] - 1,
            _ => self.text.len(),
        };
        let en = if en > st && self.text[..en].ends_with('\r') {
            en - 1
        } else {
            en
        };
        &self.text[st..en]
    }
}

#[cfg(test)]
mod test {
    use super::Sentence;
    use lcgrammar::Span;

    fn line_col_test_helper(src: &str, tests: &[(usize, usize)]) {
        let s = Sentence::new(src);
        let result = src
            .char_indices()
            .map(|(offset, _)| s.line_col(offset).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(result, tests)
    }

    #[test]
    fn line_col_various() {
        line_col_test_helper("abc", &[(1, 1), (1, 2), (1, 3)]);
        line_col_test_helper("a\nb", &[(1, 1), (1, 2), (2, 1)]);
        line_col_test_helper("a\r\nb", &[(1, 1), (1, 2), (1, 2), (2, 1)]);
        line_col_test_helper("\r\n\n", &[(1, 1), (1, 1), (2, 1)]);
        line_col_test_helper("♠♥♦♣", &[(1, 1), (1, 2), (1, 3), (1, 4)]);
        line_col_test_helper("♠♥\n♦♣", &[(1, 1), (1, 2), (1, 3), (2, 1), (2, 2)]);
        #[rustfmt::skip]
        line_col_test_helper("1\n2\n3\n4\n5\n6\n", &[
            (1, 1), (1, 2), (2, 1), (2, 2),
            (3, 1), (3, 2), (4, 1), (4, 2),
            (5, 1), (5, 2), (6, 1), (6, 2),
        ]);
        line_col_test_helper("", &[]);
    }

    #[test]
    fn end_of_sentence() {
        let s = Sentence::new("ab\ncd");
        assert_eq!(s.line_col(5), Some((2, 3)));
        assert_eq!(s.line_col(6), None);
        let s = Sentence::new("ab\n");
        assert_eq!(s.lines_len(), 2);
        assert_eq!(s.line_col(3), Some((2, 1)));
        let s = Sentence::new("");
        assert_eq!(s.line_col(0), Some((1, 1)));
        let loc = s.location(0, 0);
        assert_eq!((loc.line, loc.column, loc.length), (1, 1, 0));
    }

    #[test]
    fn span_lines() {
        let s = Sentence::new("abc\ndef\r\nghi");
        assert_eq!(s.span_str(Span::new(4, 7)), "def");
        assert_eq!(s.span_lines_str(Span::new(5, 5)), "def");
        assert_eq!(s.span_lines_str(Span::new(1, 5)), "abc\ndef");
        assert_eq!(s.span_lines_str(Span::new(10, 12)), "ghi");
        assert_eq!(s.line_start(3), Some(9));
        assert_eq!(s.line_of(9), Some(3));
        assert_eq!(s.location(10, 2).to_string(), "3:2");
    }
}
