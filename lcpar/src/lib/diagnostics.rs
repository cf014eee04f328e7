use std::path::Path;

use lcgrammar::Span;
use lcscan::Sentence;
use unicode_width::UnicodeWidthStr;

use crate::{IssueSet, ParseIssue};

/// Formats [`ParseIssue`]s against the source they were found in, in the style of compiler
/// diagnostics: a `msg at path:line:col` header, then the offending source line with the issue's
/// text underlined.
pub struct IssueFormatter<'a> {
    sentence: Sentence<'a>,
    path: &'a Path,
}

/// Implements a `pushln` convenience function to `String`
trait PushLine {
    /// Appends a given string slice and a newline to the end of this `String`.
    fn pushln<S: AsRef<str>>(&mut self, s: S);
}

impl PushLine for String {
    fn pushln<S: AsRef<str>>(&mut self, s: S) {
        self.push_str(s.as_ref());
        self.push('\n');
    }
}

impl<'a> IssueFormatter<'a> {
    pub fn new(src: &'a str, path: &'a Path) -> Self {
        IssueFormatter {
            sentence: Sentence::new(src),
            path,
        }
    }

    /// Returns "msg at path/file.foo:5:6".
    pub fn file_location_msg(&self, msg: &str, pos: usize) -> String {
        let (line, col) = self.sentence.line_col(pos).unwrap_or((0, 0));
        format!("{} at {}:{line}:{col}", msg, self.path.display())
    }

    /// Print the source line containing the start of `span` and underline the part of the span
    /// on that line with `underline_c`, followed by `msg`.
    pub fn underline_span_with_text(&self, span: Span, msg: &str, underline_c: char) -> String {
        let src = self.sentence.text();
        let line = self.sentence.line_of(span.start()).unwrap_or(1);
        let line_start = self.sentence.line_start(line).unwrap_or(0);
        let source_line = self
            .sentence
            .span_lines_str(Span::new(span.start(), span.start()));
        let line_end = line_start + source_line.len();
        let mut out = String::new();
        out.pushln(format!("{}| {}", line, source_line));
        let line_num_digits = line.to_string().len();
        out.push_str(&" ".repeat(
            UnicodeWidthStr::width(&src[line_start..span.start()]) + line_num_digits + "| ".len(),
        ));
        let underline_end = span.end().min(line_end).max(span.start());
        out.push_str(
            &underline_c
                .to_string()
                .repeat(UnicodeWidthStr::width(&src[span.start()..underline_end]).max(1)),
        );
        out.push_str(&format!(" {msg}"));
        out
    }

    pub fn format_issue(&self, issue: &ParseIssue) -> String {
        let loc = issue.location();
        let mut out = String::new();
        out.pushln(self.file_location_msg(&issue.to_string(), loc.position));
        let msg = match issue.trying_for() {
            [] => String::new(),
            rules => format!("while parsing {}", rules.join(", ")),
        };
        out.push_str(&self.underline_span_with_text(
            Span::new(loc.position, loc.position + loc.length),
            &msg,
            '^',
        ));
        out
    }

    pub fn format_issues(&self, issues: &IssueSet) -> String {
        issues
            .iter()
            .map(|i| self.format_issue(i))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
