use std::{error::Error, fmt};

use lcscan::InputLocation;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IssueKind {
    /// No terminal of the grammar matches the text at the issue's location.
    UnrecognisedText,
    /// Text was recognised but isn't one of the things that could come next.
    UnexpectedText,
    /// The sentence ended while more was expected.
    UnexpectedEnd,
}

/// A single reason why a sentence could not be parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseIssue {
    pub(crate) kind: IssueKind,
    pub(crate) location: InputLocation,
    pub(crate) trying_for: Vec<String>,
    pub(crate) expected: Vec<String>,
}

impl ParseIssue {
    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    /// Where the parse got furthest before failing.
    pub fn location(&self) -> InputLocation {
        self.location
    }

    /// The rules which were being matched when the parse failed.
    pub fn trying_for(&self) -> &[String] {
        &self.trying_for
    }

    /// The terminals which would have let the parse continue, by name.
    pub fn expected(&self) -> &[String] {
        &self.expected
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self.kind {
            IssueKind::UnrecognisedText => "Unrecognised text",
            IssueKind::UnexpectedText => "Unexpected text",
            IssueKind::UnexpectedEnd => "Unexpected end of input",
        };
        write!(f, "{} at line {} column {}", s, self.location.line, self.location.column)?;
        match self.expected.len() {
            0 => Ok(()),
            1 => write!(f, ": expected {}", self.expected[0]),
            _ => write!(f, ": expected one of {}", self.expected.join(", ")),
        }
    }
}

/// The issues found by a failed parse, ordered by position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IssueSet {
    issues: Vec<ParseIssue>,
}

impl IssueSet {
    pub fn new() -> Self {
        IssueSet { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: ParseIssue) {
        let i = self
            .issues
            .partition_point(|x| x.location.position <= issue.location.position);
        self.issues.insert(i, issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseIssue> {
        self.issues.iter()
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a ParseIssue;
    type IntoIter = std::slice::Iter<'a, ParseIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl Error for IssueSet {}

impl fmt::Display for IssueSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{IssueKind, IssueSet, ParseIssue};
    use lcscan::Sentence;

    fn issue(s: &Sentence, pos: usize, expected: &[&str]) -> ParseIssue {
        ParseIssue {
            kind: IssueKind::UnexpectedText,
            location: s.location(pos, 1),
            trying_for: vec!["S".to_owned()],
            expected: expected.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn ordered_issues() {
        let s = Sentence::new("ab\ncd");
        let mut is = IssueSet::new();
        is.push(issue(&s, 4, &["'x'"]));
        is.push(issue(&s, 1, &["'y'", "'z'"]));
        assert_eq!(
            is.iter().map(|i| i.location().position).collect::<Vec<_>>(),
            vec![1, 4]
        );
        assert_eq!(
            is.to_string(),
            "Unexpected text at line 1 column 2: expected one of 'y', 'z'\n\
             Unexpected text at line 2 column 2: expected 'x'"
        );
    }
}
