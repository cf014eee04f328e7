use std::{error::Error, fmt};

/// The various different possible grammar construction errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarErrorKind {
    DuplicateRule,
    UnknownRule(String),
    UnknownEmbeddedGrammar(String),
    InvalidPattern(String, String),
    InvalidMultiplicity(u32, Option<u32>),
    EmptyLiteral,
    SkipNotTerminal,
    LeafNotTerminal,
    CircularDerivation(Vec<String>),
}

/// Any error from building a [`Grammar`](crate::Grammar). The grammar cannot be used at all
/// if one of these is returned: nothing is deferred to parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    /// The rule whose definition caused the error.
    pub rule: Option<String>,
}

impl GrammarError {
    pub(crate) fn new(kind: GrammarErrorKind, rule: &str) -> Self {
        GrammarError {
            kind,
            rule: Some(rule.to_owned()),
        }
    }
}

impl Error for GrammarError {}

impl fmt::Display for GrammarErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            GrammarErrorKind::DuplicateRule => "Rule defined more than once".to_owned(),
            GrammarErrorKind::UnknownRule(n) => format!("Unknown reference to rule '{}'", n),
            GrammarErrorKind::UnknownEmbeddedGrammar(n) => {
                format!("Unknown embedded grammar '{}'", n)
            }
            GrammarErrorKind::InvalidPattern(p, e) => format!("Invalid pattern \"{}\": {}", p, e),
            GrammarErrorKind::InvalidMultiplicity(min, Some(max)) => {
                format!("Invalid multiplicity {}..{}", min, max)
            }
            GrammarErrorKind::InvalidMultiplicity(min, None) => {
                format!("Invalid multiplicity {}..", min)
            }
            GrammarErrorKind::EmptyLiteral => "Literals must not be empty".to_owned(),
            GrammarErrorKind::SkipNotTerminal => {
                "Skip rules must be a single literal or pattern".to_owned()
            }
            GrammarErrorKind::LeafNotTerminal => {
                "Leaf rules must be a single literal or pattern".to_owned()
            }
            GrammarErrorKind::CircularDerivation(cycle) => {
                format!("Rule derives itself: {}", cycle.join(" -> "))
            }
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.rule {
            Some(r) => write!(f, "{} in rule '{}'", self.kind, r),
            None => write!(f, "{}", self.kind),
        }
    }
}
