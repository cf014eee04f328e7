//! RON test fixtures for grammars: a grammar definition, the goal to parse for, and a list of
//! inputs with the tree or the failure each should produce.

use lcgrammar::GrammarDef;
use ron::{Options, extensions::Extensions, ser::PrettyConfig};
use serde::{Deserialize, Serialize};

fn pretty_config() -> PrettyConfig {
    PrettyConfig::new()
        .escape_strings(false)
        .extensions(Extensions::IMPLICIT_SOME)
}

/// A parse tree written out by hand: a leaf is `(rule, text)`, a branch `(rule, [children])`.
/// Only the first alternative of each node is described.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum ASTRepr {
    Term(String, String),
    Nonterm(String, Vec<ASTRepr>),
}

impl ASTRepr {
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, pretty_config())
    }

    pub fn from_ron_str<S: AsRef<str>>(s: S) -> Result<Self, ron::Error> {
        let opts = Options::default();
        Ok(opts.from_str(s.as_ref())?)
    }
}

#[derive(Deserialize, Serialize, PartialEq, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub enum Test {
    TestError {
        input: String,
        /// The byte position the parse should fail at.
        position: Option<usize>,
        /// The names of the terminals expected at the failure, in sorted order.
        expected: Option<Vec<String>>,
    },
    TestSuccess {
        input: String,
        /// The compact, single line form of the tree.
        tree: Option<String>,
        ast: Option<ASTRepr>,
    },
}

impl Test {
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, pretty_config())
    }

    pub fn from_ron_str<S: AsRef<str>>(s: S) -> Result<Self, ron::Error> {
        let opts = Options::default();
        Ok(opts.from_str(s.as_ref())?)
    }

    pub fn input(&self) -> &str {
        match self {
            Test::TestError { input, .. } | Test::TestSuccess { input, .. } => input,
        }
    }

    pub fn should_pass(&self) -> bool {
        matches!(self, Test::TestSuccess { .. })
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(transparent)]
pub struct Tests(Vec<Test>);

impl Tests {
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, pretty_config())
    }

    pub fn from_ron_str<S: AsRef<str>>(s: S) -> Result<Self, ron::Error> {
        let opts = Options::default();
        Ok(opts.from_str(s.as_ref())?)
    }
}

impl std::ops::Deref for Tests {
    type Target = Vec<Test>;

    fn deref(&self) -> &Vec<Test> {
        &self.0
    }
}

impl IntoIterator for Tests {
    type Item = Test;
    type IntoIter = std::vec::IntoIter<Test>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A grammar together with the tests to run against one of its rules.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub grammar: GrammarDef,
    pub goal: String,
    pub tests: Tests,
}

impl Fixture {
    pub fn from_ron_str<S: AsRef<str>>(s: S) -> Result<Self, ron::Error> {
        let opts = Options::default();
        Ok(opts.from_str(s.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ASTRepr, Fixture, Test, Tests};
    use lcgrammar::def::ItemDef;

    #[test]
    fn grmtest_input_only() {
        let input = r#"
            #![enable(implicit_some)]
            TestSuccess(input: "a")
        "#;
        let x: Test = ron::from_str(input).unwrap();
        assert_eq!(
            x,
            Test::TestSuccess {
                input: "a".to_string(),
                tree: None,
                ast: None,
            }
        );
    }

    #[test]
    fn grmtest_input_ast() {
        let input = r#"
        #![enable(implicit_some)]
        TestSuccess(input: "a", ast: ("S", [("'a'", "a")]))
        "#;
        let x = Test::from_ron_str(input).unwrap();
        assert_eq!(
            x,
            Test::TestSuccess {
                input: "a".to_string(),
                tree: None,
                ast: Some(ASTRepr::Nonterm(
                    "S".to_string(),
                    vec![ASTRepr::Term("'a'".to_string(), "a".to_string())]
                ))
            }
        );
        assert_eq!(
            x.to_ron_string().unwrap(),
            r#"#![enable(implicit_some)]
TestSuccess(
    input: "a",
    tree: None,
    ast: ("S", [
        ("'a'", "a"),
    ]),
)"#
        );
    }

    #[test]
    fn grmtest_many_fails() {
        let input = r#"
        #![enable(implicit_some)]
        [
            TestError(input: "abc"),
            TestError(input: "abc", position: 2, expected: ["'x'"]),
        ]
        "#;
        let xs = Tests::from_ron_str(input).unwrap();
        for x in &*xs {
            assert!(!x.should_pass());
            assert_eq!(x.input(), "abc");
        }
        assert_eq!(
            xs[1],
            Test::TestError {
                input: "abc".to_string(),
                position: Some(2),
                expected: Some(vec!["'x'".to_string()]),
            }
        );
    }

    #[test]
    fn fixture() {
        let input = r#"
        #![enable(implicit_some)]
        (
            grammar: (
                name: "Lists",
                rules: [
                    (name: "S", rhs: SeparatedList(min: 0, max: None,
                        item: NonTerminal("a"), separator: Literal(","))),
                    (name: "a", rhs: Literal("a")),
                ],
            ),
            goal: "S",
            tests: [
                TestSuccess(input: "a,a", tree: "S { a : 'a' ',' a : 'a' }"),
                TestError(input: "a,", position: 2),
            ],
        )
        "#;
        let f = Fixture::from_ron_str(input).unwrap();
        assert_eq!(f.goal, "S");
        assert_eq!(f.grammar.rules.len(), 2);
        assert_eq!(f.grammar.rules[1].rhs, ItemDef::Literal("a".to_owned()));
        assert_eq!(f.tests.len(), 2);
    }
}
