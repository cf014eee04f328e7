//! Runs every RON fixture in `tests/fixtures/`: each holds a grammar, a goal, and inputs with
//! the tree or failure they should produce.

use std::{fs, path::Path, sync::Arc};

use glob::glob;
use grammar_testing::{ASTRepr, Fixture, Test};
use lcgrammar::Grammar;
use lcpar::{LcParserBuilder, Node, NodeIdx, ParseError, Sppt};
use lcscan::Sentence;

/// The first alternative of every node of `sppt` below `idx`, as an [`ASTRepr`].
fn to_ast(sppt: &Sppt, idx: NodeIdx) -> ASTRepr {
    let grm = sppt.grammar();
    match sppt.node(idx) {
        Node::Leaf(l) => ASTRepr::Term(
            grm.rule_name(l.rule).to_owned(),
            sppt.text()[l.start..l.end()].to_owned(),
        ),
        Node::Branch {
            rule, alternatives, ..
        } => ASTRepr::Nonterm(
            grm.rule_name(*rule).to_owned(),
            alternatives[0]
                .children()
                .iter()
                .map(|c| to_ast(sppt, *c))
                .collect(),
        ),
        Node::Embedded { rule, tree, .. } => ASTRepr::Nonterm(
            grm.rule_name(*rule).to_owned(),
            vec![to_ast(tree, tree.root())],
        ),
    }
}

fn run_fixture(path: &Path) {
    let src = fs::read_to_string(path).unwrap();
    let fixture = Fixture::from_ron_str(&src)
        .unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    let grm = Arc::new(Grammar::new(&fixture.grammar).unwrap());
    let parser = LcParserBuilder::new(grm).build().unwrap();
    for test in fixture.tests {
        let sentence = Sentence::new(test.input());
        let res = parser.parse_for_goal(&fixture.goal, &sentence);
        match (test, res) {
            (Test::TestSuccess { tree, ast, .. }, Ok(sppt)) => {
                if let Some(tree) = tree {
                    assert_eq!(sppt.to_string(), tree, "{}", path.display());
                }
                if let Some(ast) = ast {
                    assert_eq!(to_ast(&sppt, sppt.root()), ast, "{}", path.display());
                }
            }
            (
                Test::TestError {
                    position, expected, ..
                },
                Err(ParseError::Issues(issues)),
            ) => {
                let issue = issues.iter().next().unwrap();
                if let Some(position) = position {
                    assert_eq!(issue.location().position, position, "{}", path.display());
                }
                if let Some(expected) = expected {
                    assert_eq!(issue.expected(), expected.as_slice(), "{}", path.display());
                }
            }
            (t, Ok(sppt)) => panic!(
                "{}: {:?} parsed as {} but should have failed",
                path.display(),
                t.input(),
                sppt
            ),
            (t, Err(e)) => panic!("{}: {:?} failed: {}", path.display(), t.input(), e),
        }
    }
}

#[test]
fn fixtures() {
    let pattern = format!("{}/tests/fixtures/*.ron", env!("CARGO_MANIFEST_DIR"));
    let mut n = 0;
    for path in glob(&pattern).unwrap() {
        run_fixture(&path.unwrap());
        n += 1;
    }
    assert!(n > 0);
}
