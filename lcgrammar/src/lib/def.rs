//! The grammar description handed to [`GrammarBuilder`](crate::GrammarBuilder). Whatever reads
//! the concrete grammar-definition language produces one of these; nested items are allowed
//! anywhere and are lifted into anonymous rules when the rule arena is built.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ChoiceKind;

/// A complete grammar description: a name and an ordered list of rules. Declaration order is
/// significant: it is the scanner's final tie-break and the order rules appear in the arena.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrammarDef {
    pub name: String,
    pub rules: Vec<RuleDef>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleDef {
    pub name: String,
    /// Skip rules (whitespace, comments) are matched between any two leaves and kept in the
    /// leaf stream, but never appear in a rule's children.
    #[cfg_attr(feature = "serde", serde(default))]
    pub skip: bool,
    /// A leaf rule whose body is a single literal or pattern is itself a terminal, tagged with
    /// the rule's name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub leaf: bool,
    pub rhs: ItemDef,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ItemDef {
    Literal(String),
    Pattern(String),
    NonTerminal(String),
    Empty,
    Choice {
        kind: ChoiceKind,
        alternatives: Vec<Vec<ItemDef>>,
    },
    Concatenation(Vec<ItemDef>),
    Multi {
        min: u32,
        max: Option<u32>,
        item: Box<ItemDef>,
    },
    SeparatedList {
        min: u32,
        max: Option<u32>,
        item: Box<ItemDef>,
        separator: Box<ItemDef>,
    },
    /// The goal rule `goal` of the grammar registered under `grammar` with
    /// [`GrammarBuilder::embed`](crate::GrammarBuilder::embed).
    Embedded { grammar: String, goal: String },
}

impl GrammarDef {
    pub fn new(name: &str) -> Self {
        GrammarDef {
            name: name.to_owned(),
            rules: Vec::new(),
        }
    }

    /// Append an ordinary rule `name = rhs`.
    pub fn rule(mut self, name: &str, rhs: ItemDef) -> Self {
        self.rules.push(RuleDef::new(name, rhs));
        self
    }

    /// Append a skip rule.
    pub fn skip(mut self, name: &str, rhs: ItemDef) -> Self {
        self.rules.push(RuleDef::new(name, rhs).with_skip());
        self
    }

    /// Append a leaf rule.
    pub fn leaf(mut self, name: &str, rhs: ItemDef) -> Self {
        self.rules.push(RuleDef::new(name, rhs).with_leaf());
        self
    }

    pub fn push(&mut self, rule: RuleDef) {
        self.rules.push(rule);
    }
}

impl RuleDef {
    pub fn new(name: &str, rhs: ItemDef) -> Self {
        RuleDef {
            name: name.to_owned(),
            skip: false,
            leaf: false,
            rhs,
        }
    }

    pub fn with_skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn with_leaf(mut self) -> Self {
        self.leaf = true;
        self
    }
}

pub fn lit(s: &str) -> ItemDef {
    ItemDef::Literal(s.to_owned())
}

pub fn pat(s: &str) -> ItemDef {
    ItemDef::Pattern(s.to_owned())
}

pub fn nt(s: &str) -> ItemDef {
    ItemDef::NonTerminal(s.to_owned())
}

pub fn empty() -> ItemDef {
    ItemDef::Empty
}

pub fn concat(items: Vec<ItemDef>) -> ItemDef {
    ItemDef::Concatenation(items)
}

pub fn choice(kind: ChoiceKind, alternatives: Vec<Vec<ItemDef>>) -> ItemDef {
    ItemDef::Choice { kind, alternatives }
}

/// `a | b`: longest match first, declaration order on ties.
pub fn longest(alternatives: Vec<Vec<ItemDef>>) -> ItemDef {
    choice(ChoiceKind::Longest, alternatives)
}

/// `a < b`: declaration order first.
pub fn priority(alternatives: Vec<Vec<ItemDef>>) -> ItemDef {
    choice(ChoiceKind::Priority, alternatives)
}

/// `a || b`: keep every derivation.
pub fn ambiguous(alternatives: Vec<Vec<ItemDef>>) -> ItemDef {
    choice(ChoiceKind::Ambiguous, alternatives)
}

pub fn multi(min: u32, max: Option<u32>, item: ItemDef) -> ItemDef {
    ItemDef::Multi {
        min,
        max,
        item: Box::new(item),
    }
}

pub fn opt(item: ItemDef) -> ItemDef {
    multi(0, Some(1), item)
}

pub fn star(item: ItemDef) -> ItemDef {
    multi(0, None, item)
}

pub fn plus(item: ItemDef) -> ItemDef {
    multi(1, None, item)
}

pub fn slist(min: u32, max: Option<u32>, item: ItemDef, separator: ItemDef) -> ItemDef {
    ItemDef::SeparatedList {
        min,
        max,
        item: Box::new(item),
        separator: Box::new(separator),
    }
}

pub fn embedded(grammar: &str, goal: &str) -> ItemDef {
    ItemDef::Embedded {
        grammar: grammar.to_owned(),
        goal: goal.to_owned(),
    }
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::*;

    #[test]
    fn ron_definition() {
        let src = r#"
            (
                name: "Lists",
                rules: [
                    (name: "S", rhs: SeparatedList(min: 0, max: None,
                        item: NonTerminal("a"), separator: Literal(","))),
                    (name: "a", rhs: Literal("a")),
                    (name: "WS", skip: true, rhs: Pattern("\\s+")),
                ],
            )
        "#;
        let def: GrammarDef = ron::from_str(src).unwrap();
        assert_eq!(
            def,
            GrammarDef::new("Lists")
                .rule("S", slist(0, None, nt("a"), lit(",")))
                .rule("a", lit("a"))
                .skip("WS", pat("\\s+"))
        );
    }
}
