//! The interfaces through which a parse tree reaches the tools built on top of the parser.

use std::error::Error;

use crate::Sppt;

/// Turns a parse tree into a typed value (an AST, a model, etc.).
///
/// `rule_at` maps a byte position of the sentence to the name of the innermost grammar rule
/// covering it, which analysers use to decide what is at a position without walking the tree
/// themselves.
pub trait SyntaxAnalyser {
    type Output;
    type Error: Error;

    fn analyse<'a>(
        &mut self,
        sppt: &'a Sppt,
        rule_at: &dyn Fn(usize) -> Option<&'a str>,
    ) -> Result<Self::Output, Self::Error>;
}

/// Turns a typed value back into text.
pub trait Formatter<T> {
    fn format(&self, value: &T) -> String;
}

/// Run `analyser` over `sppt`, using [`Sppt::rule_at_position`] as its position to rule map.
pub fn analyse<A: SyntaxAnalyser>(analyser: &mut A, sppt: &Sppt) -> Result<A::Output, A::Error> {
    analyser.analyse(sppt, &|pos| sppt.rule_at_position(pos))
}
