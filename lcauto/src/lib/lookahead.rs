use lcgrammar::{Grammar, RIdx, empty_vob};
use vob::Vob;

/// The terminals which may come next after a transition. A set built with
/// [`LookaheadSet::any`] admits everything; this is what every guard is when lookahead is
/// turned off.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LookaheadSet {
    any: bool,
    terminals: Vob,
}

impl LookaheadSet {
    pub fn any() -> Self {
        LookaheadSet {
            any: true,
            terminals: Vob::new(),
        }
    }

    pub fn from_vob(terminals: Vob) -> Self {
        LookaheadSet {
            any: false,
            terminals,
        }
    }

    pub fn single(grm: &Grammar, t: RIdx) -> Self {
        let mut terminals = empty_vob(grm.rules_len());
        terminals.set(usize::from(t), true);
        LookaheadSet::from_vob(terminals)
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn contains(&self, t: RIdx) -> bool {
        self.any || self.terminals.get(usize::from(t)).unwrap_or(false)
    }

    /// The terminals in this set, in arena order. Empty for [`LookaheadSet::any`].
    pub fn iter(&self) -> impl Iterator<Item = RIdx> + '_ {
        self.terminals.iter_set_bits(..).map(RIdx::from)
    }

    /// Render this set as `{'a', 'b'}`, or `{*}` for [`LookaheadSet::any`].
    pub fn pp(&self, grm: &Grammar) -> String {
        if self.any {
            return "{*}".to_owned();
        }
        format!(
            "{{{}}}",
            self.iter()
                .map(|t| grm.rule_name(t))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod test {
    use super::LookaheadSet;
    use lcgrammar::{
        Grammar,
        def::{GrammarDef, lit, longest},
        empty_vob,
    };

    #[test]
    fn sets() {
        let grm = Grammar::new(
            &GrammarDef::new("T").rule("S", longest(vec![vec![lit("a")], vec![lit("b")]])),
        )
        .unwrap();
        let a = grm.rule_idx("'a'").unwrap();
        let b = grm.rule_idx("'b'").unwrap();
        let mut v = empty_vob(grm.rules_len());
        v.set(usize::from(a), true);
        v.set(usize::from(grm.eot_ridx()), true);
        let la = LookaheadSet::from_vob(v);
        assert!(la.contains(a) && !la.contains(b) && !la.is_any());
        assert_eq!(la.pp(&grm), "{<eot>, 'a'}");
        assert_eq!(LookaheadSet::single(&grm, b).iter().collect::<Vec<_>>(), vec![b]);
        assert!(LookaheadSet::any().contains(b));
        assert_eq!(LookaheadSet::any().pp(&grm), "{*}");
    }
}
