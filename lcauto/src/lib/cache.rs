use std::{
    collections::hash_map::Entry,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use fnv::FnvHashMap;
use lcgrammar::{Grammar, GrammarId, RIdx};

use crate::{AutomatonError, LookaheadStrategy, StateSet};

type CacheKey = (GrammarId, RIdx, LookaheadStrategy);

fn cache() -> &'static RwLock<FnvHashMap<CacheKey, Arc<StateSet>>> {
    static CACHE: OnceLock<RwLock<FnvHashMap<CacheKey, Arc<StateSet>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(FnvHashMap::default()))
}

/// Return the (lazily built) state set for `goal` in `grm`, creating it if this is the first
/// time it has been asked for. Every caller asking for the same grammar, goal and strategy gets
/// the same `StateSet`.
pub fn state_set_for(
    grm: &Arc<Grammar>,
    goal: RIdx,
    strategy: LookaheadStrategy,
) -> Result<Arc<StateSet>, AutomatonError> {
    let key = (grm.id(), goal, strategy);
    if let Some(ss) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        log::debug!("State set cache hit for {} in grammar {}", goal, grm.id());
        return Ok(Arc::clone(ss));
    }
    let mut c = cache().write().unwrap_or_else(PoisonError::into_inner);
    match c.entry(key) {
        Entry::Occupied(e) => Ok(Arc::clone(e.get())),
        Entry::Vacant(e) => {
            log::debug!("State set cache miss for {} in grammar {}", goal, grm.id());
            let ss = Arc::new(StateSet::new(Arc::clone(grm), goal, strategy)?);
            e.insert(Arc::clone(&ss));
            Ok(ss)
        }
    }
}

/// Drop every cached state set. State sets already handed out remain usable.
pub fn clear_cache() {
    cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{clear_cache, state_set_for};
    use crate::LookaheadStrategy;
    use lcgrammar::{
        Grammar,
        def::{GrammarDef, lit},
    };

    #[test]
    fn shared_state_sets() {
        let grm = Arc::new(Grammar::new(&GrammarDef::new("T").rule("S", lit("a"))).unwrap());
        let s = grm.rule_idx("S").unwrap();
        let ss1 = state_set_for(&grm, s, LookaheadStrategy::Lc1).unwrap();
        let ss2 = state_set_for(&grm, s, LookaheadStrategy::Lc1).unwrap();
        assert!(Arc::ptr_eq(&ss1, &ss2));
        let ss3 = state_set_for(&grm, s, LookaheadStrategy::None).unwrap();
        assert!(!Arc::ptr_eq(&ss1, &ss3));

        // A grammar with the same definition is a different grammar.
        let grm2 = Arc::new(Grammar::new(&GrammarDef::new("T").rule("S", lit("a"))).unwrap());
        let ss4 = state_set_for(&grm2, s, LookaheadStrategy::Lc1).unwrap();
        assert!(!Arc::ptr_eq(&ss1, &ss4));

        clear_cache();
        let ss5 = state_set_for(&grm, s, LookaheadStrategy::Lc1).unwrap();
        assert!(!Arc::ptr_eq(&ss1, &ss5));
        assert!(ss1.matches(&ss5));

        assert!(state_set_for(&grm, grm.eot_ridx(), LookaheadStrategy::Lc1).is_err());
    }
}
