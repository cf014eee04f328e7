use std::{cmp::Reverse, collections::BinaryHeap};

use fnv::{FnvHashMap, FnvHashSet};
use lcauto::StIdx;
use lcgrammar::RIdx;

/// The index of a growing node in a [`Gss`].
pub(crate) type GnIdx = usize;

/// A growing node: an application of `rule` which started at `start`, has matched `nchildren`
/// items so far, the last of which ended at `next`, and is now in automaton state `state`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct GrowingNode {
    pub(crate) state: StIdx,
    pub(crate) rule: RIdx,
    pub(crate) start: usize,
    pub(crate) next: usize,
    pub(crate) nchildren: usize,
}

/// The graph structured stack of one parse. Growing nodes are hash-consed on
/// `(state, start, next, nchildren)` and processed in order of `next`, so every node ending at
/// position `p` is handled before any node ending after `p`.
///
/// Nodes don't point at their callers directly. Instead, whenever a node starts an application
/// of a rule `R` at position `s` (a HEIGHT transition), it registers itself as a *context* of
/// `(R, s)`; every completion of `R` from `s` is then announced to every context of `(R, s)`,
/// whichever of them registered first.
pub(crate) struct Gss {
    nodes: Vec<GrowingNode>,
    index: FnvHashMap<(StIdx, usize, usize, usize), GnIdx>,
    contexts: FnvHashMap<(RIdx, usize), Vec<GnIdx>>,
    context_set: FnvHashSet<(RIdx, usize, GnIdx)>,
    ends: FnvHashMap<(RIdx, usize), Vec<usize>>,
    queue: BinaryHeap<Reverse<(usize, GnIdx)>>,
}

impl Gss {
    pub(crate) fn new() -> Self {
        Gss {
            nodes: Vec::new(),
            index: FnvHashMap::default(),
            contexts: FnvHashMap::default(),
            context_set: FnvHashSet::default(),
            ends: FnvHashMap::default(),
            queue: BinaryHeap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, gn: GnIdx) -> &GrowingNode {
        &self.nodes[gn]
    }

    /// Return the node for `node`'s key, creating (and queueing) it if it doesn't exist yet. The
    /// boolean is true if the node is new.
    pub(crate) fn add_node(&mut self, node: GrowingNode) -> (GnIdx, bool) {
        let key = (node.state, node.start, node.next, node.nchildren);
        if let Some(gn) = self.index.get(&key) {
            return (*gn, false);
        }
        let gn = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(key, gn);
        self.queue.push(Reverse((node.next, gn)));
        (gn, true)
    }

    /// Pop the queued node with the smallest `next`, oldest first.
    pub(crate) fn pop(&mut self) -> Option<GnIdx> {
        self.queue.pop().map(|Reverse((_, gn))| gn)
    }

    /// Register `gn` as waiting for completions of `rule` from `start`. Returns the ends of the
    /// completions recorded so far if `gn` was not already registered, since the caller must
    /// replay them for `gn`.
    pub(crate) fn add_context(
        &mut self,
        rule: RIdx,
        start: usize,
        gn: GnIdx,
    ) -> Option<Vec<usize>> {
        if !self.context_set.insert((rule, start, gn)) {
            return None;
        }
        self.contexts.entry((rule, start)).or_default().push(gn);
        Some(self.ends.get(&(rule, start)).cloned().unwrap_or_default())
    }

    /// Record that `rule` has been completed from `start` to `end` for the first time, returning
    /// the contexts waiting for it.
    pub(crate) fn add_end(&mut self, rule: RIdx, start: usize, end: usize) -> Vec<GnIdx> {
        self.ends.entry((rule, start)).or_default().push(end);
        self.contexts
            .get(&(rule, start))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::{Gss, GrowingNode};
    use lcauto::StIdx;
    use lcgrammar::RIdx;

    fn gn(state: usize, start: usize, next: usize, nchildren: usize) -> GrowingNode {
        GrowingNode {
            state: StIdx::from(state),
            rule: RIdx(4),
            start,
            next,
            nchildren,
        }
    }

    #[test]
    fn nodes_are_shared_and_ordered() {
        let mut gss = Gss::new();
        let (a, new) = gss.add_node(gn(1, 0, 3, 1));
        assert!(new);
        let (b, _) = gss.add_node(gn(2, 0, 1, 1));
        let (c, _) = gss.add_node(gn(3, 1, 1, 1));
        assert_eq!(gss.add_node(gn(1, 0, 3, 1)), (a, false));
        assert_eq!(gss.len(), 3);
        assert_eq!(gss.pop(), Some(b));
        assert_eq!(gss.pop(), Some(c));
        assert_eq!(gss.pop(), Some(a));
        assert_eq!(gss.pop(), None);
    }

    #[test]
    fn contexts_replay_ends() {
        let mut gss = Gss::new();
        let r = RIdx(5);
        assert_eq!(gss.add_context(r, 0, 7), Some(vec![]));
        assert_eq!(gss.add_context(r, 0, 7), None);
        assert_eq!(gss.add_end(r, 0, 2), vec![7]);
        assert_eq!(gss.add_context(r, 0, 8), Some(vec![2]));
        assert_eq!(gss.add_end(r, 0, 4), vec![7, 8]);
        assert_eq!(gss.add_end(r, 1, 4), Vec::<usize>::new());
    }
}
