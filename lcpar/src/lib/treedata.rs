use std::{cmp::Ordering, sync::Arc};

use fnv::FnvHashMap;
use lcgrammar::{ChoiceKind, Grammar, RIdx, Span};
use lcscan::{LeafData, Scanner};

use crate::{
    AbortError, AbortKind,
    gss::{GnIdx, Gss},
    sppt::{Alternative, Node, NodeIdx, Sppt},
};

/// What a growing node's child is.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum ChildRef {
    Leaf(usize),
    Complete(usize),
    Embedded(usize),
}

/// A completed rule application: every derivation found for `rule` over `start..end`, each a
/// growing node which completed it and the option it completed.
pub(crate) struct CompleteNode {
    pub(crate) rule: RIdx,
    pub(crate) start: usize,
    pub(crate) end: usize,
    derivations: Vec<(GnIdx, usize)>,
}

/// The tree data of one parse: the children of every growing node, and the completed nodes,
/// leaves and embedded trees they refer to.
///
/// A growing node's children are stored as links `(previous node, last child)`: the first
/// child has no previous node, and every later child extends a node with one fewer children. A
/// node reached in more than one way has more than one link, so its children form a graph
/// rather than a list until the forest is finalised.
pub(crate) struct TreeData {
    links: Vec<Vec<(Option<GnIdx>, ChildRef)>>,
    leaves: Vec<LeafData>,
    leaf_index: FnvHashMap<(RIdx, usize), usize>,
    embedded: Vec<(RIdx, Sppt)>,
    completes: Vec<CompleteNode>,
    complete_index: FnvHashMap<(RIdx, usize, usize), usize>,
    root: Option<usize>,
}

impl TreeData {
    pub(crate) fn new() -> Self {
        TreeData {
            links: Vec::new(),
            leaves: Vec::new(),
            leaf_index: FnvHashMap::default(),
            embedded: Vec::new(),
            completes: Vec::new(),
            complete_index: FnvHashMap::default(),
            root: None,
        }
    }

    pub(crate) fn leaves_len(&self) -> usize {
        self.leaves.len()
    }

    pub(crate) fn completes_len(&self) -> usize {
        self.completes.len()
    }

    pub(crate) fn complete_node(&self, cidx: usize) -> &CompleteNode {
        &self.completes[cidx]
    }

    /// Return the leaf for `leaf`, sharing it with any identical leaf already recorded.
    pub(crate) fn leaf(&mut self, leaf: LeafData) -> ChildRef {
        let next = self.leaves.len();
        let lidx = *self.leaf_index.entry((leaf.rule, leaf.start)).or_insert(next);
        if lidx == next {
            self.leaves.push(leaf);
        }
        ChildRef::Leaf(lidx)
    }

    pub(crate) fn embedded(&mut self, rule: RIdx, tree: Sppt) -> ChildRef {
        self.embedded.push((rule, tree));
        ChildRef::Embedded(self.embedded.len() - 1)
    }

    /// The span `child` covers.
    pub(crate) fn child_span(&self, child: ChildRef) -> Span {
        match child {
            ChildRef::Leaf(i) => self.leaves[i].span(),
            ChildRef::Complete(i) => Span::new(self.completes[i].start, self.completes[i].end),
            ChildRef::Embedded(i) => self.embedded[i].1.span(),
        }
    }

    /// Can `gn` have been reached by an empty last child?
    pub(crate) fn ends_with_empty(&self, gn: GnIdx) -> bool {
        self.links
            .get(gn)
            .is_some_and(|l| l.iter().any(|(_, c)| self.child_span(*c).is_empty()))
    }

    fn ensure_links(&mut self, gn: GnIdx) {
        if self.links.len() <= gn {
            self.links.resize_with(gn + 1, Vec::new);
        }
    }

    /// Give the new application `gn` its first child.
    pub(crate) fn set_first_child(&mut self, gn: GnIdx, child: ChildRef) {
        self.add_link(gn, None, child);
    }

    /// Record that `gn` is `prev` extended by `child`.
    pub(crate) fn set_next_child(&mut self, prev: GnIdx, gn: GnIdx, child: ChildRef) {
        self.add_link(gn, Some(prev), child);
    }

    fn add_link(&mut self, gn: GnIdx, prev: Option<GnIdx>, child: ChildRef) {
        self.ensure_links(gn);
        if !self.links[gn].contains(&(prev, child)) {
            self.links[gn].push((prev, child));
        }
    }

    /// Record that `gn` completed `option` of `rule` over `start..end`. If that rule and span
    /// has been completed before, the derivation is packed into the existing node. Returns the
    /// completed node's index and whether it is new.
    pub(crate) fn complete(
        &mut self,
        gn: GnIdx,
        rule: RIdx,
        option: usize,
        start: usize,
        end: usize,
    ) -> (usize, bool) {
        let next = self.completes.len();
        let cidx = *self
            .complete_index
            .entry((rule, start, end))
            .or_insert(next);
        if cidx == next {
            self.completes.push(CompleteNode {
                rule,
                start,
                end,
                derivations: vec![(gn, option)],
            });
            return (cidx, true);
        }
        let derivs = &mut self.completes[cidx].derivations;
        if !derivs.contains(&(gn, option)) {
            derivs.push((gn, option));
        }
        (cidx, false)
    }

    /// Make `cidx` the root of the forest. Roots covering more input beat roots covering less,
    /// and among those the root starting earliest wins.
    pub(crate) fn set_root_to(&mut self, cidx: usize) {
        let better = match self.root {
            None => true,
            Some(r) => {
                let (old, new) = (&self.completes[r], &self.completes[cidx]);
                new.end > old.end || (new.end == old.end && new.start < old.start)
            }
        };
        if better {
            self.root = Some(cidx);
        }
    }

    pub(crate) fn root(&self) -> Option<usize> {
        self.root
    }

    /// The completed node for `rule` over `start..end`, if there is one.
    pub(crate) fn complete_idx(&self, rule: RIdx, start: usize, end: usize) -> Option<usize> {
        self.complete_index.get(&(rule, start, end)).cloned()
    }

    /// Turn the tree data into an [`Sppt`] rooted at `root` and spanning `span`, choosing among
    /// the derivations of every completed node reachable from the root.
    pub(crate) fn into_sppt(
        mut self,
        grm: &Arc<Grammar>,
        gss: &Gss,
        scanner: &mut Scanner,
        text: Arc<str>,
        span: Span,
        max_alternatives: usize,
    ) -> Result<Sppt, AbortError> {
        let root = match self.root {
            Some(r) => r,
            None => panic!("No root to build a tree from"),
        };
        let mut resolver = Resolver {
            grm,
            tree: &self,
            gss,
            max_alternatives,
            chosen: FnvHashMap::default(),
            resolved: vec![None; self.completes.len()],
            ties: Vec::new(),
        };
        resolver.resolve_from(root)?;
        let Resolver { resolved, ties, .. } = resolver;

        // Number every reachable child, then build the nodes in that order.
        let mut order = vec![ChildRef::Complete(root)];
        let mut numbering = FnvHashMap::default();
        numbering.insert(ChildRef::Complete(root), NodeIdx::from(0));
        let mut i = 0;
        while i < order.len() {
            if let ChildRef::Complete(c) = order[i] {
                for (_, children) in resolved[c].iter().flatten() {
                    for ch in children {
                        if !numbering.contains_key(ch) {
                            numbering.insert(*ch, NodeIdx::from(order.len()));
                            order.push(*ch);
                        }
                    }
                }
            }
            i += 1;
        }

        let mut embedded = std::mem::take(&mut self.embedded)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        let mut nodes = Vec::with_capacity(order.len());
        let mut ends = vec![span.start()];
        for ch in &order {
            let node = match *ch {
                ChildRef::Leaf(l) => {
                    ends.push(self.leaves[l].end());
                    Node::Leaf(self.leaves[l])
                }
                ChildRef::Embedded(e) => match embedded[e].take() {
                    Some((rule, tree)) => {
                        ends.push(tree.span().end());
                        Node::Embedded {
                            rule,
                            span: tree.span(),
                            tree: Box::new(tree),
                        }
                    }
                    None => unreachable!(),
                },
                ChildRef::Complete(c) => Node::Branch {
                    rule: self.completes[c].rule,
                    span: if c == root {
                        span
                    } else {
                        Span::new(self.completes[c].start, self.completes[c].end)
                    },
                    alternatives: resolved[c]
                        .iter()
                        .flatten()
                        .map(|(option, children)| Alternative {
                            option: *option,
                            children: children.iter().map(|ch| numbering[ch]).collect(),
                        })
                        .collect(),
                },
            };
            nodes.push(node);
        }

        let mut skips = FnvHashMap::default();
        for e in ends {
            if !skips.contains_key(&e) {
                let run = scanner.skip_leaves(e).to_vec();
                if !run.is_empty() {
                    skips.insert(e, run);
                }
            }
        }
        let ambiguities = ties
            .into_iter()
            .filter_map(|c| numbering.get(&ChildRef::Complete(c)).cloned())
            .collect();
        Ok(Sppt {
            grm: Arc::clone(grm),
            text,
            nodes,
            root: NodeIdx::from(0),
            span,
            skips,
            ambiguities,
        })
    }
}

/// Chooses which derivations of each completed node make it into the forest.
struct Resolver<'a> {
    grm: &'a Grammar,
    tree: &'a TreeData,
    gss: &'a Gss,
    max_alternatives: usize,
    /// For every growing node visited, the indices of the links kept.
    chosen: FnvHashMap<GnIdx, Vec<usize>>,
    resolved: Vec<Option<Vec<(usize, Vec<ChildRef>)>>>,
    ties: Vec<usize>,
}

impl<'a> Resolver<'a> {
    /// Resolve every completed node reachable from `root`, children before parents.
    fn resolve_from(&mut self, root: usize) -> Result<(), AbortError> {
        // 0 = unvisited, 1 = children pending, 2 = resolved.
        let mut colour = vec![0u8; self.tree.completes.len()];
        let mut stack = vec![(root, false)];
        while let Some((cidx, exit)) = stack.pop() {
            if exit {
                self.resolve(cidx)?;
                colour[cidx] = 2;
                continue;
            }
            if colour[cidx] != 0 {
                continue;
            }
            colour[cidx] = 1;
            stack.push((cidx, true));
            for gn in self.chain(cidx) {
                for (_, child) in self.links(gn) {
                    if let ChildRef::Complete(c) = child {
                        if colour[*c] == 0 {
                            stack.push((*c, false));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn links(&self, gn: GnIdx) -> &'a [(Option<GnIdx>, ChildRef)] {
        let tree: &'a TreeData = self.tree;
        tree.links.get(gn).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Every growing node on some path to a derivation of `cidx`, sorted by number of children.
    fn chain(&self, cidx: usize) -> Vec<GnIdx> {
        let mut seen = self
            .tree
            .complete_node(cidx)
            .derivations
            .iter()
            .map(|(gn, _)| *gn)
            .collect::<Vec<_>>();
        seen.sort();
        seen.dedup();
        let mut todo = seen.clone();
        while let Some(gn) = todo.pop() {
            for (prev, _) in self.links(gn) {
                if let Some(p) = prev {
                    if let Err(i) = seen.binary_search(p) {
                        seen.insert(i, *p);
                        todo.push(*p);
                    }
                }
            }
        }
        seen.sort_by_key(|gn| (self.gss.node(*gn).nchildren, *gn));
        seen
    }

    fn resolve(&mut self, cidx: usize) -> Result<(), AbortError> {
        let node = self.tree.complete_node(cidx);
        let ambiguous = self.grm.rule(node.rule).choice_kind() == Some(ChoiceKind::Ambiguous);
        for gn in self.chain(cidx) {
            if !self.chosen.contains_key(&gn) {
                let chosen = if ambiguous {
                    (0..self.links(gn).len()).collect()
                } else {
                    self.best_links(gn)
                };
                self.chosen.insert(gn, chosen);
            }
        }

        let mut derivs = node.derivations.clone();
        derivs.sort_by_key(|&(gn, o)| (o, gn));
        if !ambiguous {
            if let Some(&(_, min)) = derivs.first() {
                derivs.retain(|&(_, o)| o == min);
            }
        }
        let mut alts: Vec<(usize, Vec<ChildRef>)> = Vec::new();
        for (gn, o) in derivs {
            for p in self.paths(gn)? {
                if !alts.iter().any(|(ao, ap)| *ao == o && *ap == p) {
                    alts.push((o, p));
                }
            }
        }
        if !ambiguous && alts.len() > 1 {
            let mut best: Vec<(usize, Vec<ChildRef>)> = Vec::new();
            for alt in alts {
                match best.first().map(|b| self.compare_lists(&alt.1, &b.1)) {
                    None | Some(Ordering::Equal) => best.push(alt),
                    Some(Ordering::Greater) => best = vec![alt],
                    Some(Ordering::Less) => (),
                }
            }
            alts = best;
            if alts.len() > 1 {
                log::debug!(
                    "{} equally good derivations of '{}' at {}..{}",
                    alts.len(),
                    self.grm.rule_name(node.rule),
                    node.start,
                    node.end
                );
                self.ties.push(cidx);
            }
        }
        if alts.len() > self.max_alternatives {
            return Err(AbortError {
                kind: AbortKind::AmbiguityLimit,
                limit: self.max_alternatives,
                position: node.start,
            });
        }
        self.resolved[cidx] = Some(alts);
        Ok(())
    }

    /// The links of `gn` whose child lists are best: earlier children covering more input
    /// win. Every link of a node whose previous nodes have already been resolved.
    fn best_links(&self, gn: GnIdx) -> Vec<usize> {
        let links = self.links(gn);
        if links.len() <= 1 {
            return (0..links.len()).collect();
        }
        let candidates = links
            .iter()
            .map(|(prev, child)| {
                let mut l = prev.map(|p| self.first_path(p)).unwrap_or_default();
                l.push(*child);
                l
            })
            .collect::<Vec<_>>();
        let mut best = vec![0];
        for i in 1..candidates.len() {
            match self.compare_lists(&candidates[i], &candidates[best[0]]) {
                Ordering::Greater => best = vec![i],
                Ordering::Equal => best.push(i),
                Ordering::Less => (),
            }
        }
        best
    }

    /// The children of the first chosen path ending at `gn`.
    fn first_path(&self, mut gn: GnIdx) -> Vec<ChildRef> {
        let mut out = Vec::new();
        loop {
            let li = self.chosen.get(&gn).and_then(|c| c.first()).cloned().unwrap_or(0);
            match self.links(gn).get(li) {
                Some((prev, child)) => {
                    out.push(*child);
                    match prev {
                        Some(p) => gn = *p,
                        None => break,
                    }
                }
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Every child list along chosen links ending at `gn`.
    fn paths(&self, gn: GnIdx) -> Result<Vec<Vec<ChildRef>>, AbortError> {
        let mut out = Vec::new();
        let mut stack = vec![(gn, Vec::new())];
        while let Some((g, suffix)) = stack.pop() {
            let links = self.links(g);
            let chosen = self.chosen.get(&g).cloned().unwrap_or_default();
            for &li in chosen.iter().rev() {
                let (prev, child) = links[li];
                let mut s = suffix.clone();
                s.push(child);
                match prev {
                    Some(p) => stack.push((p, s)),
                    None => {
                        s.reverse();
                        out.push(s);
                        if out.len() > self.max_alternatives {
                            return Err(AbortError {
                                kind: AbortKind::AmbiguityLimit,
                                limit: self.max_alternatives,
                                position: self.gss.node(gn).start,
                            });
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Compare two child lists of the same node, left to right. `Greater` means `a` is better.
    /// If one list is a prefix of the other, the shorter is better.
    fn compare_lists(&self, a: &[ChildRef], b: &[ChildRef]) -> Ordering {
        for (x, y) in a.iter().zip(b) {
            match self.compare_children(*x, *y) {
                Ordering::Equal => (),
                o => return o,
            }
        }
        b.len().cmp(&a.len())
    }

    /// Compare two children starting at the same position: the longer is better, except that
    /// of two completions of the same priority choice, the one using the earlier alternative is.
    fn compare_children(&self, a: ChildRef, b: ChildRef) -> Ordering {
        if let (ChildRef::Complete(x), ChildRef::Complete(y)) = (a, b) {
            let (rx, ry) = (self.tree.completes[x].rule, self.tree.completes[y].rule);
            if rx == ry && self.grm.rule(rx).choice_kind() == Some(ChoiceKind::Priority) {
                if let (Some(ox), Some(oy)) = (self.chosen_option(x), self.chosen_option(y)) {
                    if ox != oy {
                        return oy.cmp(&ox);
                    }
                }
            }
        }
        self.tree
            .child_span(a)
            .len()
            .cmp(&self.tree.child_span(b).len())
    }

    fn chosen_option(&self, cidx: usize) -> Option<usize> {
        self.resolved[cidx]
            .as_ref()
            .and_then(|alts| alts.first())
            .map(|(o, _)| *o)
    }
}
