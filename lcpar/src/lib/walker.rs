use lcscan::LeafData;

use crate::{
    Sppt,
    sppt::{Node, NodeIdx},
};

/// Receives the events of a depth first walk over an [`Sppt`]. Every method has an empty
/// default, so walkers only implement the events they care about. Each event is handed the
/// tree it occurs in, which inside an embedded region is the embedded tree.
pub trait SpptWalker {
    fn begin_tree(&mut self, _sppt: &Sppt) {}
    fn end_tree(&mut self, _sppt: &Sppt) {}
    /// Start alternative `alternative` (of `alternatives_len`) of branch `node`.
    fn begin_branch(
        &mut self,
        _sppt: &Sppt,
        _node: NodeIdx,
        _alternative: usize,
        _alternatives_len: usize,
    ) {
    }
    fn end_branch(&mut self, _sppt: &Sppt, _node: NodeIdx, _alternative: usize) {}
    fn leaf(&mut self, _sppt: &Sppt, _leaf: &LeafData) {}
    fn skip(&mut self, _sppt: &Sppt, _leaf: &LeafData) {}
    fn begin_embedded(&mut self, _sppt: &Sppt, _node: NodeIdx) {}
    fn end_embedded(&mut self, _sppt: &Sppt, _node: NodeIdx) {}
}

struct Frame {
    node: NodeIdx,
    alternative: usize,
    child: usize,
    cursor: usize,
}

impl Sppt {
    /// Walk this tree depth first, left to right. If `all_alternatives` is false only the first
    /// alternative of each branch is visited; otherwise every alternative is, one after the
    /// other, with the skip leaves inside the branch repeated for each.
    pub fn walk<W: SpptWalker>(&self, walker: &mut W, all_alternatives: bool) {
        walker.begin_tree(self);
        let mut cursor = self.span.start();
        let mut stack = Vec::new();
        self.enter(self.root, walker, all_alternatives, &mut cursor, &mut stack);
        while let Some(top) = stack.last_mut() {
            let children = match self.node(top.node) {
                Node::Branch { alternatives, .. } => &alternatives[top.alternative].children,
                _ => unreachable!(),
            };
            if top.child < children.len() {
                let c = children[top.child];
                top.child += 1;
                self.enter(c, walker, all_alternatives, &mut cursor, &mut stack);
                continue;
            }
            let (node, alternative) = (top.node, top.alternative);
            walker.end_branch(self, node, alternative);
            let alternatives_len = match self.node(node) {
                Node::Branch { alternatives, .. } => alternatives.len(),
                _ => 1,
            };
            if all_alternatives && alternative + 1 < alternatives_len {
                top.alternative += 1;
                top.child = 0;
                cursor = top.cursor;
                walker.begin_branch(self, node, alternative + 1, alternatives_len);
            } else {
                stack.pop();
            }
        }
        self.skips_before(self.span.end(), walker, &mut cursor);
        walker.end_tree(self);
    }

    fn enter<W: SpptWalker>(
        &self,
        idx: NodeIdx,
        walker: &mut W,
        all_alternatives: bool,
        cursor: &mut usize,
        stack: &mut Vec<Frame>,
    ) {
        match self.node(idx) {
            Node::Leaf(l) => {
                self.skips_before(l.start, walker, cursor);
                walker.leaf(self, l);
                *cursor = l.end();
            }
            Node::Embedded { span, tree, .. } => {
                self.skips_before(span.start(), walker, cursor);
                walker.begin_embedded(self, idx);
                tree.walk(walker, all_alternatives);
                walker.end_embedded(self, idx);
                *cursor = span.end();
            }
            Node::Branch { alternatives, .. } => {
                walker.begin_branch(self, idx, 0, alternatives.len());
                stack.push(Frame {
                    node: idx,
                    alternative: 0,
                    child: 0,
                    cursor: *cursor,
                });
            }
        }
    }

    /// Emit the skip leaves between `cursor` and `pos`.
    fn skips_before<W: SpptWalker>(&self, pos: usize, walker: &mut W, cursor: &mut usize) {
        if *cursor >= pos {
            return;
        }
        if let Some(run) = self.skips.get(cursor) {
            for l in run.iter().take_while(|l| l.end() <= pos) {
                walker.skip(self, l);
            }
        }
        *cursor = pos;
    }

    /// The leaves and skip leaves of the first alternative of every node, in sentence order.
    /// Together they cover the tree's span exactly.
    pub fn leaves(&self) -> Vec<LeafData> {
        struct Leaves(Vec<LeafData>);
        impl SpptWalker for Leaves {
            fn leaf(&mut self, _: &Sppt, leaf: &LeafData) {
                self.0.push(*leaf);
            }
            fn skip(&mut self, _: &Sppt, leaf: &LeafData) {
                self.0.push(*leaf);
            }
        }
        let mut w = Leaves(Vec::new());
        self.walk(&mut w, false);
        w.0
    }
}
