use std::{fmt, sync::Arc};

use fnv::FnvHashMap;
use lcgrammar::{Grammar, RIdx, Span};
use lcscan::{LeafData, Sentence};

/// The index of a node in an [`Sppt`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeIdx(u32);

impl From<usize> for NodeIdx {
    fn from(v: usize) -> Self {
        if v > u32::MAX as usize {
            panic!("Overflow");
        }
        NodeIdx(v as u32)
    }
}

impl From<NodeIdx> for usize {
    fn from(n: NodeIdx) -> Self {
        n.0 as usize
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One derivation of a branch: the option of the branch's rule it used and its children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alternative {
    pub(crate) option: usize,
    pub(crate) children: Vec<NodeIdx>,
}

impl Alternative {
    pub fn option(&self) -> usize {
        self.option
    }

    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }
}

#[derive(Debug)]
pub enum Node {
    /// A completed rule application. Every distinct derivation kept for the same rule and span
    /// is one of `alternatives`: nodes are shared, never duplicated.
    Branch {
        rule: RIdx,
        span: Span,
        alternatives: Vec<Alternative>,
    },
    Leaf(LeafData),
    /// A region parsed by a sub-parse against another grammar. `rule` is the embedding rule of
    /// this tree's grammar; `tree` is rooted at the embedded grammar's goal.
    Embedded {
        rule: RIdx,
        span: Span,
        tree: Box<Sppt>,
    },
}

impl Node {
    pub fn rule(&self) -> RIdx {
        match self {
            Node::Branch { rule, .. } | Node::Embedded { rule, .. } => *rule,
            Node::Leaf(l) => l.rule,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Branch { span, .. } | Node::Embedded { span, .. } => *span,
            Node::Leaf(l) => l.span(),
        }
    }
}

/// A shared packed parse tree: the (possibly ambiguous) result of a successful parse.
///
/// The tree is an immutable arena of [`Node`]s. Skip leaves are not children of any node, but
/// are kept alongside and interleaved with the ordinary leaves by [`Sppt::walk`], so that a walk
/// visits every byte the root covers exactly once.
#[derive(Debug)]
pub struct Sppt {
    pub(crate) grm: Arc<Grammar>,
    pub(crate) text: Arc<str>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeIdx,
    pub(crate) span: Span,
    /// The skip leaves matched from each position a leaf ended at (or the tree started at).
    pub(crate) skips: FnvHashMap<usize, Vec<LeafData>>,
    pub(crate) ambiguities: Vec<NodeIdx>,
}

impl Sppt {
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grm
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// The span of the whole tree: from the position parsing started at to the end of the
    /// sentence (or, for prefix parses, to the end of the last leaf).
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    /// Return the node `idx`. Panics if it doesn't exist.
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[usize::from(idx)]
    }

    /// Return the leaf data of `idx` if it is a leaf.
    pub fn leaf(&self, idx: NodeIdx) -> Option<&LeafData> {
        match self.node(idx) {
            Node::Leaf(l) => Some(l),
            _ => None,
        }
    }

    /// The full text of the sentence this tree was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text covered by node `idx`.
    pub fn matched_text(&self, idx: NodeIdx) -> &str {
        let span = if idx == self.root {
            self.span
        } else {
            self.node(idx).span()
        };
        &self.text[span.start()..span.end()]
    }

    /// The branches of rules which are not ambiguous but for which more than one derivation
    /// was equally good. Their alternatives are all kept.
    pub fn ambiguities(&self) -> &[NodeIdx] {
        &self.ambiguities
    }

    /// Every leaf (including skip leaves and the leaves of embedded trees) of the first
    /// alternative of every node, split at line boundaries and grouped by line: element `i`
    /// holds the leaves on line `i + 1`. Zero length leaves are omitted.
    pub fn tokens_by_line(&self) -> Vec<Vec<LeafData>> {
        let sentence = Sentence::new(&self.text);
        let mut lines = vec![Vec::new(); sentence.lines_len()];
        for l in self.leaves() {
            let mut start = l.start;
            while start < l.end() {
                let line = match sentence.line_of(start) {
                    Some(line) => line,
                    None => break,
                };
                let line_end = sentence.line_start(line + 1).unwrap_or(self.text.len());
                let end = l.end().min(line_end);
                lines[line - 1].push(LeafData {
                    start,
                    len: end - start,
                    ..l
                });
                start = end;
            }
        }
        lines
    }

    /// The name of the innermost rule (following first alternatives, and descending into
    /// embedded trees) whose node covers byte `pos`. Skip text belongs to the innermost node
    /// around it.
    pub fn rule_at_position(&self, pos: usize) -> Option<&str> {
        if !self.span.contains(pos) {
            return None;
        }
        let mut tree = self;
        let mut idx = self.root;
        loop {
            match tree.node(idx) {
                Node::Leaf(l) => return Some(tree.grm.rule_name(l.rule)),
                Node::Embedded {
                    rule, tree: inner, ..
                } => {
                    if inner.span.contains(pos) {
                        tree = inner.as_ref();
                        idx = tree.root;
                    } else {
                        return Some(tree.grm.rule_name(*rule));
                    }
                }
                Node::Branch {
                    rule, alternatives, ..
                } => {
                    match alternatives[0]
                        .children
                        .iter()
                        .find(|c| tree.node(**c).span().contains(pos))
                    {
                        Some(c) => idx = *c,
                        None => return Some(tree.grm.rule_name(*rule)),
                    }
                }
            }
        }
    }

    fn leaf_str(&self, l: &LeafData) -> &str {
        &self.text[l.start..l.end()]
    }

    /// Return a pretty-printed version of this tree, one node per line, with every alternative
    /// of ambiguous nodes.
    pub fn pp(&self) -> String {
        let mut s = String::new();
        self.pp_into(&mut s, 0);
        s
    }

    fn pp_into(&self, s: &mut String, base: usize) {
        let mut st = vec![(base, PpItem::Node(self.root))]; // Stack of (indent level, item) pairs
        while let Some((indent, e)) = st.pop() {
            for _ in 0..indent {
                s.push(' ');
            }
            let idx = match e {
                PpItem::Alternative(k, n) => {
                    s.push_str(&format!("|alternative {} of {}\n", k + 1, n));
                    continue;
                }
                PpItem::Node(idx) => idx,
            };
            match self.node(idx) {
                Node::Leaf(l) => {
                    let text = self.leaf_str(l);
                    if text.is_empty() {
                        s.push_str(&format!("{}\n", self.grm.rule_name(l.rule)));
                    } else {
                        s.push_str(&format!("{} {}\n", self.grm.rule_name(l.rule), text));
                    }
                }
                Node::Embedded { rule, tree, .. } => {
                    s.push_str(&format!("{}\n", self.grm.rule_name(*rule)));
                    tree.pp_into(s, indent + 1);
                }
                Node::Branch {
                    rule, alternatives, ..
                } => {
                    s.push_str(&format!("{}\n", self.grm.rule_name(*rule)));
                    if alternatives.len() == 1 {
                        for x in alternatives[0].children.iter().rev() {
                            st.push((indent + 1, PpItem::Node(*x)));
                        }
                    } else {
                        for (k, alt) in alternatives.iter().enumerate().rev() {
                            for x in alt.children.iter().rev() {
                                st.push((indent + 2, PpItem::Node(*x)));
                            }
                            st.push((indent + 1, PpItem::Alternative(k, alternatives.len())));
                        }
                    }
                }
            }
        }
    }
}

enum PpItem {
    Node(NodeIdx),
    Alternative(usize, usize),
}

enum DisplayItem {
    Node(NodeIdx),
    Text(&'static str),
}

/// The compact, single line form of the first alternative of every node: a branch with one
/// child is `name : child`, a branch with several is `name { child child }`, an anonymous
/// literal leaf is its quoted literal and any other leaf is `name : 'text'`.
impl fmt::Display for Sppt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut st = vec![DisplayItem::Node(self.root)];
        while let Some(e) = st.pop() {
            let idx = match e {
                DisplayItem::Text(s) => {
                    f.write_str(s)?;
                    continue;
                }
                DisplayItem::Node(idx) => idx,
            };
            match self.node(idx) {
                Node::Leaf(l) => {
                    let rule = self.grm.rule(l.rule);
                    if l.rule == self.grm.empty_ridx() || (rule.is_anonymous() && rule.is_literal())
                    {
                        f.write_str(rule.name())?;
                    } else {
                        write!(f, "{} : '{}'", rule.name(), self.leaf_str(l))?;
                    }
                }
                Node::Embedded { rule, tree, .. } => {
                    write!(f, "{} : {}", self.grm.rule_name(*rule), tree)?;
                }
                Node::Branch {
                    rule, alternatives, ..
                } => {
                    f.write_str(self.grm.rule_name(*rule))?;
                    let children = &alternatives[0].children;
                    match children.len() {
                        0 => (),
                        1 => {
                            f.write_str(" : ")?;
                            st.push(DisplayItem::Node(children[0]));
                        }
                        _ => {
                            f.write_str(" { ")?;
                            st.push(DisplayItem::Text(" }"));
                            for (i, c) in children.iter().enumerate().rev() {
                                st.push(DisplayItem::Node(*c));
                                if i > 0 {
                                    st.push(DisplayItem::Text(" "));
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
