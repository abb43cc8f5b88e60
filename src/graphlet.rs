//! Ordered, deduplicating windows over nodes.
//!
//! A [`Graphlet`] delimits a sub-graph: a pattern to match, a rule head or
//! body, or a description under construction. Insertion order is preserved
//! and duplicates are ignored; the first item inserted is the *main* item
//! (the subject of the predication being built, or the focus of a pattern).

use crate::node::NodeId;

/// An ordered list of node references with set semantics on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graphlet {
    items: Vec<NodeId>,
}

impl Graphlet {
    /// Create an empty graphlet.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a node unless it is already present.
    ///
    /// Returns true if the node was added. The first successful insertion
    /// defines the main item.
    pub fn add_item(&mut self, n: NodeId) -> bool {
        if self.items.contains(&n) {
            return false;
        }
        self.items.push(n);
        true
    }

    /// Remove a node wherever it appears. Returns true if it was present.
    pub fn rem_item(&mut self, n: NodeId) -> bool {
        let before = self.items.len();
        self.items.retain(|&x| x != n);
        self.items.len() != before
    }

    /// Membership test.
    pub fn in_list(&self, n: NodeId) -> bool {
        self.items.contains(&n)
    }

    /// Alias of [`in_list`](Self::in_list), read as "is part of this description".
    pub fn in_desc(&self, n: NodeId) -> bool {
        self.in_list(n)
    }

    /// The main item: the first node ever inserted.
    pub fn main(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    /// Item at position `i` in insertion order.
    pub fn item(&self, i: usize) -> Option<NodeId> {
        self.items.get(i).copied()
    }

    /// Number of items.
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Whether the graphlet holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the last `k` appended items.
    ///
    /// Used to undo speculative additions after a uniqueness probe. Popping
    /// more items than exist simply empties the graphlet.
    pub fn pop(&mut self, k: usize) {
        let keep = self.items.len().saturating_sub(k);
        self.items.truncate(keep);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }
}

impl FromIterator<NodeId> for Graphlet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut g = Graphlet::new();
        for n in iter {
            g.add_item(n);
        }
        g
    }
}

impl<'a> IntoIterator for &'a Graphlet {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}
