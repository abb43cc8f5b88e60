//! Atomic semantic entities.
//!
//! A [`Node`] represents either an entity (object, agent, event) or a
//! predication (property, relation, verb). Nodes are owned exclusively by
//! their [`NodePool`](crate::pool::NodePool); argument edges and property
//! back-links are non-owning [`NodeId`] references, so cyclic graphs are
//! safe by construction. All mutation goes through the pool.

use std::num::NonZeroI64;

use serde::{Deserialize, Serialize};

use crate::tags::TagSet;

/// Unique, niche-optimized identifier for a node.
///
/// The id is signed and nonzero: negative ids belong to the main memory
/// band, positive ids to the derived/halo band. `NonZeroI64` keeps
/// `Option<NodeId>` the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(NonZeroI64);

impl NodeId {
    /// Create a `NodeId` from a raw `i64`. Returns `None` if `raw` is zero.
    pub fn new(raw: i64) -> Option<Self> {
        NonZeroI64::new(raw).map(NodeId)
    }

    /// The underlying signed value.
    pub fn get(self) -> i64 {
        self.0.get()
    }

    /// The instance number (absolute value).
    pub fn inst(self) -> u64 {
        self.0.get().unsigned_abs()
    }

    /// Whether this id lives in the halo band (positive sign).
    pub fn halo(self) -> bool {
        self.0.get() > 0
    }

    /// Separator character used in nicknames: `-` for main, `+` for halo.
    pub fn sep(self) -> char {
        if self.halo() { '+' } else { '-' }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// One semantic node: identity, lexical content, grammar bits, belief,
/// argument slots, and back-pointers to the predications that mention it.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: String,
    pub(crate) lex: Option<String>,
    pub(crate) literal: Option<String>,
    pub(crate) tags: TagSet,
    /// Committed belief in [0, 1]. Zero means the node is hypothetical.
    pub(crate) dflt: f64,
    /// Currently-asserted belief; actualization copies `dflt` into it.
    pub(crate) blf: f64,
    pub(crate) neg: bool,
    pub(crate) done: bool,
    /// Ordered (slot name, target) pairs. Bounded by the pool.
    pub(crate) args: Vec<(String, NodeId)>,
    /// Back-links: every node whose argument list points at this one.
    pub(crate) props: Vec<NodeId>,
    pub(crate) vis: bool,
    /// Conversation-recency counter, bumped by `mark_convo`.
    pub(crate) convo: u32,
    /// Pool version stamp at creation or last re-assertion.
    pub(crate) gen: u64,
    /// Top-of-history marker stamped by assertion.
    pub(crate) top: u64,
    /// Whether this node depends on long-term memory.
    pub(crate) ltm: bool,
    /// Back-reference to a deeper-memory twin, if any.
    pub(crate) moor: Option<NodeId>,
    /// Index of the hash bin currently holding this node.
    pub(crate) bin: usize,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Kind string ("obj", "act", "hq", "ako", "name", "fcn", ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Lexical term, if any. Anonymous nodes have none.
    pub fn lex(&self) -> Option<&str> {
        self.lex.as_deref()
    }

    /// Unquoted string literal for nodes that *are* strings (unknown words).
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    pub fn tags(&self) -> TagSet {
        self.tags
    }

    /// Committed belief.
    pub fn dflt(&self) -> f64 {
        self.dflt
    }

    /// Currently-asserted belief.
    pub fn blf(&self) -> f64 {
        self.blf
    }

    pub fn neg(&self) -> bool {
        self.neg
    }

    /// Whether the predication is completed (vs ongoing / imperative).
    pub fn done(&self) -> bool {
        self.done
    }

    /// Hypothetical nodes carry a zero committed belief.
    pub fn hyp(&self) -> bool {
        self.dflt == 0.0
    }

    /// Whether the node lives in the halo band.
    pub fn halo(&self) -> bool {
        self.id.halo()
    }

    pub fn visible(&self) -> bool {
        self.vis
    }

    pub fn convo(&self) -> u32 {
        self.convo
    }

    pub fn gen(&self) -> u64 {
        self.gen
    }

    pub fn top(&self) -> u64 {
        self.top
    }

    pub fn ltm(&self) -> bool {
        self.ltm
    }

    pub fn moor(&self) -> Option<NodeId> {
        self.moor
    }

    /// Hash bin currently holding this node.
    pub fn bin(&self) -> usize {
        self.bin
    }

    /// Nickname "kind-n" (main band) or "kind+n" (halo).
    pub fn nick(&self) -> String {
        format!("{}{}{}", self.kind, self.id.sep(), self.id.inst())
    }

    /// Whether this is an object node (entity rather than predication).
    pub fn obj(&self) -> bool {
        self.kind == "obj"
    }

    /// Whether this node stands for a raw string.
    pub fn is_string(&self) -> bool {
        self.literal.is_some()
    }

    /// Number of argument slots in use.
    pub fn arg_cnt(&self) -> usize {
        self.args.len()
    }

    /// Ordered (slot, target) pairs.
    pub fn args(&self) -> &[(String, NodeId)] {
        &self.args
    }

    /// First target filed under `slot`, if any.
    pub fn arg(&self, slot: &str) -> Option<NodeId> {
        self.args
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, target)| *target)
    }

    /// All targets filed under `slot`, in order.
    pub fn args_named<'a>(&'a self, slot: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.args
            .iter()
            .filter(move |(name, _)| name == slot)
            .map(|(_, target)| *target)
    }

    /// Whether the (slot, target) edge already exists.
    pub fn has_arg(&self, slot: &str, target: NodeId) -> bool {
        self.args
            .iter()
            .any(|(name, t)| name == slot && *t == target)
    }

    /// Predication nodes whose arguments mention this node.
    pub fn props(&self) -> &[NodeId] {
        &self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<NodeId>>(),
            std::mem::size_of::<NodeId>()
        );
    }

    #[test]
    fn node_id_zero_is_none() {
        assert!(NodeId::new(0).is_none());
        assert!(NodeId::new(-1).is_some());
        assert_eq!(NodeId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn band_follows_sign() {
        let main = NodeId::new(-3).unwrap();
        let halo = NodeId::new(3).unwrap();
        assert!(!main.halo());
        assert!(halo.halo());
        assert_eq!(main.sep(), '-');
        assert_eq!(halo.sep(), '+');
        assert_eq!(main.inst(), 3);
        assert_eq!(halo.inst(), 3);
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(-42).unwrap().to_string(), "node:-42");
    }
}
