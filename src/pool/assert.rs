//! Pattern-driven assertion: instantiating a graphlet into a pool.
//!
//! A rule effect or parsed utterance arrives as a pattern graphlet living in
//! some source pool (typically a halo). [`NodePool::assert_graph`] mirrors
//! that pattern into the target pool, re-using nodes already bound, adopting
//! nodes that live outside the pattern universe, and creating the rest.
//! Re-asserting the same pattern with the same bindings is idempotent: no
//! new nodes or edges appear, only generation stamps move.

use crate::error::AssertError;
use crate::graphlet::Graphlet;
use crate::node::NodeId;

use super::NodePool;

/// Pattern-to-pool bindings, plus optional lexical substitutions.
///
/// A substitution replaces a pattern item's lexical term at instantiation
/// time (wildcard words); a substituted node created inside a halo pool is
/// hypothetical (committed belief zero).
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pairs: Vec<(NodeId, NodeId)>,
    subs: Vec<(NodeId, String)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a pattern item to its mate. A later binding for the same item
    /// replaces the earlier one.
    pub fn bind(&mut self, item: NodeId, mate: NodeId) {
        if let Some(pair) = self.pairs.iter_mut().find(|(i, _)| *i == item) {
            pair.1 = mate;
        } else {
            self.pairs.push((item, mate));
        }
    }

    /// Mate currently bound to a pattern item.
    pub fn lookup(&self, item: NodeId) -> Option<NodeId> {
        self.pairs
            .iter()
            .find(|(i, _)| *i == item)
            .map(|(_, m)| *m)
    }

    /// Register a lexical substitution for a pattern item.
    pub fn substitute(&mut self, item: NodeId, word: impl Into<String>) {
        self.subs.push((item, word.into()));
    }

    /// Substitution registered for a pattern item, if any.
    pub fn sub(&self, item: NodeId) -> Option<&str> {
        self.subs
            .iter()
            .find(|(i, _)| *i == item)
            .map(|(_, w)| w.as_str())
    }

    /// Number of bound pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate (pattern item, mate) pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.pairs.iter().copied()
    }
}

impl NodePool {
    /// Instantiate a pattern graphlet (held in `src`) into this pool.
    ///
    /// Items are resolved in pattern order: a pre-bound item uses its mate,
    /// an item outside `src` is adopted directly, anything else is created
    /// here mirroring kind, lex (with optional substitution), negation,
    /// belief, completion, and tag bits. Missing argument edges are then
    /// added; edge targets reached from outside the pattern are dropped from
    /// the accumulator so they are not reported as newly asserted.
    ///
    /// A negative `conf` overwrites the asserted belief with `|conf|`. Every
    /// touched node is stamped with `top` and the current pool version.
    pub fn assert_graph(
        &mut self,
        pattern: &Graphlet,
        src: &NodePool,
        b: &mut Bindings,
        conf: f64,
        top: u64,
    ) -> Result<(), AssertError> {
        let mut mates: Vec<NodeId> = Vec::with_capacity(pattern.num_items());
        for item in pattern.iter() {
            mates.push(self.lookup_make(item, src, b)?);
        }

        for (item, &mate) in pattern.iter().zip(&mates) {
            let Some(pat) = src.get(item) else {
                // Adopted nodes carry no pattern edges of their own.
                continue;
            };
            let edges: Vec<(String, NodeId)> = pat.args().to_vec();
            for (slot, t) in edges {
                let mate_t = self.lookup_make(t, src, b)?;
                let absent = self
                    .get(mate)
                    .is_some_and(|m| !m.has_arg(&slot, mate_t));
                if absent {
                    self.add_arg(mate, &slot, mate_t)?;
                }
                if !pattern.in_list(t) {
                    self.acc_rem(mate_t);
                }
            }
        }

        let ver = self.ver;
        for &mate in &mates {
            if conf < 0.0 {
                if let Some(node) = self.get_mut(mate) {
                    node.blf = conf.abs().min(1.0);
                }
            }
            self.set_top(mate, top);
            if let Some(node) = self.get_mut(mate) {
                node.gen = ver;
            }
            self.counts.mods += 1;
        }
        Ok(())
    }

    /// Resolve one pattern item: bound mate, direct adoption, or fresh node.
    fn lookup_make(
        &mut self,
        item: NodeId,
        src: &NodePool,
        b: &mut Bindings,
    ) -> Result<NodeId, AssertError> {
        if let Some(mate) = b.lookup(item) {
            return Ok(mate);
        }
        let Some(pat) = src.get(item) else {
            // Outside the pattern universe: adopt the node as-is.
            if self.in_list(item) {
                return Ok(item);
            }
            return Err(AssertError::Unresolved {
                nick: format!("{item}"),
            });
        };
        let lex = b.sub(item).map(str::to_string).or_else(|| {
            pat.lex().map(str::to_string)
        });
        // A substituted word entering a halo is hypothetical material.
        let dflt = if b.sub(item).is_some() && self.cfg.halo {
            0.0
        } else {
            pat.dflt()
        };
        let pat_tags = pat.tags();
        let pat_literal = pat.literal().map(str::to_string);
        let pat_blf = pat.blf();
        let mate = self.make_node(pat.kind(), lex.as_deref(), pat.neg(), dflt, pat.done());
        if let Some(node) = self.get_mut(mate) {
            node.tags = pat_tags;
            node.literal = pat_literal;
            node.blf = pat_blf.min(node.dflt);
        }
        b.bind(item, mate);
        Ok(mate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;

    /// Pattern: a halo object with one `hq` property.
    fn red_thing_pattern() -> (NodePool, Graphlet) {
        let mut halo = NodePool::halo_band();
        let obj = halo.make_node("obj", None, false, 1.0, false);
        let red = halo.add_prop(obj, "hq", "red", false, 1.0, true).unwrap();
        let mut pat = Graphlet::new();
        pat.add_item(obj);
        pat.add_item(red);
        (halo, pat)
    }

    #[test]
    fn assert_creates_mirrored_nodes_and_edges() {
        let (halo, pat) = red_thing_pattern();
        let mut wm = NodePool::new();
        let mut b = Bindings::new();
        wm.assert_graph(&pat, &halo, &mut b, 0.0, 1).unwrap();

        assert_eq!(wm.node_cnt(true), 2);
        let obj = b.lookup(pat.item(0).unwrap()).unwrap();
        let red = b.lookup(pat.item(1).unwrap()).unwrap();
        assert_eq!(wm.get(red).unwrap().arg("hq"), Some(obj));
        assert_eq!(wm.get(red).unwrap().lex(), Some("red"));
        assert!(!obj.halo()); // mates live in the target band
    }

    #[test]
    fn reassertion_is_idempotent() {
        let (halo, pat) = red_thing_pattern();
        let mut wm = NodePool::new();
        let mut b = Bindings::new();
        wm.assert_graph(&pat, &halo, &mut b, 0.0, 1).unwrap();
        let nodes = wm.node_cnt(true);
        let red = b.lookup(pat.item(1).unwrap()).unwrap();
        let args = wm.get(red).unwrap().arg_cnt();

        wm.bump_ver();
        wm.assert_graph(&pat, &halo, &mut b, 0.0, 2).unwrap();
        assert_eq!(wm.node_cnt(true), nodes);
        assert_eq!(wm.get(red).unwrap().arg_cnt(), args);
        // Only the stamps move.
        assert_eq!(wm.get(red).unwrap().gen(), wm.ver());
        assert_eq!(wm.get(red).unwrap().top(), 2);
    }

    #[test]
    fn negative_conf_overwrites_belief() {
        let (halo, pat) = red_thing_pattern();
        let mut wm = NodePool::new();
        let mut b = Bindings::new();
        wm.assert_graph(&pat, &halo, &mut b, -0.75, 1).unwrap();
        let red = b.lookup(pat.item(1).unwrap()).unwrap();
        assert_eq!(wm.get(red).unwrap().blf(), 0.75);
    }

    #[test]
    fn prebound_items_are_reused() {
        let (halo, pat) = red_thing_pattern();
        let mut wm = NodePool::new();
        let existing = wm.make_node("obj", None, false, -1.0, false);
        let mut b = Bindings::new();
        b.bind(pat.item(0).unwrap(), existing);
        wm.assert_graph(&pat, &halo, &mut b, 0.0, 1).unwrap();

        // Only the property was created; it hangs off the pre-bound object.
        assert_eq!(wm.node_cnt(true), 2);
        let red = b.lookup(pat.item(1).unwrap()).unwrap();
        assert_eq!(wm.get(red).unwrap().arg("hq"), Some(existing));
    }

    #[test]
    fn outside_universe_nodes_are_adopted() {
        // Pattern property whose head is a working-memory node, not a
        // pattern node: the edge should attach to the adoptee directly.
        let mut wm = NodePool::new();
        let anchor = wm.make_node("obj", None, false, -1.0, false);

        let mut halo = NodePool::halo_band();
        let red = halo.make_node("hq", Some("red"), false, 1.0, false);
        // Simulated cross-pool edge: the halo property aims at the wm node.
        halo.nodes.get_mut(&red).unwrap().args.push(("hq".into(), anchor));

        let mut pat = Graphlet::new();
        pat.add_item(red);
        let mut b = Bindings::new();
        wm.collect_into(Graphlet::new());
        wm.assert_graph(&pat, &halo, &mut b, 0.0, 1).unwrap();

        let mate = b.lookup(red).unwrap();
        assert_eq!(wm.get(mate).unwrap().arg("hq"), Some(anchor));
        // The adopted anchor must not be reported as newly asserted.
        let acc = wm.end_collect().unwrap();
        assert!(acc.in_list(mate));
        assert!(!acc.in_list(anchor));
    }

    #[test]
    fn unresolvable_item_fails() {
        let halo = NodePool::halo_band();
        let mut wm = NodePool::new();
        let mut pat = Graphlet::new();
        // A node id that exists nowhere.
        pat.add_item(NodeId::new(99).unwrap());
        let mut b = Bindings::new();
        let err = wm.assert_graph(&pat, &halo, &mut b, 0.0, 1);
        assert!(matches!(err, Err(AssertError::Unresolved { .. })));
    }

    #[test]
    fn substitution_into_halo_is_hypothetical() {
        let mut src = NodePool::new();
        let obj = src.make_node("obj", None, false, 1.0, false);
        let kind = src.add_prop(obj, "ako", "thing", false, 1.0, true).unwrap();
        let mut pat = Graphlet::new();
        pat.add_item(obj);
        pat.add_item(kind);

        let mut halo = NodePool::with_config(PoolConfig {
            halo: true,
            ..PoolConfig::default()
        });
        let mut b = Bindings::new();
        b.substitute(kind, "gizmo");
        halo.assert_graph(&pat, &src, &mut b, 0.0, 1).unwrap();

        let mate = b.lookup(kind).unwrap();
        let node = halo.get(mate).unwrap();
        assert_eq!(node.lex(), Some("gizmo"));
        assert!(node.hyp());
    }
}
