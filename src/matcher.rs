//! Backtracking subgraph matcher.
//!
//! A pattern graphlet (items held in a pattern pool, usually a halo) is
//! unified against a memory pool. Pattern items bind to memory nodes with
//! compatible content; argument edges must exist in memory with the same
//! slot names; the mapping is injective. Candidates are tried in bin
//! enumeration order, so recently-refreshed nodes win ties.
//!
//! An item (or edge target) that does not belong to the pattern pool is an
//! *anchor*: it names a memory node directly and binds to itself.

use std::collections::HashSet;

use crate::error::MatchError;
use crate::graphlet::Graphlet;
use crate::node::{Node, NodeId};
use crate::pool::{lex_hash, Bindings, NodePool};

/// Matcher over a (pattern pool, memory pool) pair.
///
/// `floor` is the minimum asserted belief a memory node needs to be a
/// candidate; `vis_only` restricts candidates to visible nodes.
pub struct Matcher<'p, 'm> {
    pats: &'p NodePool,
    mem: &'m NodePool,
    floor: f64,
    vis_only: bool,
}

impl<'p, 'm> Matcher<'p, 'm> {
    pub fn new(pats: &'p NodePool, mem: &'m NodePool) -> Self {
        Self {
            pats,
            mem,
            floor: 0.5,
            vis_only: false,
        }
    }

    /// Set the minimum asserted belief for candidates.
    pub fn floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Restrict candidates to visible nodes.
    pub fn vis_only(mut self, vis: bool) -> Self {
        self.vis_only = vis;
        self
    }

    /// First full match extending `seed`, or `None`.
    pub fn find(&self, pattern: &Graphlet, seed: &Bindings) -> Result<Option<Bindings>, MatchError> {
        let mut out = Vec::new();
        self.run(pattern, seed, true, &mut out)?;
        Ok(out.into_iter().next())
    }

    /// Every full match extending `seed`, in candidate-enumeration order.
    pub fn find_all(&self, pattern: &Graphlet, seed: &Bindings) -> Result<Vec<Bindings>, MatchError> {
        let mut out = Vec::new();
        self.run(pattern, seed, false, &mut out)?;
        Ok(out)
    }

    /// Number of distinct memory nodes the pattern's main item can bind to.
    ///
    /// This is the uniqueness probe behind referring-expression generation:
    /// a count of 1 means the description picks out exactly one thing.
    pub fn count_main(&self, pattern: &Graphlet, seed: &Bindings) -> Result<usize, MatchError> {
        let main = pattern.main().ok_or(MatchError::EmptyPattern)?;
        let all = self.find_all(pattern, seed)?;
        let mates: HashSet<NodeId> = all.iter().filter_map(|b| b.lookup(main)).collect();
        Ok(mates.len())
    }

    fn run(
        &self,
        pattern: &Graphlet,
        seed: &Bindings,
        first_only: bool,
        out: &mut Vec<Bindings>,
    ) -> Result<(), MatchError> {
        if pattern.is_empty() {
            return Err(MatchError::EmptyPattern);
        }
        let items: Vec<NodeId> = pattern.iter().collect();
        for &item in &items {
            if !self.pats.in_list(item) && !self.mem.in_list(item) {
                return Err(MatchError::ForeignItem {
                    nick: format!("{item}"),
                });
            }
        }
        let mut pairs: Vec<(NodeId, NodeId)> = seed.iter().collect();
        self.solve(&items, 0, &mut pairs, first_only, out);
        tracing::debug!(
            items = items.len(),
            matches = out.len(),
            "pattern match finished"
        );
        Ok(())
    }

    fn solve(
        &self,
        items: &[NodeId],
        idx: usize,
        pairs: &mut Vec<(NodeId, NodeId)>,
        first_only: bool,
        out: &mut Vec<Bindings>,
    ) -> bool {
        if idx == items.len() {
            let mut b = Bindings::new();
            for &(i, m) in pairs.iter() {
                b.bind(i, m);
            }
            out.push(b);
            return first_only;
        }
        let item = items[idx];

        // Anchors name memory nodes directly.
        if !self.pats.in_list(item) {
            if self.edges_ok(item, item, pairs) {
                pairs.push((item, item));
                let done = self.solve(items, idx + 1, pairs, first_only, out);
                pairs.pop();
                return done;
            }
            return false;
        }

        if let Some(mate) = lookup(pairs, item) {
            // Pre-bound (seed or earlier edge): verify edges only.
            if self.edges_ok(item, mate, pairs) {
                return self.solve(items, idx + 1, pairs, first_only, out);
            }
            return false;
        }

        let pat = match self.pats.get(item) {
            Some(p) => p,
            None => return false,
        };
        for cand in self.candidates(pat) {
            let cid = cand.id();
            if pairs.iter().any(|&(_, m)| m == cid) {
                continue; // injective mapping
            }
            if !self.node_ok(pat, cand) || !self.edges_ok(item, cid, pairs) {
                continue;
            }
            pairs.push((item, cid));
            let done = self.solve(items, idx + 1, pairs, first_only, out);
            pairs.pop();
            if done {
                return true;
            }
        }
        false
    }

    /// Candidate nodes for a pattern item, most recent first. A pattern
    /// lexical term narrows the walk to one hash bin.
    fn candidates(&self, pat: &Node) -> Box<dyn Iterator<Item = &'m Node> + 'm> {
        let mem = self.mem;
        if mem.hashed() {
            if let Some(lex) = pat.lex() {
                let bin = lex_hash(lex) as isize;
                let mut cur = mem.pool(bin);
                return Box::new(std::iter::from_fn(move || {
                    let n = cur?;
                    cur = mem.next(n, bin);
                    mem.get(n)
                }));
            }
        }
        Box::new(mem.iter())
    }

    /// Content compatibility between a pattern node and a memory node.
    fn node_ok(&self, pat: &Node, cand: &Node) -> bool {
        if cand.blf() < self.floor || (self.vis_only && !cand.visible()) {
            return false;
        }
        if pat.kind() != cand.kind() || pat.neg() != cand.neg() {
            return false;
        }
        if let Some(lex) = pat.lex() {
            if !cand.lex().is_some_and(|c| c.eq_ignore_ascii_case(lex)) {
                return false;
            }
        }
        if let Some(lit) = pat.literal() {
            if cand.literal() != Some(lit) {
                return false;
            }
        }
        // Pattern grammar bits must be a subset of the candidate's.
        pat.tags().0 & cand.tags().0 == pat.tags().0
    }

    /// Edge consistency between `item -> cand` and everything bound so far.
    ///
    /// Forward: each pattern edge whose target is an anchor or already bound
    /// must exist on the candidate. Backward: each bound pattern node with an
    /// edge aimed at `item` must have the mirror edge in memory. Edges toward
    /// still-unbound pattern nodes are deferred to the target's own turn.
    fn edges_ok(&self, item: NodeId, cand: NodeId, pairs: &[(NodeId, NodeId)]) -> bool {
        let cand_node = match self.mem.get(cand) {
            Some(n) => n,
            None => return false,
        };
        if let Some(pat) = self.pats.get(item) {
            for (slot, t) in pat.args() {
                let need = if !self.pats.in_list(*t) {
                    Some(*t) // anchor
                } else {
                    lookup(pairs, *t)
                };
                if let Some(mt) = need {
                    if !cand_node.has_arg(slot, mt) {
                        return false;
                    }
                }
            }
        }
        for &(pi, pm) in pairs {
            let Some(pn) = self.pats.get(pi) else { continue };
            for (slot, t) in pn.args() {
                if *t == item {
                    let ok = self
                        .mem
                        .get(pm)
                        .is_some_and(|m| m.has_arg(slot, cand));
                    if !ok {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn lookup(pairs: &[(NodeId, NodeId)], item: NodeId) -> Option<NodeId> {
    pairs.iter().find(|(i, _)| *i == item).map(|(_, m)| *m)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Memory with two objects: a red dog and a blue dog.
    fn dog_memory() -> (NodePool, NodeId, NodeId) {
        let mut mem = NodePool::new();
        let d1 = mem.make_node("obj", None, false, -1.0, false);
        let k1 = mem.add_prop(d1, "ako", "dog", false, 1.0, true).unwrap();
        mem.actualize(k1).unwrap();
        let c1 = mem.add_prop(d1, "hq", "red", false, 1.0, true).unwrap();
        mem.actualize(c1).unwrap();

        let d2 = mem.make_node("obj", None, false, -1.0, false);
        let k2 = mem.add_prop(d2, "ako", "dog", false, 1.0, true).unwrap();
        mem.actualize(k2).unwrap();
        let c2 = mem.add_prop(d2, "hq", "blue", false, 1.0, true).unwrap();
        mem.actualize(c2).unwrap();
        (mem, d1, d2)
    }

    /// Pattern: some object that is a dog (optionally with a color).
    fn dog_pattern(color: Option<&str>) -> (NodePool, Graphlet) {
        let mut pats = NodePool::halo_band();
        let obj = pats.make_node("obj", None, false, 0.0, false);
        let kind = pats.add_prop(obj, "ako", "dog", false, 0.0, true).unwrap();
        let mut g = Graphlet::new();
        g.add_item(obj);
        g.add_item(kind);
        if let Some(c) = color {
            let hq = pats.add_prop(obj, "hq", c, false, 0.0, true).unwrap();
            g.add_item(hq);
        }
        (pats, g)
    }

    #[test]
    fn finds_matching_subgraph() {
        let (mem, d1, _) = dog_memory();
        let (pats, g) = dog_pattern(Some("red"));
        let m = Matcher::new(&pats, &mem);
        let b = m.find(&g, &Bindings::new()).unwrap().unwrap();
        assert_eq!(b.lookup(g.main().unwrap()), Some(d1));
    }

    #[test]
    fn no_match_on_missing_edge() {
        let (mem, _, _) = dog_memory();
        let (pats, g) = dog_pattern(Some("green"));
        let m = Matcher::new(&pats, &mem);
        assert!(m.find(&g, &Bindings::new()).unwrap().is_none());
    }

    #[test]
    fn count_main_counts_distinct_subjects() {
        let (mem, _, _) = dog_memory();
        let (pats, g) = dog_pattern(None);
        let m = Matcher::new(&pats, &mem);
        assert_eq!(m.count_main(&g, &Bindings::new()).unwrap(), 2);

        let (pats, g) = dog_pattern(Some("blue"));
        let m = Matcher::new(&pats, &mem);
        assert_eq!(m.count_main(&g, &Bindings::new()).unwrap(), 1);
    }

    #[test]
    fn seed_restricts_the_search() {
        let (mem, _, d2) = dog_memory();
        let (pats, g) = dog_pattern(None);
        let mut seed = Bindings::new();
        seed.bind(g.main().unwrap(), d2);
        let m = Matcher::new(&pats, &mem);
        let all = m.find_all(&g, &seed).unwrap();
        assert!(!all.is_empty());
        assert!(all.iter().all(|b| b.lookup(g.main().unwrap()) == Some(d2)));
    }

    #[test]
    fn mapping_is_injective() {
        // Pattern: two distinct objects of the same kind. Memory holds one.
        let mut mem = NodePool::new();
        let solo = mem.make_node("obj", None, false, -1.0, false);
        let k = mem.add_prop(solo, "ako", "cat", false, 1.0, true).unwrap();
        mem.actualize(k).unwrap();

        let mut pats = NodePool::halo_band();
        let mut g = Graphlet::new();
        for _ in 0..2 {
            let o = pats.make_node("obj", None, false, 0.0, false);
            let kk = pats.add_prop(o, "ako", "cat", false, 0.0, true).unwrap();
            g.add_item(o);
            g.add_item(kk);
        }
        let m = Matcher::new(&pats, &mem);
        assert!(m.find(&g, &Bindings::new()).unwrap().is_none());
    }

    #[test]
    fn belief_floor_excludes_weak_facts() {
        let mut mem = NodePool::new();
        let obj = mem.make_node("obj", None, false, -1.0, false);
        let weak = mem.add_prop(obj, "hq", "wet", false, 0.3, true).unwrap();
        mem.actualize(weak).unwrap(); // blf = 0.3

        let mut pats = NodePool::halo_band();
        let o = pats.make_node("obj", None, false, 0.0, false);
        let hq = pats.add_prop(o, "hq", "wet", false, 0.0, true).unwrap();
        let g: Graphlet = [o, hq].into_iter().collect();

        assert!(Matcher::new(&pats, &mem)
            .find(&g, &Bindings::new())
            .unwrap()
            .is_none());
        assert!(Matcher::new(&pats, &mem)
            .floor(0.2)
            .find(&g, &Bindings::new())
            .unwrap()
            .is_some());
    }

    #[test]
    fn recency_breaks_ties() {
        let (mut mem, d1, d2) = dog_memory();
        let (pats, g) = dog_pattern(None);
        // d2 was created last so it leads its bin.
        let m = Matcher::new(&pats, &mem);
        let b = m.find(&g, &Bindings::new()).unwrap().unwrap();
        assert_eq!(b.lookup(g.main().unwrap()), Some(d2));

        mem.refresh(d1);
        let m = Matcher::new(&pats, &mem);
        let b = m.find(&g, &Bindings::new()).unwrap().unwrap();
        assert_eq!(b.lookup(g.main().unwrap()), Some(d1));
    }

    #[test]
    fn anchors_bind_to_themselves() {
        let (mem, d1, _) = dog_memory();
        // Pattern property aimed straight at the memory node.
        let mut pats = NodePool::halo_band();
        let hq = pats.make_node("hq", Some("red"), false, 0.0, false);
        pats.get_mut(hq).unwrap().args.push(("hq".into(), d1));
        let g: Graphlet = [hq, d1].into_iter().collect();

        let m = Matcher::new(&pats, &mem);
        let b = m.find(&g, &Bindings::new()).unwrap().unwrap();
        assert_eq!(b.lookup(d1), Some(d1));
        assert!(b.lookup(hq).is_some());
    }

    #[test]
    fn negation_must_agree() {
        let mut mem = NodePool::new();
        let obj = mem.make_node("obj", None, false, -1.0, false);
        let p = mem.add_prop(obj, "hq", "big", true, 1.0, true).unwrap();
        mem.actualize(p).unwrap();

        let mut pats = NodePool::halo_band();
        let o = pats.make_node("obj", None, false, 0.0, false);
        let hq = pats.add_prop(o, "hq", "big", false, 0.0, true).unwrap();
        let g: Graphlet = [o, hq].into_iter().collect();
        assert!(Matcher::new(&pats, &mem)
            .find(&g, &Bindings::new())
            .unwrap()
            .is_none());

        pats.set_neg(hq, true).unwrap();
        assert!(Matcher::new(&pats, &mem)
            .find(&g, &Bindings::new())
            .unwrap()
            .is_some());
    }

    #[test]
    fn empty_and_foreign_patterns_error() {
        let mem = NodePool::new();
        let pats = NodePool::halo_band();
        let m = Matcher::new(&pats, &mem);
        assert!(matches!(
            m.find(&Graphlet::new(), &Bindings::new()),
            Err(MatchError::EmptyPattern)
        ));

        let mut g = Graphlet::new();
        g.add_item(NodeId::new(77).unwrap());
        assert!(matches!(
            m.find(&g, &Bindings::new()),
            Err(MatchError::ForeignItem { .. })
        ));
    }

    #[test]
    fn vis_only_skips_hidden_nodes() {
        let (mut mem, d1, d2) = dog_memory();
        mem.set_vis(d2, false).unwrap();
        let (pats, g) = dog_pattern(None);
        let m = Matcher::new(&pats, &mem).vis_only(true);
        assert_eq!(m.count_main(&g, &Bindings::new()).unwrap(), 1);
        let b = m.find(&g, &Bindings::new()).unwrap().unwrap();
        assert_eq!(b.lookup(g.main().unwrap()), Some(d1));
    }
}
