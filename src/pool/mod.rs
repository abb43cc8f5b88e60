//! Node pool: the owning container for semantic nodes.
//!
//! The pool owns every node in it and is the unit of bulk lifecycle. Nodes
//! live in hash bins keyed by the first two letters of their lexical term
//! ([`lex_hash`]); a flat pool keeps a single bin. New nodes are filed at
//! the head of their bin (or the tail in reverse mode) and [`NodePool::refresh`]
//! re-files existing ones, so enumeration order doubles as a recency bias
//! for the matcher.
//!
//! The pool is a passive, single-threaded store: callers mutate it through
//! `make_node` / `add_prop` / `add_arg` / [`assert_graph`](NodePool::assert_graph)
//! and poll [`NodePool::changes`] for a cheap dirty indicator.

pub mod assert;
pub mod codec;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::graphlet::Graphlet;
use crate::node::{Node, NodeId};
use crate::tags::TagSet;

pub use assert::Bindings;

/// Bin count of a flat pool.
pub const FLAT_BINS: usize = 1;
/// Bin count of a hashed pool: 26 * 26 two-letter buckets plus bin 0 for
/// nodes without a lexical term.
pub const HASH_BINS: usize = 676;
/// Upper bound on argument slots per node.
pub const MAX_ARGS: usize = 16;

/// Map a word's first two letters into `[0, 675]`.
///
/// Returns `26 * c0 + c1 + 1` clamped to `[1, 675]`, where `c0`/`c1` are the
/// first two characters lowered and clipped to `a`-`z`. An empty word (or a
/// node with no lex at all) hashes to bin 0.
pub fn lex_hash(word: &str) -> usize {
    let mut chars = word.chars();
    let c0 = match chars.next() {
        None => return 0,
        Some(c) => letter_index(c),
    };
    let c1 = chars.next().map(letter_index).unwrap_or(0);
    (26 * c0 + c1 + 1).min(HASH_BINS - 1)
}

fn letter_index(c: char) -> usize {
    let v = (c.to_ascii_lowercase() as u32).clamp('a' as u32, 'z' as u32);
    (v - 'a' as u32) as usize
}

/// Pool configuration: numbering band, filing direction, and new-node defaults.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Halo pools issue positive ids; main pools issue negative ids.
    pub halo: bool,
    /// File new nodes at the bin tail instead of the head (used when
    /// reloading so the saved recency order is reproduced).
    pub rev: bool,
    /// Default visibility stamped on new nodes.
    pub vis_def: bool,
    /// Default LTM-dependence stamped on new nodes.
    pub ltm_def: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            halo: false,
            rev: false,
            vis_def: true,
            ltm_def: false,
        }
    }
}

/// Accumulated mutation counters, combined into a cheap "dirty?" indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    /// Nodes created.
    pub adds: u64,
    /// Argument edges added.
    pub args: u64,
    /// Nodes deleted.
    pub dels: u64,
    /// In-place modifications (lex, belief, stamps).
    pub mods: u64,
    /// Long-term-memory transfers.
    pub ltms: u64,
}

impl ChangeCounts {
    /// Whether anything at all happened since the last poll.
    pub fn dirty(&self) -> bool {
        self.adds + self.args + self.dels + self.mods + self.ltms > 0
    }
}

/// A hashed, bin-organized collection of semantic nodes.
pub struct NodePool {
    cfg: PoolConfig,
    nodes: HashMap<NodeId, Node>,
    bins: Vec<VecDeque<NodeId>>,
    /// Largest instance number ever issued.
    label: u64,
    /// Version stamp bumped by callers for fluent re-evaluation.
    ver: u64,
    /// Rising conversation counter backing `mark_convo`.
    convo: u32,
    counts: ChangeCounts,
    /// When installed, every newly-created node is appended here.
    acc: Option<Graphlet>,
    /// Surface-string -> node translation, live only during deserialization.
    pub(crate) xlate: HashMap<String, NodeId>,
}

impl NodePool {
    /// Create a flat main-band pool.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with explicit configuration.
    pub fn with_config(cfg: PoolConfig) -> Self {
        tracing::debug!(halo = cfg.halo, rev = cfg.rev, "creating node pool");
        Self {
            cfg,
            nodes: HashMap::new(),
            bins: vec![VecDeque::new(); FLAT_BINS],
            label: 0,
            ver: 1,
            convo: 0,
            counts: ChangeCounts::default(),
            acc: None,
            xlate: HashMap::new(),
        }
    }

    /// Create a halo-band pool (positive ids, derived material).
    pub fn halo_band() -> Self {
        Self::with_config(PoolConfig {
            halo: true,
            ..PoolConfig::default()
        })
    }

    // -- bins ---------------------------------------------------------------

    /// Switch from one flat bin to 676 hashed bins.
    ///
    /// Idempotent, but must be called before any node exists: converting a
    /// populated pool is rejected rather than silently re-filed.
    pub fn make_bins(&mut self) -> Result<(), PoolError> {
        if self.bins.len() == HASH_BINS {
            return Ok(());
        }
        if !self.nodes.is_empty() {
            return Err(PoolError::BinsAfterNodes {
                count: self.nodes.len(),
            });
        }
        self.bins = vec![VecDeque::new(); HASH_BINS];
        Ok(())
    }

    /// Whether this pool uses hashed bins.
    pub fn hashed(&self) -> bool {
        self.bins.len() == HASH_BINS
    }

    /// Number of bins (1 flat, 676 hashed).
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Number of nodes in a bin.
    pub fn bin_cnt(&self, bin: usize) -> Result<usize, PoolError> {
        self.bins
            .get(bin)
            .map(VecDeque::len)
            .ok_or(PoolError::BadBin {
                bin,
                bins: self.bins.len(),
            })
    }

    // -- identity and versioning --------------------------------------------

    /// Largest instance number ever issued.
    pub fn label(&self) -> u64 {
        self.label
    }

    /// Current version stamp.
    pub fn ver(&self) -> u64 {
        self.ver
    }

    /// Advance the version stamp and return the new value.
    pub fn bump_ver(&mut self) -> u64 {
        self.ver += 1;
        self.ver
    }

    /// Return and clear the accumulated change counters.
    pub fn changes(&mut self) -> ChangeCounts {
        std::mem::take(&mut self.counts)
    }

    // -- accumulator ---------------------------------------------------------

    /// Install an accumulator graphlet: every node created from now on is
    /// appended to it. Replaces any previous accumulator.
    pub fn collect_into(&mut self, g: Graphlet) {
        self.acc = Some(g);
    }

    /// Remove and return the accumulator, ending collection.
    pub fn end_collect(&mut self) -> Option<Graphlet> {
        self.acc.take()
    }

    /// Whether an accumulator is installed.
    pub fn collecting(&self) -> bool {
        self.acc.is_some()
    }

    pub(crate) fn acc_add(&mut self, n: NodeId) {
        if let Some(acc) = self.acc.as_mut() {
            acc.add_item(n);
        }
    }

    pub(crate) fn acc_rem(&mut self, n: NodeId) {
        if let Some(acc) = self.acc.as_mut() {
            acc.rem_item(n);
        }
    }

    // -- node access ---------------------------------------------------------

    /// Borrow a node by id.
    pub fn get(&self, n: NodeId) -> Option<&Node> {
        self.nodes.get(&n)
    }

    pub(crate) fn get_mut(&mut self, n: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&n)
    }

    /// Whether the node belongs to this pool.
    pub fn in_list(&self, n: NodeId) -> bool {
        self.nodes.contains_key(&n)
    }

    /// Total node count; hypothetical nodes are skipped unless `hyp` is set.
    pub fn node_cnt(&self, hyp: bool) -> usize {
        if hyp {
            self.nodes.len()
        } else {
            self.nodes.values().filter(|n| !n.hyp()).count()
        }
    }

    // -- creation ------------------------------------------------------------

    fn next_id(&mut self) -> NodeId {
        self.label += 1;
        let raw = if self.cfg.halo {
            self.label as i64
        } else {
            -(self.label as i64)
        };
        NodeId::new(raw).expect("label counter starts at 1")
    }

    fn file_into_bin(&mut self, n: NodeId, bin: usize) {
        if self.cfg.rev {
            self.bins[bin].push_back(n);
        } else {
            self.bins[bin].push_front(n);
        }
        if let Some(node) = self.nodes.get_mut(&n) {
            node.bin = bin;
        }
    }

    fn unfile(&mut self, n: NodeId) {
        if let Some(node) = self.nodes.get(&n) {
            let bin = node.bin;
            if let Some(pos) = self.bins[bin].iter().position(|&x| x == n) {
                self.bins[bin].remove(pos);
            }
        }
    }

    fn insert_raw(&mut self, id: NodeId, kind: &str, neg: bool, dflt: f64, done: bool) {
        let blf = if dflt < 0.0 { dflt.abs() } else { 0.0 };
        let node = Node {
            id,
            kind: kind.to_string(),
            lex: None,
            literal: None,
            tags: TagSet::EMPTY,
            dflt: dflt.abs(),
            blf,
            neg,
            done,
            args: Vec::new(),
            props: Vec::new(),
            vis: self.cfg.vis_def,
            convo: 0,
            gen: self.ver,
            top: 0,
            ltm: self.cfg.ltm_def,
            moor: None,
            bin: 0,
        };
        self.nodes.insert(id, node);
        self.file_into_bin(id, 0);
        self.acc_add(id);
        self.counts.adds += 1;
    }

    /// Create a node.
    ///
    /// The committed belief is `|dflt|`; a negative `dflt` additionally
    /// actualizes the node (asserted belief starts at `|dflt|` instead of 0).
    /// A provided `word` files the node into its hash bin.
    pub fn make_node(
        &mut self,
        kind: &str,
        word: Option<&str>,
        neg: bool,
        dflt: f64,
        done: bool,
    ) -> NodeId {
        let id = self.next_id();
        self.insert_raw(id, kind, neg, dflt, done);
        if let Some(w) = word {
            self.update_lex(id, w);
        }
        id
    }

    /// Create an action node for a verb stem, committed and asserted.
    pub fn make_act(&mut self, verb: &str) -> NodeId {
        self.make_node("act", Some(verb), false, -1.0, false)
    }

    /// Mark an existing property as possessed: `prop -wrt-> owner`.
    pub fn make_poss(&mut self, prop: NodeId, owner: NodeId) -> Result<(), PoolError> {
        self.add_arg(prop, "wrt", owner)
    }

    /// Clone a node of this pool: same kind, lex, literal, tags, belief pair,
    /// negation, and completion, but a fresh id and no arguments.
    pub fn clone_node(&mut self, n: NodeId) -> Option<NodeId> {
        let src = self.nodes.get(&n)?.clone();
        let id = self.make_node(&src.kind, src.lex.as_deref(), src.neg, src.dflt, src.done);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.literal = src.literal;
            node.tags = src.tags;
            node.blf = src.blf;
        }
        Some(id)
    }

    /// Import a long-term-memory node as a shallow surface clone ("buoy").
    ///
    /// Copies the belief pair and grammar bits, marks object clones with a
    /// `moor` back-reference to the deep twin, and makes the clone visible.
    /// Halo nodes are never mooring targets.
    pub fn buoy_for(&mut self, deep: &Node) -> NodeId {
        let id = self.make_node(deep.kind(), deep.lex(), deep.neg(), deep.dflt(), deep.done());
        if let Some(node) = self.nodes.get_mut(&id) {
            node.literal = deep.literal().map(str::to_string);
            node.tags = deep.tags();
            node.blf = deep.blf();
            node.vis = true;
            if deep.obj() && !deep.halo() {
                node.moor = Some(deep.id());
            }
        }
        id
    }

    /// Resolve a textual nickname like `obj-3`, optionally creating the node.
    ///
    /// An explicit id already taken by a different kind is an ID collision:
    /// it is logged and `None` is returned, never silently overwritten.
    /// `omit` resolves without adding a created node to the accumulator.
    pub fn find_node(&mut self, desc: &str, make: bool, omit: bool) -> Option<NodeId> {
        let (kind, id) = self.parse_nick(desc)?;
        if let Some(node) = self.nodes.get(&id) {
            if node.kind == kind {
                return Some(id);
            }
            tracing::warn!(
                id = id.get(),
                have = %node.kind,
                want = %kind,
                "id collision while resolving node"
            );
            return None;
        }
        if !make {
            return None;
        }
        let keep_acc = self.acc.take();
        self.insert_raw(id, &kind, false, 1.0, false);
        self.acc = keep_acc;
        if !omit {
            self.acc_add(id);
        }
        self.label = self.label.max(id.inst());
        Some(id)
    }

    /// Split `kind-3` / `kind+3` / `kind:3` into kind and signed id.
    fn parse_nick(&self, desc: &str) -> Option<(String, NodeId)> {
        let pos = desc.rfind(['-', '+', ':'])?;
        let (kind, rest) = desc.split_at(pos);
        let sep = rest.chars().next()?;
        let inst: u64 = rest[1..].parse().ok()?;
        if kind.is_empty() || inst == 0 {
            return None;
        }
        let raw = match sep {
            '+' => inst as i64,
            '-' => -(inst as i64),
            // Band-neutral separator: follow the pool's own numbering.
            _ if self.cfg.halo => inst as i64,
            _ => -(inst as i64),
        };
        Some((kind.to_string(), NodeId::new(raw)?))
    }

    // -- properties ----------------------------------------------------------

    /// Attach a lexical property node to `head`.
    ///
    /// Creates `p` with kind `role` and lex `word`, then links `p -role-> head`.
    /// With `chk` set, an existing single-argument property with identical
    /// (role, word, neg, |dflt|) is refreshed (generation bumped) and returned
    /// instead of duplicated.
    pub fn add_prop(
        &mut self,
        head: NodeId,
        role: &str,
        word: &str,
        neg: bool,
        dflt: f64,
        chk: bool,
    ) -> Result<NodeId, PoolError> {
        if chk {
            if let Some(p) = self.find_prop(head, role, word, neg, dflt.abs()) {
                let ver = self.ver;
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.gen = ver;
                }
                self.counts.mods += 1;
                return Ok(p);
            }
        }
        let p = self.make_node(role, Some(word), neg, dflt, false);
        self.add_arg(p, role, head)?;
        Ok(p)
    }

    /// Attach a property plus a `deg` intensity modifier ("very red").
    ///
    /// Dedup follows [`add_prop`](Self::add_prop); an existing base property
    /// only gains a new modifier if `amt` is not already attached.
    pub fn add_deg(
        &mut self,
        head: NodeId,
        role: &str,
        word: &str,
        amt: &str,
        neg: bool,
        dflt: f64,
        chk: bool,
    ) -> Result<NodeId, PoolError> {
        let p = self.add_prop(head, role, word, neg, dflt, chk)?;
        let already = self
            .props_of(p)
            .any(|d| d.kind() == "deg" && d.lex() == Some(amt));
        if !already {
            let d = self.make_node("deg", Some(amt), false, dflt, false);
            self.add_arg(d, "deg", p)?;
        }
        Ok(p)
    }

    fn find_prop(
        &self,
        head: NodeId,
        role: &str,
        word: &str,
        neg: bool,
        dflt: f64,
    ) -> Option<NodeId> {
        let node = self.nodes.get(&head)?;
        node.props.iter().copied().find(|&p| {
            self.nodes.get(&p).is_some_and(|prop| {
                prop.kind == role
                    && prop.lex.as_deref() == Some(word)
                    && prop.neg == neg
                    && prop.dflt == dflt
                    && prop.arg_cnt() == 1
                    && prop.arg(role) == Some(head)
            })
        })
    }

    /// Iterate the predications that mention `n`.
    pub fn props_of(&self, n: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes
            .get(&n)
            .map(|node| node.props.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |p| self.nodes.get(p))
    }

    /// Properties of `n` with the given kind, most recent first.
    pub fn props_of_kind<'a>(&'a self, n: NodeId, kind: &'a str) -> impl Iterator<Item = &'a Node> {
        self.props_of(n).filter(move |p| p.kind() == kind)
    }

    // -- edges ---------------------------------------------------------------

    /// Add an argument edge `p -slot-> target` and the symmetric back-link.
    ///
    /// Duplicate edges are ignored; slot counts are bounded by [`MAX_ARGS`].
    pub fn add_arg(&mut self, p: NodeId, slot: &str, target: NodeId) -> Result<(), PoolError> {
        let nick = self.nick_of(p)?;
        if !self.nodes.contains_key(&target) {
            return Err(PoolError::UnknownNode {
                nick: format!("{target}"),
            });
        }
        {
            let node = self.nodes.get(&p).expect("checked above");
            if node.has_arg(slot, target) {
                return Ok(());
            }
            if node.args.len() >= MAX_ARGS {
                return Err(PoolError::ArgLimit {
                    nick,
                    max: MAX_ARGS,
                });
            }
        }
        self.nodes
            .get_mut(&p)
            .expect("checked above")
            .args
            .push((slot.to_string(), target));
        self.nodes
            .get_mut(&target)
            .expect("checked above")
            .props
            .push(p);
        self.counts.args += 1;
        Ok(())
    }

    /// Remove an argument edge and its back-link.
    pub fn rem_arg(&mut self, p: NodeId, slot: &str, target: NodeId) -> Result<(), PoolError> {
        let nick = self.nick_of(p)?;
        let node = self.nodes.get_mut(&p).ok_or(PoolError::UnknownNode { nick })?;
        let before = node.args.len();
        node.args.retain(|(s, t)| !(s == slot && *t == target));
        if node.args.len() == before {
            return Ok(());
        }
        if let Some(t) = self.nodes.get_mut(&target) {
            if let Some(pos) = t.props.iter().position(|&x| x == p) {
                t.props.remove(pos);
            }
        }
        self.counts.dels += 1;
        Ok(())
    }

    fn nick_of(&self, n: NodeId) -> Result<String, PoolError> {
        self.nodes
            .get(&n)
            .map(Node::nick)
            .ok_or(PoolError::UnknownNode {
                nick: format!("{n}"),
            })
    }

    // -- mutation ------------------------------------------------------------

    fn update_lex(&mut self, n: NodeId, word: &str) {
        self.unfile(n);
        let bin = if self.hashed() { lex_hash(word) } else { 0 };
        if let Some(node) = self.nodes.get_mut(&n) {
            node.lex = Some(word.to_string());
        }
        self.file_into_bin(n, bin);
    }

    /// Replace the lexical term, re-filing the node into its new bin.
    pub fn set_lex(&mut self, n: NodeId, word: &str) -> Result<(), PoolError> {
        self.nick_of(n)?;
        self.update_lex(n, word);
        self.counts.mods += 1;
        Ok(())
    }

    /// Set the unquoted string literal.
    pub fn set_str(&mut self, n: NodeId, text: &str) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.literal = Some(text.to_string());
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Merge grammatical feature bits into the node.
    pub fn add_tags(&mut self, n: NodeId, tags: TagSet) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.tags = node.tags.union(tags);
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Stamp an explicit generation version.
    pub fn set_gen(&mut self, n: NodeId, gen: u64) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.gen = gen;
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Overwrite the asserted belief, clamped to `[0, committed belief]`.
    ///
    /// Only the confidence override of
    /// [`assert_graph`](Self::assert_graph) may push the asserted value
    /// past the committed one.
    pub fn set_belief(&mut self, n: NodeId, blf: f64) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.blf = blf.clamp(0.0, node.dflt);
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Actualize: copy the committed belief into the asserted belief.
    pub fn actualize(&mut self, n: NodeId) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.blf = node.dflt;
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Set or clear negation.
    pub fn set_neg(&mut self, n: NodeId, neg: bool) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.neg = neg;
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Set or clear the completion flag.
    pub fn set_done(&mut self, n: NodeId, done: bool) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.done = done;
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Set visibility.
    pub fn set_vis(&mut self, n: NodeId, vis: bool) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.vis = vis;
        }
        self.counts.mods += 1;
        Ok(())
    }

    /// Mark a node as transferred to / dependent on long-term memory.
    pub fn set_ltm(&mut self, n: NodeId, ltm: bool) -> Result<(), PoolError> {
        self.nick_of(n)?;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.ltm = ltm;
        }
        self.counts.ltms += 1;
        Ok(())
    }

    pub(crate) fn set_top(&mut self, n: NodeId, top: u64) {
        if let Some(node) = self.nodes.get_mut(&n) {
            node.top = top;
        }
    }

    /// Bump the node's conversation-recency counter to "most recent".
    pub fn mark_convo(&mut self, n: NodeId) {
        self.convo += 1;
        let stamp = self.convo;
        if let Some(node) = self.nodes.get_mut(&n) {
            node.convo = stamp;
        }
    }

    /// Move a node to the head of its bin, then do the same for each of its
    /// arguments. Biases matcher order toward recently-mentioned items.
    pub fn refresh(&mut self, n: NodeId) {
        let mut seen = HashSet::new();
        self.refresh_inner(n, &mut seen);
    }

    fn refresh_inner(&mut self, n: NodeId, seen: &mut HashSet<NodeId>) {
        if !seen.insert(n) {
            return;
        }
        let Some(node) = self.nodes.get(&n) else {
            return;
        };
        let bin = node.bin;
        let targets: Vec<NodeId> = node.args.iter().map(|(_, t)| *t).collect();
        if let Some(pos) = self.bins[bin].iter().position(|&x| x == n) {
            self.bins[bin].remove(pos);
            self.bins[bin].push_front(n);
        }
        for t in targets {
            self.refresh_inner(t, seen);
        }
    }

    /// Refresh every item of a graphlet.
    pub fn refresh_all(&mut self, g: &Graphlet) {
        for n in g.iter() {
            self.refresh(n);
        }
    }

    /// Re-stamp every node's generation to `ver` and clear top-of-history
    /// markers. Bulk reset between episodes.
    pub fn wash(&mut self, ver: u64) {
        for node in self.nodes.values_mut() {
            node.gen = ver;
            node.top = 0;
        }
        self.ver = self.ver.max(ver);
    }

    // -- removal -------------------------------------------------------------

    /// Remove a node from the pool.
    ///
    /// Former referrers are left with dangling edges: callers must purge
    /// referrers first or accept lookups that return nothing.
    pub fn rem_node(&mut self, n: NodeId) -> Result<(), PoolError> {
        self.nick_of(n)?;
        self.unfile(n);
        self.nodes.remove(&n);
        self.acc_rem(n);
        self.counts.dels += 1;
        Ok(())
    }

    /// Clear every bin and reset ids.
    pub fn purge_all(&mut self) {
        let n = self.nodes.len();
        for bin in &mut self.bins {
            bin.clear();
        }
        self.nodes.clear();
        self.xlate.clear();
        self.label = 0;
        self.convo = 0;
        self.counts.dels += n as u64;
        tracing::info!(purged = n, "pool purged");
    }

    // -- enumeration ---------------------------------------------------------

    /// Head of the requested bin; with `bin < 0`, head of the first
    /// non-empty bin.
    pub fn pool(&self, bin: isize) -> Option<NodeId> {
        if bin >= 0 {
            return self.bins.get(bin as usize)?.front().copied();
        }
        self.bins.iter().find_map(|b| b.front().copied())
    }

    /// Node after `n` in its bin; with `bin < 0`, falls through to the head
    /// of the next non-empty bin at the end of each list.
    ///
    /// Stable under insertion at the head, not under arbitrary deletions
    /// from other bins.
    pub fn next(&self, n: NodeId, bin: isize) -> Option<NodeId> {
        let node = self.nodes.get(&n)?;
        let here = node.bin;
        let list = &self.bins[here];
        let pos = list.iter().position(|&x| x == n)?;
        if let Some(&succ) = list.get(pos + 1) {
            return Some(succ);
        }
        if bin >= 0 {
            return None;
        }
        self.bins[here + 1..]
            .iter()
            .find_map(|b| b.front().copied())
    }

    /// Iterate every node in bin order (recency within each bin).
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.bins
            .iter()
            .flat_map(|b| b.iter())
            .filter_map(move |n| self.nodes.get(n))
    }

    /// All node ids ordered by ascending instance number (stable across runs).
    pub fn iter_ids_sorted(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_by_key(|n| (n.inst(), n.get()));
        ids
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodePool")
            .field("nodes", &self.nodes.len())
            .field("bins", &self.bins.len())
            .field("label", &self.label)
            .field("ver", &self.ver)
            .finish()
    }
}
