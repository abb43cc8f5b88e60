//! Degrapher: graph-to-English surface generation.
//!
//! Given a node in working memory, produce a finite English phrase for it:
//! a referring expression for objects ("you", "Dave", "the red block",
//! "my ball") or a full predication for events and properties ("I am
//! grabbing the cup", "the block is red").
//!
//! The generator never mutates the caller's memory beyond recency stamps.
//! It owns a scratch halo pool and a private `cond` graphlet: candidate
//! descriptions are built speculatively in the scratch pool, counted
//! against working memory with the subgraph matcher, and popped again
//! until a description picks out exactly one thing.

mod pred;

use crate::graphlet::Graphlet;
use crate::matcher::Matcher;
use crate::morpho::{article, EnglishMorph, Morphology};
use crate::node::NodeId;
use crate::pool::{Bindings, NodePool};
use crate::tags::{Tag, TagSet};
use crate::wmem::WorkingMemory;

/// Surface generator over a working memory.
pub struct Degrapher<'w, W: WorkingMemory, M: Morphology = EnglishMorph> {
    wmem: &'w mut W,
    morph: M,
    /// Scratch pool holding speculative description patterns.
    scratch: NodePool,
    /// Query pattern under construction; its main item is `focus`.
    cond: Graphlet,
    focus: Option<NodeId>,
}

impl<'w, W: WorkingMemory> Degrapher<'w, W, EnglishMorph> {
    pub fn new(wmem: &'w mut W) -> Self {
        Self::with_morph(wmem, EnglishMorph)
    }
}

impl<'w, W: WorkingMemory, M: Morphology> Degrapher<'w, W, M> {
    pub fn with_morph(wmem: &'w mut W, morph: M) -> Self {
        Self {
            wmem,
            morph,
            scratch: NodePool::halo_band(),
            cond: Graphlet::new(),
            focus: None,
        }
    }

    /// A believed proper name for `n`, or `None`.
    pub fn name_ref(&self, n: NodeId) -> Option<String> {
        let floor = self.wmem.min_blf();
        self.wmem
            .pool()
            .props_of_kind(n, "name")
            .filter(|p| p.blf() >= floor)
            .find_map(|p| p.lex().filter(|w| !w.is_empty()).map(str::to_string))
    }

    /// Top-level dispatch: produce a phrase for any node.
    ///
    /// `nom` selects nominative case for pronouns ("I" vs "me"); `avoid`
    /// suppresses one adjective so "the red thing is red" cannot happen.
    pub fn node_ref(&mut self, n: NodeId, nom: bool, avoid: Option<&str>) -> Option<String> {
        let node = self.wmem.pool().get(n)?;
        if let Some(lit) = node.literal() {
            let quoted = format!("'{lit}'");
            self.wmem.pool_mut().mark_convo(n);
            return Some(quoted);
        }
        if node.obj() && !node.done() {
            return self.obj_ref(n, nom, avoid);
        }
        self.pred_ref(n, false)
    }

    // -- object references ----------------------------------------------------

    /// Referring expression for an object, most specific strategy first:
    /// pronoun, proper name, (possibly possessed) kind, then adjectives
    /// until the description is unique or three adjectives are in.
    fn obj_ref(&mut self, n: NodeId, nom: bool, avoid: Option<&str>) -> Option<String> {
        let node = self.wmem.pool().get(n)?;
        if node.hyp() && node.gen() > 0 {
            return self.hyp_ref(n, avoid);
        }

        if n == self.wmem.human() {
            return Some("you".to_string());
        }
        if n == self.wmem.robot() {
            return Some(if nom { "I" } else { "me" }.to_string());
        }
        if self.uniquely_recent(n) {
            let p = self.pronoun_for(n, nom);
            self.wmem.pool_mut().mark_convo(n);
            return Some(p);
        }

        self.reset_cond();

        // Proper names, most restrictive first.
        let names = self.believed_props(n, "name");
        let mut best_name: Option<(usize, String)> = None;
        for (word, _) in names {
            let cnt = self.probe("name", &word);
            if cnt == 0 {
                continue;
            }
            if best_name.as_ref().is_none_or(|(c, _)| cnt < *c) {
                best_name = Some((cnt, word));
            }
            if cnt == 1 {
                break;
            }
        }
        if let Some((_, name)) = best_name {
            self.wmem.pool_mut().mark_convo(n);
            return Some(name);
        }

        // Kind noun, with possessive determiner when the kind is owned.
        let kinds = self.believed_props(n, "ako");
        let mut cnt = usize::MAX;
        let mut kind_word = String::from("thing");
        let mut owner: Option<NodeId> = None;
        for (word, wrt) in kinds {
            let c = self.probe("ako", &word);
            if c > 0 && c < cnt {
                cnt = c;
                kind_word = word;
                owner = wrt;
                if c == 1 {
                    break;
                }
            }
        }
        if cnt == usize::MAX {
            cnt = self.num_match();
        } else {
            self.commit("ako", &kind_word);
        }

        // Adjectives, greediest (lowest match count) first.
        let mut adjs: Vec<String> = Vec::new();
        let mut pool_adjs: Vec<String> = self
            .believed_props(n, "hq")
            .into_iter()
            .map(|(w, _)| w)
            .filter(|w| avoid != Some(w.as_str()))
            .collect();
        while cnt > 1 && adjs.len() < 3 && !pool_adjs.is_empty() {
            let mut pick: Option<(usize, usize)> = None; // (count, index)
            for (i, word) in pool_adjs.iter().enumerate() {
                let c = self.probe("hq", word);
                if c > 0 && pick.is_none_or(|(pc, _)| c < pc) {
                    pick = Some((c, i));
                }
            }
            let Some((c, i)) = pick else { break };
            let word = pool_adjs.remove(i);
            self.commit("hq", &word);
            adjs.push(word);
            cnt = c;
        }

        let det = self.determiner(owner);
        let mut phrase = det;
        for a in &adjs {
            phrase.push_str(a);
            phrase.push(' ');
        }
        phrase.push_str(&kind_word);
        self.wmem.pool_mut().mark_convo(n);
        Some(phrase)
    }

    /// Indefinite description of a hypothetical object, location phrases
    /// included ("a red block on the table").
    fn hyp_ref(&mut self, n: NodeId, avoid: Option<&str>) -> Option<String> {
        let pool = self.wmem.pool();
        let noun = pool
            .props_of_kind(n, "ako")
            .find_map(|p| p.lex().map(str::to_string))
            .unwrap_or_else(|| "thing".to_string());
        let adjs: Vec<String> = pool
            .props_of_kind(n, "hq")
            .filter(|p| !p.tags().has(Tag::AComp) && !p.tags().has(Tag::ASup))
            .filter_map(|p| p.lex().map(str::to_string))
            .filter(|w| avoid != Some(w.as_str()))
            .collect();
        let locs: Vec<(String, Option<NodeId>)> = pool
            .props_of_kind(n, "loc")
            .filter(|p| !p.neg())
            .filter_map(|p| p.lex().map(|w| (w.to_string(), p.arg("ref"))))
            .collect();
        let first = adjs.first().map(String::as_str).unwrap_or(&noun);
        let mut phrase = format!("{} ", article(first, false));
        for a in &adjs {
            phrase.push_str(a);
            phrase.push(' ');
        }
        phrase.push_str(&noun);
        for (word, target) in locs {
            phrase.push(' ');
            phrase.push_str(&word);
            if let Some(t) = target {
                let txt = self.node_ref(t, false, None)?;
                phrase.push(' ');
                phrase.push_str(&txt);
            }
        }
        self.wmem.pool_mut().mark_convo(n);
        Some(phrase)
    }

    /// Whether `n` is the single most-recently-mentioned object.
    fn uniquely_recent(&self, n: NodeId) -> bool {
        let pool = self.wmem.pool();
        let Some(node) = pool.get(n) else {
            return false;
        };
        let c = node.convo();
        if c == 0 {
            return false;
        }
        !pool
            .iter()
            .any(|other| other.obj() && other.id() != n && other.convo() >= c)
    }

    /// Gendered third-person pronoun for `n`.
    fn pronoun_for(&self, n: NodeId, nom: bool) -> String {
        let floor = self.wmem.min_blf();
        let pool = self.wmem.pool();
        let has = |kind: &str, word: &str| {
            pool.props_of_kind(n, kind)
                .any(|p| p.blf() >= floor && p.lex() == Some(word))
        };
        if has("hq", "female") {
            return if nom { "she" } else { "her" }.to_string();
        }
        let named = pool
            .props_of_kind(n, "name")
            .any(|p| p.blf() >= floor && p.lex().is_some());
        if has("hq", "male") || has("ako", "person") || named {
            return if nom { "he" } else { "him" }.to_string();
        }
        "it".to_string()
    }

    /// Believed properties of kind `role` on `n`: (lex, owner) pairs.
    fn believed_props(&self, n: NodeId, role: &str) -> Vec<(String, Option<NodeId>)> {
        let floor = self.wmem.min_blf();
        self.wmem
            .pool()
            .props_of_kind(n, role)
            .filter(|p| p.blf() >= floor && !p.neg())
            .filter(|p| !p.tags().intersects(TagSet(Tag::AComp.bit() | Tag::ASup.bit())))
            .filter_map(|p| {
                p.lex()
                    .filter(|w| !w.is_empty())
                    .map(|w| (w.to_string(), p.arg("wrt")))
            })
            .collect()
    }

    /// Determiner: possessive when the kind is owned, else "the".
    fn determiner(&self, owner: Option<NodeId>) -> String {
        match owner {
            Some(o) if o == self.wmem.robot() => "my ".to_string(),
            Some(o) if o == self.wmem.human() => "your ".to_string(),
            Some(o) => match self.name_ref(o) {
                Some(name) => format!("{} ", self.morph.surf_word(&name, Tag::NPoss)),
                None => "the ".to_string(),
            },
            None => "the ".to_string(),
        }
    }

    // -- uniqueness probe ------------------------------------------------------

    /// Start a fresh description pattern: one anonymous object in the
    /// scratch pool, installed as the main item of `cond`.
    fn reset_cond(&mut self) {
        self.scratch.purge_all();
        self.cond.clear();
        let focus = self.scratch.make_node("obj", None, false, 0.0, false);
        self.cond.add_item(focus);
        self.focus = Some(focus);
    }

    /// Speculatively extend `cond` with one property, count the matches in
    /// working memory, and undo the extension.
    fn probe(&mut self, role: &str, word: &str) -> usize {
        let Some(focus) = self.focus else {
            return 0;
        };
        let Ok(p) = self.scratch.add_prop(focus, role, word, false, 0.0, false) else {
            return 0;
        };
        self.cond.add_item(p);
        let cnt = self.num_match();
        self.cond.pop(1);
        cnt
    }

    /// Permanently keep one property in the description pattern.
    fn commit(&mut self, role: &str, word: &str) {
        let Some(focus) = self.focus else {
            return;
        };
        if let Ok(p) = self.scratch.add_prop(focus, role, word, false, 0.0, false) {
            self.cond.add_item(p);
        }
    }

    /// How many distinct working-memory objects fit the current `cond`.
    fn num_match(&self) -> usize {
        Matcher::new(&self.scratch, self.wmem.pool())
            .floor(self.wmem.min_blf())
            .vis_only(true)
            .count_main(&self.cond, &Bindings::new())
            .unwrap_or(0)
    }
}
