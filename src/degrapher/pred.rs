//! Predicate phrases: verb frames, copulas, and conjunctions.
//!
//! Invoked from [`Degrapher::node_ref`] for nodes that are not plain
//! objects: events ("I am grabbing the cup"), properties ("the block is
//! red"), class statements ("the dog is an animal"), and conjoined answers
//! ("yellow, white, and black").

use crate::morpho::{article, join_list, Morphology};
use crate::node::NodeId;
use crate::tags::Tag;
use crate::wmem::WorkingMemory;

use super::Degrapher;

impl<'w, W: WorkingMemory, M: Morphology> Degrapher<'w, W, M> {
    /// Full predication for `n`. With `inf` set, render the infinitive
    /// ("to grab the cup") for nesting under another verb.
    pub(crate) fn pred_ref(&mut self, n: NodeId, inf: bool) -> Option<String> {
        let node = self.wmem.pool().get(n)?;
        let lex = node.lex().map(str::to_string);
        let done = node.done();
        let args: Vec<(String, NodeId)> = node.args().to_vec();
        let conjuncts: Vec<NodeId> = node.args_named("conj").collect();

        // A conjunction node is pure list punctuation over its members.
        if !conjuncts.is_empty() {
            let pool = self.wmem.pool();
            let words: Vec<String> = conjuncts
                .iter()
                .filter_map(|&c| pool.get(c).and_then(|cn| cn.lex().map(str::to_string)))
                .collect();
            self.wmem.pool_mut().mark_convo(n);
            return Some(join_list(&words));
        }

        let has = |slot: &str| args.iter().any(|(s, _)| s == slot);
        let head = if inf {
            format!("to {}", lex?)
        } else if has("obj") || has("agt") || has("how") || done {
            self.agt_verb(n)?
        } else if has("hq") || has("ako") || has("loc") {
            self.copula(n)?
        } else {
            lex.unwrap_or_else(|| "it".to_string())
        };
        let full = self.complements(&args, head)?;
        self.wmem.pool_mut().mark_convo(n);
        Some(full)
    }

    /// Tensed verb with its agent: "I am grabbing", "Dave grabbed",
    /// "the dog is not eating".
    fn agt_verb(&mut self, n: NodeId) -> Option<String> {
        let node = self.wmem.pool().get(n)?;
        let lex = node.lex()?.to_string();
        let neg = node.neg();
        let done = node.done();
        let agent = node.arg("agt");
        let me = agent == Some(self.wmem.robot());

        if me {
            return Some(match (neg, done) {
                (true, true) => format!("I couldn't {lex}"),
                (true, false) => {
                    if lex == "know" {
                        "I do not know".to_string()
                    } else {
                        format!("I don't {lex}")
                    }
                }
                (false, true) => format!("I {}", self.morph.surf_word(&lex, Tag::VPast)),
                (false, false) => {
                    if lex == "know" {
                        "I know".to_string()
                    } else {
                        format!("I am {}", self.morph.surf_word(&lex, Tag::VProg))
                    }
                }
            });
        }

        let subj = match agent {
            Some(a) => self.node_ref(a, true, None)?,
            None => "it".to_string(),
        };
        Some(match (neg, done) {
            (true, false) => format!("{subj} is not {}", self.morph.surf_word(&lex, Tag::VProg)),
            (true, true) => format!("{subj} did not {lex}"),
            (false, false) => format!("{subj} is {}", self.morph.surf_word(&lex, Tag::VProg)),
            (false, true) => format!("{subj} {}", self.morph.surf_word(&lex, Tag::VPast)),
        })
    }

    /// "<subject> is [not] [<deg>] [a ]<lex>"; the indefinite article
    /// appears for class membership (`ako`).
    fn copula(&mut self, n: NodeId) -> Option<String> {
        let node = self.wmem.pool().get(n)?;
        let kind = node.kind().to_string();
        let lex = node.lex()?.to_string();
        let neg = node.neg();
        let target = node.arg(&kind)?;
        let deg = self
            .wmem
            .pool()
            .props_of_kind(n, "deg")
            .find_map(|d| d.lex().map(str::to_string));

        let subj = self.node_ref(target, true, Some(&lex))?;
        let mut out = format!("{subj} is ");
        if neg {
            out.push_str("not ");
        }
        if let Some(d) = deg {
            out.push_str(&d);
            out.push(' ');
        }
        if kind == "ako" {
            out.push_str(article(&lex, false));
            out.push(' ');
        }
        out.push_str(&lex);
        Some(out)
    }

    /// Render the complements after the verb/copula head: a nested "how"
    /// infinitive, then an indirect object (`ref`, or an object-valued
    /// `dest`), then the direct object, a locational `dest` ("to X"), or a
    /// second reference joined with "and" ("between X and Y").
    fn complements(&mut self, args: &[(String, NodeId)], mut out: String) -> Option<String> {
        let find = |slot: &str| args.iter().find(|(s, _)| s == slot).map(|(_, t)| *t);
        let refs: Vec<NodeId> = args
            .iter()
            .filter(|(s, _)| s == "ref")
            .map(|(_, t)| *t)
            .collect();
        let obj = find("obj");
        let dest = find("dest");
        let ref2 = find("ref2");

        if let Some(how) = find("how") {
            let nested = self.pred_ref(how, true)?;
            out.push_str(" how ");
            out.push_str(&nested);
        }

        let dest_is_obj = dest
            .is_some_and(|d| self.wmem.pool().get(d).is_some_and(|x| x.obj()));
        let first;
        let indirect;
        if let Some(&r) = refs.first() {
            first = Some(r);
            indirect = true;
        } else if dest_is_obj && obj.is_some() {
            first = dest;
            indirect = true;
        } else {
            first = obj;
            indirect = false;
        }
        if let Some(f) = first {
            let txt = self.node_ref(f, false, None)?;
            out.push(' ');
            out.push_str(&txt);
        }

        if indirect {
            if obj.is_some() && first != obj {
                let txt = self.node_ref(obj?, false, None)?;
                out.push(' ');
                out.push_str(&txt);
            } else if let Some(&r) = refs.get(1) {
                let txt = self.node_ref(r, false, None)?;
                out.push_str(" and ");
                out.push_str(&txt);
            } else if let Some(r2) = ref2 {
                let txt = self.node_ref(r2, false, None)?;
                out.push_str(" and ");
                out.push_str(&txt);
            }
        } else if let Some(d) = dest {
            if first != dest {
                let txt = self.node_ref(d, false, None)?;
                out.push_str(" to ");
                out.push_str(&txt);
            }
        }
        Some(out)
    }
}
