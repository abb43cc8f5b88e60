//! Plain-text serialization of node pools.
//!
//! The format is human-readable, one relation per line. A node's record
//! starts with its nickname and continues with indented links:
//!
//! ```text
//! obj-1  -lex-  dog
//!        -blf-  1.000
//!
//! ako-2  -lex-  animal
//!        -ako-> obj-1
//!        -blf-  1.000
//! ```
//!
//! Argument links use `-slot->` arrows; the pseudo-slots `-lex-`, `-str-`,
//! `-tag-`, `-neg-`, `-ach-`, `-blf-`, and `-ext-` carry node content. A
//! parenthesized reference `(kind-n)` resolves without joining the current
//! accumulator or graphlet, and a trailing `]` closes a graphlet block.
//!
//! [`NodePool::save`] orders records by ascending instance number so output
//! is stable across runs; [`NodePool::save_bin`] instead preserves the
//! recency order within each bin, so reloading into a reverse-filing pool
//! reproduces matcher order. Loading keeps the ids written in the file
//! whenever they are free, falling back to fresh ids (via the translation
//! table) only on collision.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::CodecError;
use crate::graphlet::Graphlet;
use crate::node::{Node, NodeId};
use crate::tags::TagSet;

use super::NodePool;

impl NodePool {
    // -- saving ---------------------------------------------------------------

    /// Write the pool to a file, ordered by ascending instance number.
    ///
    /// Nodes with a committed belief below `lvl` are skipped, as are
    /// hypothetical nodes unless `hyp` is set. Returns the record count.
    pub fn save(&self, path: &Path, lvl: f64, hyp: bool) -> Result<usize, CodecError> {
        let mut w = BufWriter::new(File::create(path)?);
        let n = self.save_to(&mut w, lvl, hyp)?;
        w.flush()?;
        tracing::info!(path = %path.display(), records = n, "pool saved");
        Ok(n)
    }

    /// [`save`](Self::save) into any writer.
    pub fn save_to<W: Write>(&self, w: &mut W, lvl: f64, hyp: bool) -> Result<usize, CodecError> {
        let mut count = 0;
        for id in self.iter_ids_sorted() {
            let node = self.get(id).expect("sorted ids come from this pool");
            if node.dflt() < lvl || (!hyp && node.hyp()) {
                continue;
            }
            self.write_record(w, node)?;
            count += 1;
        }
        Ok(count)
    }

    /// Write one bin (or all bins with `bin < 0`) preserving recency order.
    ///
    /// Only nodes with instance number `>= imin` are written. Reload into a
    /// pool configured with `rev` filing to reproduce per-bin order.
    pub fn save_bin(&self, path: &Path, bin: isize, imin: u64) -> Result<usize, CodecError> {
        let mut w = BufWriter::new(File::create(path)?);
        let n = self.save_bin_to(&mut w, bin, imin)?;
        w.flush()?;
        tracing::info!(path = %path.display(), records = n, "pool bins saved");
        Ok(n)
    }

    /// [`save_bin`](Self::save_bin) into any writer.
    pub fn save_bin_to<W: Write>(
        &self,
        w: &mut W,
        bin: isize,
        imin: u64,
    ) -> Result<usize, CodecError> {
        let range: Vec<usize> = if bin >= 0 {
            vec![bin as usize]
        } else {
            (0..self.num_bins()).collect()
        };
        let mut count = 0;
        for b in range {
            let ids: Vec<NodeId> = self
                .bins
                .get(b)
                .ok_or(crate::error::PoolError::BadBin {
                    bin: b,
                    bins: self.bins.len(),
                })?
                .iter()
                .copied()
                .collect();
            for id in ids {
                let node = self.get(id).expect("bin entries come from this pool");
                if node.id().inst() < imin {
                    continue;
                }
                self.write_record(w, node)?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn write_record<W: Write>(&self, w: &mut W, node: &Node) -> Result<(), CodecError> {
        let nick = node.nick();
        let pad = " ".repeat(nick.len());
        let mut first = true;
        let mut line = |w: &mut W, text: String| -> io::Result<()> {
            if first {
                first = false;
                writeln!(w, "{nick} {text}")
            } else {
                writeln!(w, "{pad} {text}")
            }
        };

        if let Some(lex) = node.lex() {
            line(w, format!("-lex-  {lex}"))?;
        }
        if let Some(text) = node.literal() {
            line(w, format!("-str-  {text}"))?;
        }
        if !node.tags().is_empty() {
            line(w, format!("-tag-  {}", node.tags().names()))?;
        }
        for (slot, target) in node.args() {
            let target_nick = self
                .get(*target)
                .map(Node::nick)
                .unwrap_or_else(|| format!("{target}"));
            line(w, format!("-{slot}-> {target_nick}"))?;
        }
        if node.neg() {
            line(w, "-neg-  1".to_string())?;
        }
        if node.done() {
            line(w, "-ach-  1".to_string())?;
        }
        line(w, format!("-blf-  {:.3}", node.dflt()))?;
        if node.blf() == 0.0 && node.dflt() > 0.0 {
            line(w, "-ext-  1".to_string())?;
        }
        writeln!(w)?;
        Ok(())
    }

    // -- loading --------------------------------------------------------------

    /// Incrementally build or extend the pool from a file.
    ///
    /// Unless `add` is set the pool is purged first; `nt` starts a fresh
    /// translation table. Forward references create placeholder nodes that
    /// later records fill in. Returns the number of nodes created; on a
    /// malformed line the error reports the line number and every node built
    /// from earlier lines remains.
    pub fn load(&mut self, path: &Path, add: bool, nt: bool) -> Result<usize, CodecError> {
        let r = BufReader::new(File::open(path)?);
        let n = self.load_from(r, add, nt)?;
        tracing::info!(path = %path.display(), nodes = n, "pool loaded");
        Ok(n)
    }

    /// [`load`](Self::load) from any buffered reader.
    pub fn load_from<R: BufRead>(&mut self, r: R, add: bool, nt: bool) -> Result<usize, CodecError> {
        if !add {
            self.purge_all();
        }
        if nt {
            self.xlate.clear();
        }
        let mut loader = Loader::new(self, None, true);
        for (idx, line) in r.lines().enumerate() {
            loader.line(idx + 1, &line?)?;
        }
        Ok(loader.created)
    }

    /// Read one graphlet block into `g`, stopping at a trailing `]` or EOF.
    ///
    /// With `tru` set, loaded nodes are actualized (belief copied from the
    /// committed value); otherwise they stay unasserted, as befits a pattern.
    /// Returns the number of nodes created.
    pub fn load_graph<R: BufRead>(
        &mut self,
        g: &mut Graphlet,
        r: &mut R,
        tru: bool,
    ) -> Result<usize, CodecError> {
        let mut loader = Loader::new(self, Some(g), tru);
        let mut buf = String::new();
        let mut idx = 0;
        loop {
            buf.clear();
            if r.read_line(&mut buf)? == 0 {
                break;
            }
            idx += 1;
            if loader.line(idx, &buf)? {
                break;
            }
        }
        Ok(loader.created)
    }
}

/// Line-by-line record builder shared by `load` and `load_graph`.
struct Loader<'a> {
    pool: &'a mut NodePool,
    g: Option<&'a mut Graphlet>,
    /// Actualize loaded beliefs (copy committed value into asserted).
    tru: bool,
    cur: Option<NodeId>,
    created: usize,
}

impl<'a> Loader<'a> {
    fn new(pool: &'a mut NodePool, g: Option<&'a mut Graphlet>, tru: bool) -> Self {
        Self {
            pool,
            g,
            tru,
            cur: None,
            created: 0,
        }
    }

    /// Consume one line. Returns true when a `]` terminator was seen.
    fn line(&mut self, no: usize, raw: &str) -> Result<bool, CodecError> {
        let mut text = raw.trim_end();
        let mut closed = false;
        if let Some(stripped) = text.strip_suffix(']') {
            closed = true;
            text = stripped.trim_end();
        }
        if text.trim().is_empty() {
            self.cur = None;
            return Ok(closed);
        }

        let mut pos = 0usize;
        if !text.starts_with(|c: char| c.is_whitespace()) {
            let tok = next_tok(text, &mut pos).expect("non-empty line");
            self.cur = Some(self.resolve_ref(tok, no)?);
        }
        let cur = self.cur.ok_or_else(|| CodecError::Parse {
            line: no,
            text: text.trim().to_string(),
        })?;

        while let Some(tok) = next_tok(text, &mut pos) {
            match tok {
                "-lex-" => {
                    let word = text[pos..].trim();
                    if !word.is_empty() {
                        self.pool.set_lex(cur, word)?;
                    }
                    break;
                }
                "-str-" => {
                    let lit = text[pos..].trim();
                    self.pool.set_str(cur, lit)?;
                    break;
                }
                "-tag-" => {
                    let tags = TagSet::parse_names(&text[pos..]);
                    self.pool.add_tags(cur, tags)?;
                    break;
                }
                "-neg-" => {
                    let v = self.num_tok(text, &mut pos, no)?;
                    self.pool.set_neg(cur, v != 0.0)?;
                }
                "-ach-" => {
                    let v = self.num_tok(text, &mut pos, no)?;
                    self.pool.set_done(cur, v != 0.0)?;
                }
                "-blf-" => {
                    let v = self.num_tok(text, &mut pos, no)?;
                    let actual = self.tru;
                    if let Some(node) = self.pool.get_mut(cur) {
                        node.dflt = v.clamp(0.0, 1.0);
                        node.blf = if actual { node.dflt } else { 0.0 };
                    }
                }
                "-ext-" => {
                    let v = self.num_tok(text, &mut pos, no)?;
                    if v != 0.0 {
                        if let Some(node) = self.pool.get_mut(cur) {
                            node.blf = 0.0;
                        }
                    }
                }
                arrow if arrow.starts_with('-') && arrow.ends_with("->") && arrow.len() > 3 => {
                    let slot = &arrow[1..arrow.len() - 2];
                    let target_tok =
                        next_tok(text, &mut pos).ok_or_else(|| CodecError::Parse {
                            line: no,
                            text: text.trim().to_string(),
                        })?;
                    let target = self.resolve_ref(target_tok, no)?;
                    self.pool.add_arg(cur, slot, target)?;
                }
                _ => {
                    return Err(CodecError::Parse {
                        line: no,
                        text: text.trim().to_string(),
                    });
                }
            }
        }
        Ok(closed)
    }

    fn num_tok(&mut self, text: &str, pos: &mut usize, no: usize) -> Result<f64, CodecError> {
        next_tok(text, pos)
            .and_then(|t| t.parse::<f64>().ok())
            .ok_or_else(|| CodecError::Parse {
                line: no,
                text: text.trim().to_string(),
            })
    }

    /// Resolve a textual reference, creating a placeholder on first mention.
    ///
    /// The id written in the file is kept when free; otherwise a fresh id is
    /// allocated and the translation table carries the alias for the rest of
    /// the load. Parenthesized references stay out of the accumulator and
    /// the target graphlet.
    fn resolve_ref(&mut self, tok: &str, no: usize) -> Result<NodeId, CodecError> {
        let (name, quiet) = match tok.strip_prefix('(') {
            Some(inner) => (
                inner.strip_suffix(')').ok_or_else(|| CodecError::BadRef {
                    line: no,
                    text: tok.to_string(),
                })?,
                true,
            ),
            None => (tok, false),
        };
        let id = match self.pool.xlate.get(name) {
            Some(&id) => id,
            None => {
                let (kind, want) = self.pool.parse_nick(name).ok_or_else(|| CodecError::BadRef {
                    line: no,
                    text: tok.to_string(),
                })?;
                let id = if self.pool.in_list(want) {
                    // Taken (possibly by another kind): allocate fresh.
                    tracing::warn!(nick = name, "reference id in use, translating");
                    self.pool.make_node(&kind, None, false, 1.0, false)
                } else {
                    self.pool.insert_raw(want, &kind, false, 1.0, false);
                    self.pool.label = self.pool.label.max(want.inst());
                    want
                };
                self.created += 1;
                if quiet {
                    self.pool.acc_rem(id);
                }
                self.pool.xlate.insert(name.to_string(), id);
                id
            }
        };
        if !quiet {
            if let Some(g) = self.g.as_deref_mut() {
                g.add_item(id);
            }
        }
        Ok(id)
    }
}

fn next_tok<'s>(line: &'s str, pos: &mut usize) -> Option<&'s str> {
    let bytes = line.as_bytes();
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if *pos >= bytes.len() {
        return None;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    Some(&line[start..*pos])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;

    fn sample_pool() -> NodePool {
        let mut pool = NodePool::new();
        let obj = pool.make_node("obj", None, false, -1.0, false);
        let dog = pool.add_prop(obj, "ako", "dog", false, 1.0, true).unwrap();
        pool.actualize(dog).unwrap();
        let red = pool.add_prop(obj, "hq", "red", false, 0.8, true).unwrap();
        pool.actualize(red).unwrap();
        pool
    }

    fn dump(pool: &NodePool) -> String {
        let mut buf = Vec::new();
        pool.save_to(&mut buf, 0.0, true).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn save_emits_expected_shape() {
        let text = dump(&sample_pool());
        assert!(text.contains("obj-1 -blf-  1.000"));
        assert!(text.contains("ako-2 -lex-  dog"));
        assert!(text.contains("-ako-> obj-1"));
        assert!(text.contains("hq-3 -lex-  red"));
        assert!(text.contains("-blf-  0.800"));
    }

    #[test]
    fn round_trip_text_is_stable() {
        let pool = sample_pool();
        let first = dump(&pool);
        let mut reloaded = NodePool::new();
        reloaded
            .load_from(io::Cursor::new(first.clone()), false, true)
            .unwrap();
        assert_eq!(dump(&reloaded), first);
    }

    #[test]
    fn round_trip_restores_content() {
        let mut pool = sample_pool();
        let s = pool.find_node("obj-1", false, false).unwrap();
        pool.set_str(s, "weird word").unwrap();
        pool.add_tags(s, TagSet::parse_names("nsing def")).unwrap();
        let text = dump(&pool);

        let mut reloaded = NodePool::new();
        reloaded
            .load_from(io::Cursor::new(text), false, true)
            .unwrap();
        let obj = reloaded.find_node("obj-1", false, false).unwrap();
        let node = reloaded.get(obj).unwrap();
        assert_eq!(node.literal(), Some("weird word"));
        assert!(node.tags().has(crate::tags::Tag::NSing));
        let kinds: Vec<_> = reloaded
            .props_of(obj)
            .map(|p| p.kind().to_string())
            .collect();
        assert!(kinds.contains(&"ako".to_string()));
        assert!(kinds.contains(&"hq".to_string()));
    }

    #[test]
    fn round_trip_preserves_sparse_ids() {
        let mut pool = sample_pool();
        let red = pool.find_node("hq-3", false, false).unwrap();
        let obj = pool.find_node("obj-1", false, false).unwrap();
        // Delete the middle node so ids have a gap; the arg edge dangles and
        // is the caller's problem, so drop it first.
        let dog = pool.find_node("ako-2", false, false).unwrap();
        pool.rem_arg(dog, "ako", obj).unwrap();
        pool.rem_node(dog).unwrap();
        let _ = red;

        let first = dump(&pool);
        assert!(first.contains("hq-3"));
        let mut reloaded = NodePool::new();
        reloaded
            .load_from(io::Cursor::new(first.clone()), false, true)
            .unwrap();
        assert_eq!(dump(&reloaded), first);
    }

    #[test]
    fn ext_marks_unasserted_belief() {
        let mut pool = NodePool::new();
        let obj = pool.make_node("obj", None, false, 1.0, false); // blf stays 0
        let _ = obj;
        let text = dump(&pool);
        assert!(text.contains("-ext-  1"));

        let mut reloaded = NodePool::new();
        reloaded
            .load_from(io::Cursor::new(text), false, true)
            .unwrap();
        let n = reloaded.find_node("obj-1", false, false).unwrap();
        assert_eq!(reloaded.get(n).unwrap().blf(), 0.0);
        assert_eq!(reloaded.get(n).unwrap().dflt(), 1.0);
    }

    #[test]
    fn parse_error_reports_line_number() {
        let text = "obj-1 -blf-  1.000\n\nwhat even is this\n";
        let mut pool = NodePool::new();
        let err = pool.load_from(io::Cursor::new(text), false, true);
        match err {
            Err(CodecError::BadRef { line, .. }) | Err(CodecError::Parse { line, .. }) => {
                assert_eq!(line, 3);
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
        // Nodes from earlier lines remain.
        assert!(pool.find_node("obj-1", false, false).is_some());
    }

    #[test]
    fn hypotheticals_skipped_unless_requested() {
        let mut pool = NodePool::new();
        pool.make_node("obj", None, false, 0.0, false);
        pool.make_node("obj", None, false, -1.0, false);
        let mut buf = Vec::new();
        assert_eq!(pool.save_to(&mut buf, 0.0, false).unwrap(), 1);
        let mut buf = Vec::new();
        assert_eq!(pool.save_to(&mut buf, 0.0, true).unwrap(), 2);
        // lvl filters on committed belief.
        let mut buf = Vec::new();
        assert_eq!(pool.save_to(&mut buf, 0.5, true).unwrap(), 1);
    }

    #[test]
    fn save_bin_round_trip_keeps_recency_order() {
        let mut pool = NodePool::new();
        pool.make_bins().unwrap();
        let a = pool.make_node("ako", Some("ant"), false, -1.0, false);
        let b = pool.make_node("ako", Some("any"), false, -1.0, false);
        pool.refresh(a); // a now ahead of b in their shared bin

        let mut buf = Vec::new();
        pool.save_bin_to(&mut buf, -1, 0).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut rev = NodePool::with_config(PoolConfig {
            rev: true,
            ..PoolConfig::default()
        });
        rev.make_bins().unwrap();
        rev.load_from(io::Cursor::new(text.clone()), true, true)
            .unwrap();
        let mut buf = Vec::new();
        rev.save_bin_to(&mut buf, -1, 0).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), text);
        let _ = b;
    }

    #[test]
    fn forward_references_become_placeholders() {
        let text = "act-1 -obj-> obj-2\n      -lex-  grab\n      -blf-  1.000\n\nobj-2 -blf-  1.000\n";
        let mut pool = NodePool::new();
        let n = pool.load_from(io::Cursor::new(text), false, true).unwrap();
        assert_eq!(n, 2);
        let act = pool.find_node("act-1", false, false).unwrap();
        let obj = pool.find_node("obj-2", false, false).unwrap();
        assert_eq!(pool.get(act).unwrap().arg("obj"), Some(obj));
        assert_eq!(pool.get(act).unwrap().lex(), Some("grab"));
    }

    #[test]
    fn load_graph_stops_at_bracket_and_fills_graphlet() {
        let text = "obj-1 -blf-  1.000\n\nhq-2 -lex-  red\n      -hq-> obj-1\n      -blf-  1.000 ]\nobj-9 -blf-  1.000\n";
        let mut pool = NodePool::new();
        let mut g = Graphlet::new();
        let mut r = io::Cursor::new(text);
        pool.load_graph(&mut g, &mut r, true).unwrap();
        assert_eq!(g.num_items(), 2);
        // The record after the bracket is untouched.
        assert!(pool.find_node("obj-9", false, false).is_none());
        assert_eq!(g.main(), pool.find_node("obj-1", false, false));
    }

    #[test]
    fn parenthesized_refs_stay_out_of_graphlet() {
        let text = "hq-2 -lex-  red\n     -hq-> (obj-1)\n     -blf-  1.000 ]\n";
        let mut pool = NodePool::new();
        let mut g = Graphlet::new();
        let mut r = io::Cursor::new(text);
        pool.load_graph(&mut g, &mut r, true).unwrap();
        assert_eq!(g.num_items(), 1);
        let obj = pool.find_node("obj-1", false, false).unwrap();
        assert!(!g.in_list(obj));
        assert!(pool.in_list(obj));
    }

    #[test]
    fn load_graph_without_tru_leaves_patterns_unasserted() {
        let text = "hq-2 -lex-  red\n     -blf-  0.900 ]\n";
        let mut pool = NodePool::new();
        let mut g = Graphlet::new();
        let mut r = io::Cursor::new(text);
        pool.load_graph(&mut g, &mut r, false).unwrap();
        let n = g.main().unwrap();
        assert_eq!(pool.get(n).unwrap().dflt(), 0.9);
        assert_eq!(pool.get(n).unwrap().blf(), 0.0);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.sn");
        let pool = sample_pool();
        pool.save(&path, 0.0, true).unwrap();

        let mut reloaded = NodePool::new();
        reloaded.load(&path, false, true).unwrap();
        assert_eq!(dump(&reloaded), dump(&pool));
    }
}
