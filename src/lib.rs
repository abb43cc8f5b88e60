//! # semnet
//!
//! The semantic memory core of a conversational robot: an in-memory graph
//! of predicate/argument nodes plus the surface generator that turns a
//! sub-graph back into an English phrase.
//!
//! ## Architecture
//!
//! - **Node pool** (`pool`): hashed-bin node storage with pattern assertion,
//!   change tracking, and a plain-text codec
//! - **Nodes and graphlets** (`node`, `graphlet`): the atomic entities and
//!   the ordered windows that delimit patterns and descriptions
//! - **Matcher** (`matcher`): backtracking subgraph unification with a
//!   recency bias
//! - **Degrapher** (`degrapher`): referring expressions and predicate
//!   phrases, disambiguated by uniqueness queries against working memory
//! - **Morphology** (`morpho`): rule-based English inflection
//!
//! ## Library usage
//!
//! ```
//! use semnet::degrapher::Degrapher;
//! use semnet::wmem::{BasicWorkingMemory, WorkingMemory};
//!
//! let mut wm = BasicWorkingMemory::new();
//! let block = wm.pool_mut().make_node("obj", None, false, -1.0, false);
//! wm.pool_mut().add_prop(block, "ako", "block", false, -1.0, true).unwrap();
//!
//! let mut gen = Degrapher::new(&mut wm);
//! assert_eq!(gen.node_ref(block, true, None), Some("the block".to_string()));
//! ```

pub mod degrapher;
pub mod error;
pub mod graphlet;
pub mod matcher;
pub mod morpho;
pub mod node;
pub mod pool;
pub mod tags;
pub mod wmem;
