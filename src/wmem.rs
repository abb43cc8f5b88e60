//! Working-memory facade.
//!
//! The surface generator does not talk to a bare pool: it needs to know who
//! the conversation participants are (the robot's self node and the human's
//! node), how believed a fact must be before it is worth mentioning, and
//! which nodes are currently in view. [`WorkingMemory`] is that seam;
//! [`BasicWorkingMemory`] is the standalone implementation used by tests and
//! simple hosts.

use crate::node::NodeId;
use crate::pool::NodePool;

/// What the generator requires from its host memory.
pub trait WorkingMemory {
    /// The underlying pool of facts.
    fn pool(&self) -> &NodePool;

    /// Mutable access, used only for recency stamping during generation.
    fn pool_mut(&mut self) -> &mut NodePool;

    /// The robot's own node ("I" / "me").
    fn robot(&self) -> NodeId;

    /// The user's node ("you").
    fn human(&self) -> NodeId;

    /// Minimum asserted belief for a fact to count.
    fn min_blf(&self) -> f64 {
        0.5
    }

    /// Whether a node is currently in view. `ghost` widens the check to
    /// nodes that are believed but not visible.
    fn vis_mem(&self, n: NodeId, ghost: bool) -> bool {
        self.pool()
            .get(n)
            .is_some_and(|node| (ghost || node.visible()) && node.blf() >= self.min_blf())
    }
}

/// A self-contained working memory: one hashed pool seeded with the two
/// conversation participants.
pub struct BasicWorkingMemory {
    pool: NodePool,
    robot: NodeId,
    human: NodeId,
    min_blf: f64,
}

impl BasicWorkingMemory {
    pub fn new() -> Self {
        let mut pool = NodePool::new();
        pool.make_bins().expect("bins precede nodes in a fresh pool");
        let robot = pool.make_node("obj", None, false, -1.0, false);
        let human = pool.make_node("obj", None, false, -1.0, false);
        tracing::debug!(robot = %robot, human = %human, "working memory seeded");
        Self {
            pool,
            robot,
            human,
            min_blf: 0.5,
        }
    }

    /// Override the belief floor.
    pub fn set_min_blf(&mut self, floor: f64) {
        self.min_blf = floor.clamp(0.0, 1.0);
    }
}

impl Default for BasicWorkingMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingMemory for BasicWorkingMemory {
    fn pool(&self) -> &NodePool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut NodePool {
        &mut self.pool
    }

    fn robot(&self) -> NodeId {
        self.robot
    }

    fn human(&self) -> NodeId {
        self.human
    }

    fn min_blf(&self) -> f64 {
        self.min_blf
    }
}
