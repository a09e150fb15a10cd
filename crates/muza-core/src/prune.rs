use serde::{Deserialize, Serialize};

use crate::constants::{ACTIVE_NODE_RETENTION_MS, PRUNING_THRESHOLD};
use crate::graph::NodeGraph;
use crate::node::Node;

/// Retention rules applied at snapshot time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Nodes with energy above this are kept.
    pub energy_threshold: f64,
    /// Nodes touched within this many milliseconds are kept.
    pub retention_window_ms: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            energy_threshold: PRUNING_THRESHOLD,
            retention_window_ms: ACTIVE_NODE_RETENTION_MS,
        }
    }
}

impl RetentionPolicy {
    /// A node survives if it is energetic, recently touched, or linked to anything.
    pub fn retains(&self, node: &Node, now_ms: u64) -> bool {
        node.energy > self.energy_threshold
            || now_ms.saturating_sub(node.last_access) < self.retention_window_ms
            || !node.associations.is_empty()
    }
}

/// Drop every node the policy does not retain. Returns the number removed.
pub fn prune(graph: &mut NodeGraph, policy: &RetentionPolicy, now_ms: u64) -> usize {
    graph.retain(|node| policy.retains(node, now_ms))
}
