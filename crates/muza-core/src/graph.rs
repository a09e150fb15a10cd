use std::collections::BTreeMap;

use crate::node::Node;

/// Token → node store. Ordered by token so iteration, ticks and snapshots
/// are reproducible.
///
/// Single-owner by contract: mutation happens only from the ingest, tick,
/// query and prune paths of whoever owns the graph.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: BTreeMap<String, Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<&Node> {
        self.nodes.get(token)
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut Node> {
        self.nodes.get_mut(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.nodes.contains_key(token)
    }

    /// Insert `create()` if the token is unseen, otherwise run `update` on the
    /// existing node. Returns true when a node was created.
    pub fn upsert(
        &mut self,
        token: &str,
        create: impl FnOnce() -> Node,
        update: impl FnOnce(&mut Node),
    ) -> bool {
        match self.nodes.get_mut(token) {
            Some(node) => {
                update(node);
                false
            }
            None => {
                self.nodes.insert(token.to_string(), create());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Keep only nodes matching `keep`. Returns the number removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Node) -> bool) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| keep(node));
        before - self.nodes.len()
    }

    /// Total number of directed association entries.
    pub fn association_count(&self) -> usize {
        self.nodes.values().map(|n| n.associations.len()).sum()
    }
}

impl FromIterator<Node> for NodeGraph {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }
}
