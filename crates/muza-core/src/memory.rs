use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::generate::generate;
use crate::graph::NodeGraph;
use crate::learn::{LearnReport, learn};
use crate::node::{ContentType, Emotion, Node};
use crate::physics::{PhysicsParams, TickReport, step};
use crate::prune::{RetentionPolicy, prune};
use crate::query::{ScoredNode, cached_response, most_active, semantic_search_scored};
use crate::serde_compat::{export_json, import_json};
use crate::time::now_millis;

/// Aggregate numbers about the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub nodes: usize,
    pub associations: usize,
    pub total_energy: f64,
    pub mean_energy: f64,
}

/// The token graph together with its physics parameters, retention policy
/// and random source. Owns everything a tick, a learn call or a query needs.
///
/// Methods without an `_at` suffix read the wall clock.
#[derive(Clone, Debug)]
pub struct AssociativeMemory {
    graph: NodeGraph,
    params: PhysicsParams,
    retention: RetentionPolicy,
    rng: SmallRng,
}

impl Default for AssociativeMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociativeMemory {
    pub fn new() -> Self {
        Self::from_graph(NodeGraph::new())
    }

    /// Deterministic instance for tests and benchmarks.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            ..Self::new()
        }
    }

    pub fn from_graph(graph: NodeGraph) -> Self {
        Self {
            graph,
            params: PhysicsParams::default(),
            retention: RetentionPolicy::default(),
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_params(mut self, params: PhysicsParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn learn(
        &mut self,
        text: &str,
        adaptive_memory_active: bool,
        content_type: ContentType,
        emotion: Emotion,
    ) -> LearnReport {
        self.learn_at(text, adaptive_memory_active, content_type, emotion, now_millis())
    }

    pub fn learn_at(
        &mut self,
        text: &str,
        adaptive_memory_active: bool,
        content_type: ContentType,
        emotion: Emotion,
        now_ms: u64,
    ) -> LearnReport {
        learn(
            &mut self.graph,
            text,
            adaptive_memory_active,
            content_type,
            emotion,
            now_ms,
            &mut self.rng,
        )
    }

    pub fn tick(&mut self) -> TickReport {
        step(&mut self.graph, &self.params, &mut self.rng)
    }

    pub fn semantic_search(&self, query: &str, top_k: usize) -> Vec<ScoredNode<'_>> {
        semantic_search_scored(&self.graph, query, top_k)
    }

    pub fn cached_response(&mut self, query: &str) -> Option<String> {
        self.cached_response_at(query, now_millis())
    }

    pub fn cached_response_at(&mut self, query: &str, now_ms: u64) -> Option<String> {
        cached_response(&mut self.graph, query, now_ms)
    }

    pub fn generate(&mut self, seed: &str, length: usize) -> Option<String> {
        generate(&self.graph, seed, length, &mut self.rng)
    }

    pub fn most_active(&self, count: usize) -> Vec<&Node> {
        most_active(&self.graph, count)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.iter()
    }

    pub fn prune(&mut self) -> usize {
        self.prune_at(now_millis())
    }

    pub fn prune_at(&mut self, now_ms: u64) -> usize {
        prune(&mut self.graph, &self.retention, now_ms)
    }

    pub fn stats(&self) -> MemoryStats {
        let nodes = self.graph.len();
        let total_energy: f64 = self.graph.iter().map(|n| n.energy).sum();
        MemoryStats {
            nodes,
            associations: self.graph.association_count(),
            total_energy,
            mean_energy: if nodes == 0 {
                0.0
            } else {
                total_energy / nodes as f64
            },
        }
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        export_json(&self.graph)
    }

    /// Replace the graph with a parsed snapshot. On error the graph is untouched.
    pub fn import_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        self.graph = import_json(json)?;
        Ok(self.graph.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty() {
        let mem = AssociativeMemory::with_seed(1);
        assert_eq!(mem.stats(), MemoryStats::default());
    }

    #[test]
    fn test_stats_counts_directed_entries() {
        let mut mem = AssociativeMemory::with_seed(1);
        mem.learn_at("alpha beta gamma", false, ContentType::General, Emotion::Neutral, 0);
        let stats = mem.stats();
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.associations, 4);
        assert!((stats.mean_energy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_import_failure_keeps_graph() {
        let mut mem = AssociativeMemory::with_seed(1);
        mem.learn_at("alpha beta", false, ContentType::General, Emotion::Neutral, 0);
        assert!(mem.import_json("garbage").is_err());
        assert_eq!(mem.graph().len(), 2);
    }

    #[test]
    fn test_export_import_through_facade() {
        let mut mem = AssociativeMemory::with_seed(1);
        mem.learn_at("alpha beta", false, ContentType::Code, Emotion::Excited, 5);
        let json = mem.export_json().unwrap();

        let mut other = AssociativeMemory::with_seed(2);
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.graph().get("alpha").unwrap().association("beta"), 1);
    }

    #[test]
    fn test_seeded_generate_is_reproducible() {
        let build = || {
            let mut mem = AssociativeMemory::with_seed(9);
            mem.learn_at(
                "one two three one three two one",
                false,
                ContentType::General,
                Emotion::Neutral,
                0,
            );
            mem
        };
        assert_eq!(build().generate("one", 8), build().generate("one", 8));
    }
}
