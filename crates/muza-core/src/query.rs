use crate::constants::{CACHE_ENERGY_THRESHOLD, CACHE_SIMILARITY_THRESHOLD};
use crate::embedding::{cosine_similarity, embed};
use crate::graph::NodeGraph;
use crate::node::Node;

/// A node paired with its similarity to a query.
#[derive(Clone, Copy, Debug)]
pub struct ScoredNode<'a> {
    pub node: &'a Node,
    pub similarity: f64,
}

/// Every node ranked by similarity to `query`, best first.
/// No minimum similarity: weak matches are still returned.
pub fn semantic_search_scored<'a>(
    graph: &'a NodeGraph,
    query: &str,
    top_k: usize,
) -> Vec<ScoredNode<'a>> {
    if graph.is_empty() || top_k == 0 {
        return Vec::new();
    }
    let query_embedding = embed(query);

    let mut scored: Vec<ScoredNode<'a>> = graph
        .iter()
        .map(|node| ScoredNode {
            node,
            similarity: cosine_similarity(&query_embedding, &node.embedding),
        })
        .collect();
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(top_k);
    scored
}

/// Top-K nodes most similar to `query`.
pub fn semantic_search<'a>(graph: &'a NodeGraph, query: &str, top_k: usize) -> Vec<&'a Node> {
    semantic_search_scored(graph, query, top_k)
        .into_iter()
        .map(|s| s.node)
        .collect()
}

/// Look for a high-energy node that already answers `query`.
///
/// Candidates need similarity above 0.85 and energy above 2.0; the most
/// similar one wins. This is not a pure read: the winner is brought into
/// focus (full energy, fresh timestamp, snapped to the origin at rest).
pub fn cached_response(graph: &mut NodeGraph, query: &str, now_ms: u64) -> Option<String> {
    if graph.is_empty() {
        return None;
    }
    let query_embedding = embed(query);

    let mut best: Option<(&str, f64)> = None;
    for node in graph.iter() {
        if node.energy <= CACHE_ENERGY_THRESHOLD {
            continue;
        }
        let similarity = cosine_similarity(&query_embedding, &node.embedding);
        if similarity > CACHE_SIMILARITY_THRESHOLD
            && best.is_none_or(|(_, best_sim)| similarity > best_sim)
        {
            best = Some((&node.id, similarity));
        }
    }

    let id = best?.0.to_string();
    if let Some(node) = graph.get_mut(&id) {
        node.focus(now_ms);
    }
    Some(id)
}

/// The `count` most energetic nodes, highest first.
pub fn most_active(graph: &NodeGraph, count: usize) -> Vec<&Node> {
    let mut nodes: Vec<&Node> = graph.iter().collect();
    nodes.sort_by(|a, b| b.energy.total_cmp(&a.energy));
    nodes.truncate(count);
    nodes
}
