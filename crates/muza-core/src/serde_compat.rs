//! JSON snapshot format.
//!
//! A snapshot is an array of `[token, record]` pairs. Inside each record the
//! association map is written as an array of `[token, weight]` pairs rather
//! than a JSON object. Older writers stored a bare array of records keyed by
//! their `id` field; both shapes are accepted on import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::NodeGraph;
use crate::node::Node;

/// Serde adapter: `BTreeMap<String, u32>` ⇄ `[[token, weight], ...]`.
pub mod association_pairs {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, u32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, u32>, D::Error> {
        let pairs = Vec::<(String, u32)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Pair(String, Node),
    Record(Node),
}

/// Serialize the graph as `[[token, record], ...]`.
pub fn export_json(graph: &NodeGraph) -> Result<String, serde_json::Error> {
    let entries: Vec<(&str, &Node)> = graph.iter().map(|n| (n.id.as_str(), n)).collect();
    serde_json::to_string(&entries)
}

/// Parse a snapshot in either the pair or the bare-record layout.
///
/// Embeddings are recomputed from each token and out-of-range state is
/// repaired, so a snapshot never introduces non-unit embeddings or energy
/// outside [0, MAX_ENERGY].
pub fn import_json(json: &str) -> Result<NodeGraph, serde_json::Error> {
    let entries: Vec<WireEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|entry| {
            let mut node = match entry {
                WireEntry::Pair(token, mut node) => {
                    node.id = token;
                    node
                }
                WireEntry::Record(node) => node,
            };
            node.refresh_derived();
            node
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_ENERGY;
    use crate::embedding::{embed, l2_norm};
    use crate::node::{ContentType, Emotion};
    use crate::vector::Vec3;

    fn make_graph() -> NodeGraph {
        let mut a = Node::new("quick", Vec3::new(0.1, 0.2, 0.3), ContentType::Code, Emotion::Happy, 123);
        let mut b = Node::new("brown", Vec3::new(-0.1, 0.0, 0.5), ContentType::General, Emotion::Neutral, 456);
        a.associate("brown");
        b.associate("quick");
        [a, b].into_iter().collect()
    }

    #[test]
    fn test_layout_is_pairs_with_pair_associations() {
        let json = export_json(&make_graph()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value[0];
        assert_eq!(first[0], "brown");
        assert_eq!(first[1]["id"], "brown");
        assert_eq!(first[1]["associations"], serde_json::json!([["quick", 1]]));
        assert_eq!(first[1]["lastAccess"], 456);
        assert_eq!(first[1]["type"], "GENERAL");
        assert!(first[1]["vector"]["z"].is_number());
    }

    #[test]
    fn test_roundtrip_preserves_state() {
        let g = make_graph();
        let g2 = import_json(&export_json(&g).unwrap()).unwrap();

        assert_eq!(g2.len(), 2);
        let quick = g2.get("quick").unwrap();
        assert_eq!(quick.association("brown"), 1);
        assert_eq!(quick.content_type, ContentType::Code);
        assert_eq!(quick.emotion, Emotion::Happy);
        assert!((quick.position - Vec3::new(0.1, 0.2, 0.3)).magnitude() < 1e-12);
        assert_eq!(quick.last_access, 123);
        assert_eq!(quick.mass, 2.0);
    }

    #[test]
    fn test_bare_record_layout_accepted() {
        let json = r#"[
            {"id": "legacy", "energy": 1.5, "associations": [["other", 3]],
             "vector": {"x": 1.0, "y": 0.0, "z": 0.0},
             "lastAccess": 99, "type": "QUESTION", "emotion": "CURIOUS",
             "mass": 5.0, "viscosity": 0.98}
        ]"#;
        let g = import_json(json).unwrap();
        let n = g.get("legacy").unwrap();
        assert_eq!(n.association("other"), 3);
        assert_eq!(n.content_type, ContentType::Question);
        assert_eq!(n.embedding, embed("legacy"));
    }

    #[test]
    fn test_minimal_record_gets_defaults() {
        let json = r#"[["sparse", {"id": "sparse", "energy": 9.0}]]"#;
        let g = import_json(json).unwrap();
        let n = g.get("sparse").unwrap();
        assert_eq!(n.energy, MAX_ENERGY);
        assert!((l2_norm(&n.embedding) - 1.0).abs() < 1e-9);
        assert!(n.associations.is_empty());
        assert_eq!(n.viscosity, 0.92);
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(import_json("{not json").is_err());
        assert!(import_json(r#"{"nodes": {}}"#).is_err());
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(import_json("[]").unwrap().is_empty());
    }
}
