use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{NODE_ACTIVATION_BOOST, REPEAT_BOOST, RESONANCE_THRESHOLD};
use crate::embedding::{cosine_similarity, embed};
use crate::graph::NodeGraph;
use crate::node::{ContentType, Emotion, Node};
use crate::tokenizer::tokenize;
use crate::vector::Vec3;

/// Name of the progression unlock that switches on adaptive memory.
pub const ADAPTIVE_MEMORY_UNLOCK: &str = "adaptive_memory";

/// Logic skill level at which adaptive memory switches on without the unlock.
pub const ADAPTIVE_MEMORY_LOGIC_LEVEL: u32 = 3;

/// Caller-side progression state. The engine only ever sees the boolean
/// produced by [`ProgressionContext::adaptive_memory_active`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionContext {
    pub unlocked_nodes: Vec<String>,
    pub logic_skill: u32,
}

impl ProgressionContext {
    pub fn adaptive_memory_active(&self) -> bool {
        self.unlocked_nodes.iter().any(|n| n == ADAPTIVE_MEMORY_UNLOCK)
            || self.logic_skill >= ADAPTIVE_MEMORY_LOGIC_LEVEL
    }
}

/// What a single `learn` call did to the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LearnReport {
    pub tokens: usize,
    pub created: usize,
    pub reinforced: usize,
    /// Existing nodes boosted by whole-input resonance.
    pub resonated: usize,
    /// Adjacent pairs linked (each pair updates two directed entries).
    pub links: usize,
}

/// Ingest text into the graph.
///
/// With `adaptive_memory_active`, every existing node whose embedding is
/// close to the embedding of the whole input is boosted first, even when the
/// literal word never appears. Then each token is created or reinforced and
/// adjacent tokens are linked in both directions. Both passes apply in the
/// same call, so a token that resonates and also appears gets both boosts.
pub fn learn(
    graph: &mut NodeGraph,
    text: &str,
    adaptive_memory_active: bool,
    content_type: ContentType,
    emotion: Emotion,
    now_ms: u64,
    rng: &mut impl Rng,
) -> LearnReport {
    let mut report = LearnReport::default();
    if text.trim().is_empty() {
        return report;
    }

    if adaptive_memory_active {
        report.resonated = resonate(graph, text, now_ms);
    }

    let tokens = tokenize(text);
    report.tokens = tokens.len();

    let mut last: Option<&str> = None;
    for token in &tokens {
        let created = graph.upsert(
            token,
            || {
                let position = Vec3::random_in_cube(1.0, rng);
                Node::new(token, position, content_type, emotion, now_ms)
            },
            |node| {
                node.boost(REPEAT_BOOST);
                node.touch(now_ms);
                node.content_type = content_type;
                node.emotion = emotion;
            },
        );
        if created {
            report.created += 1;
        } else {
            report.reinforced += 1;
        }

        if let Some(prev) = last {
            link(graph, prev, token);
            report.links += 1;
        }
        last = Some(token);
    }

    report
}

/// Boost every node that resonates with the whole input. Returns the count.
fn resonate(graph: &mut NodeGraph, text: &str, now_ms: u64) -> usize {
    let input = embed(text);
    let mut resonated = 0;
    for node in graph.iter_mut() {
        if cosine_similarity(&input, &node.embedding) > RESONANCE_THRESHOLD {
            node.boost(NODE_ACTIVATION_BOOST);
            node.touch(now_ms);
            resonated += 1;
        }
    }
    resonated
}

/// Increment both directed association entries between two tokens.
fn link(graph: &mut NodeGraph, prev: &str, current: &str) {
    if let Some(node) = graph.get_mut(current) {
        node.associate(prev);
    }
    if let Some(node) = graph.get_mut(prev) {
        node.associate(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INITIAL_ENERGY, MAX_ENERGY};
    use crate::node::classify;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn learn_plain(graph: &mut NodeGraph, text: &str, rng: &mut SmallRng) -> LearnReport {
        learn(graph, text, false, ContentType::General, Emotion::Neutral, 1_000, rng)
    }

    #[test]
    fn test_empty_text_is_noop() {
        let mut g = NodeGraph::new();
        let report = learn(&mut g, "", true, ContentType::General, Emotion::Neutral, 0, &mut rng());
        assert_eq!(report, LearnReport::default());
        assert!(g.is_empty());
    }

    #[test]
    fn test_single_token_no_associations() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn_plain(&mut g, "solitude", &mut rng);
        let n = g.get("solitude").unwrap();
        assert!(n.associations.is_empty());
        assert_eq!(n.energy, INITIAL_ENERGY);
    }

    #[test]
    fn test_new_node_position_in_unit_cube() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn_plain(&mut g, "alpha bravo charlie delta echo foxtrot", &mut rng);
        for n in g.iter() {
            assert!(n.position.x.abs() <= 1.0);
            assert!(n.position.y.abs() <= 1.0);
            assert!(n.position.z.abs() <= 1.0);
            assert_eq!(n.velocity, Vec3::ZERO);
        }
    }

    #[test]
    fn test_association_symmetry() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn_plain(&mut g, "river stone", &mut rng);
        learn_plain(&mut g, "river stone", &mut rng);
        assert_eq!(g.get("river").unwrap().association("stone"), 2);
        assert_eq!(g.get("stone").unwrap().association("river"), 2);
    }

    #[test]
    fn test_repeat_reinforces_and_overwrites_tags() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn(&mut g, "melody", false, ContentType::Musical, Emotion::Happy, 10, &mut rng);
        learn(&mut g, "melody", false, ContentType::Code, Emotion::Curious, 20, &mut rng);

        let n = g.get("melody").unwrap();
        assert_relative_eq!(n.energy, INITIAL_ENERGY + REPEAT_BOOST);
        assert_eq!(n.content_type, ContentType::Code);
        assert_eq!(n.emotion, Emotion::Curious);
        assert_eq!(n.last_access, 20);
        // physical constants stay those of the creating ingestion
        assert_eq!(n.mass, classify(ContentType::Musical).mass);
    }

    #[test]
    fn test_energy_monotone_until_cap() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        let mut previous = 0.0;
        for _ in 0..20 {
            learn_plain(&mut g, "pulse", &mut rng);
            let e = g.get("pulse").unwrap().energy;
            assert!(e >= previous, "energy dropped: {previous} -> {e}");
            assert!(e <= MAX_ENERGY);
            previous = e;
        }
        assert_eq!(previous, MAX_ENERGY);
    }

    #[test]
    fn test_adjacent_repeat_self_association() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        let report = learn_plain(&mut g, "echo echo", &mut rng);
        assert_eq!(report.links, 1);
        // both directions of the pair land on the same entry
        assert_eq!(g.get("echo").unwrap().association("echo"), 2);
    }

    #[test]
    fn test_short_tokens_break_nothing() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        let report = learn_plain(&mut g, "go to it", &mut rng);
        assert_eq!(report.tokens, 0);
        assert!(g.is_empty());
    }

    #[test]
    fn test_resonance_boosts_similar_nodes() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn_plain(&mut g, "harmonic", &mut rng);

        // Identical raw text embeds identically, so "harmonic" resonates.
        let report = learn(&mut g, "harmonic", true, ContentType::General, Emotion::Neutral, 5_000, &mut rng);
        assert_eq!(report.resonated, 1);
        let n = g.get("harmonic").unwrap();
        assert_relative_eq!(n.energy, INITIAL_ENERGY + NODE_ACTIVATION_BOOST + REPEAT_BOOST);
        assert_eq!(n.last_access, 5_000);
    }

    #[test]
    fn test_resonance_inactive_without_flag() {
        let mut rng = rng();
        let mut g = NodeGraph::new();
        learn_plain(&mut g, "harmonic", &mut rng);
        let report = learn_plain(&mut g, "harmonic", &mut rng);
        assert_eq!(report.resonated, 0);
        assert_relative_eq!(g.get("harmonic").unwrap().energy, INITIAL_ENERGY + REPEAT_BOOST);
    }

    #[test]
    fn test_progression_context() {
        assert!(!ProgressionContext::default().adaptive_memory_active());
        let unlocked = ProgressionContext {
            unlocked_nodes: vec!["adaptive_memory".into()],
            logic_skill: 0,
        };
        assert!(unlocked.adaptive_memory_active());
        let skilled = ProgressionContext {
            unlocked_nodes: vec![],
            logic_skill: 3,
        };
        assert!(skilled.adaptive_memory_active());
    }
}
