use rand::Rng;

use crate::graph::NodeGraph;

/// How many of the strongest associations a walk step chooses between.
pub const WALK_BRANCHING: usize = 3;

/// Random walk over the association graph starting at `seed`.
///
/// Each step picks uniformly among the current node's three strongest
/// associations (ties broken by token order). The walk stops after `length`
/// steps, at a node with no associations, or at an association whose target
/// is no longer in the graph. Returns `None` when the seed is unknown.
pub fn generate(
    graph: &NodeGraph,
    seed: &str,
    length: usize,
    rng: &mut impl Rng,
) -> Option<String> {
    let mut current = graph.get(&seed.to_lowercase())?;
    let mut words = vec![current.id.as_str()];

    for _ in 0..length {
        if current.associations.is_empty() {
            break;
        }
        let mut candidates: Vec<(&String, &u32)> = current.associations.iter().collect();
        candidates.sort_by(|a, b| b.1.cmp(a.1));
        let pick = rng.random_range(0..candidates.len().min(WALK_BRANCHING));

        match graph.get(candidates[pick].0) {
            Some(next) => {
                words.push(next.id.as_str());
                current = next;
            }
            None => break,
        }
    }

    Some(words.join(" "))
}
