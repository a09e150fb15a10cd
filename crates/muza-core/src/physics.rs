//! Fixed-timestep force integration over the token graph.
//!
//! Every node feels a weak pull toward the origin, attraction toward
//! embedding-similar nodes (stronger between nodes of the same content
//! type), inverse-square repulsion from every other node, and a little
//! jitter. Velocity is damped by the node's viscosity and clamped per
//! component; nodes that still escape past `max_distance` are reset to the
//! origin.
//!
//! Nodes are integrated sequentially and in place, so a node sees the
//! already-updated positions of nodes integrated before it in the same tick.
//! Cost is O(n²) per tick; pruning keeps n small.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ATTRACTION_FORCE, BASE_DECAY, CENTER_GRAVITY, DISTANCE_EPSILON, JITTER_AMOUNT, MAX_DISTANCE,
    MAX_VELOCITY, REPULSION_FORCE, SIMILARITY_THRESHOLD, TYPE_RESONANCE_BONUS,
};
use crate::embedding::cosine_similarity;
use crate::graph::NodeGraph;
use crate::node::Node;
use crate::vector::Vec3;

/// Tunable constants of the integrator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub attraction_force: f64,
    pub repulsion_force: f64,
    pub similarity_threshold: f64,
    pub type_resonance_bonus: f64,
    pub center_gravity: f64,
    pub jitter_amount: f64,
    pub max_velocity: f64,
    pub max_distance: f64,
    pub base_decay: f64,
    pub distance_epsilon: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            attraction_force: ATTRACTION_FORCE,
            repulsion_force: REPULSION_FORCE,
            similarity_threshold: SIMILARITY_THRESHOLD,
            type_resonance_bonus: TYPE_RESONANCE_BONUS,
            center_gravity: CENTER_GRAVITY,
            jitter_amount: JITTER_AMOUNT,
            max_velocity: MAX_VELOCITY,
            max_distance: MAX_DISTANCE,
            base_decay: BASE_DECAY,
            distance_epsilon: DISTANCE_EPSILON,
        }
    }
}

/// Summary of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub nodes: usize,
    /// Nodes that escaped and were snapped back to the origin.
    pub resets: usize,
}

/// Advance every node by one step.
pub fn step(graph: &mut NodeGraph, params: &PhysicsParams, rng: &mut impl Rng) -> TickReport {
    let mut nodes: Vec<&mut Node> = graph.iter_mut().collect();
    let mut resets = 0;

    for i in 0..nodes.len() {
        let force = net_force(&nodes, i, params, rng);
        if integrate(&mut *nodes[i], force, params) {
            resets += 1;
        }
    }

    TickReport {
        nodes: nodes.len(),
        resets,
    }
}

/// Total force on node `i` from the center, every other node, and jitter.
fn net_force(nodes: &[&mut Node], i: usize, params: &PhysicsParams, rng: &mut impl Rng) -> Vec3 {
    let a = &*nodes[i];
    let mut force = a.position * -params.center_gravity;

    for (j, b) in nodes.iter().enumerate() {
        if i == j {
            continue;
        }

        let delta = b.position - a.position;
        let distance = delta.magnitude() + params.distance_epsilon;
        let direction = delta * (1.0 / distance);

        let similarity = cosine_similarity(&a.embedding, &b.embedding);
        if similarity > params.similarity_threshold {
            let mut attraction = params.attraction_force * similarity;
            if a.content_type == b.content_type {
                attraction *= params.type_resonance_bonus;
            }
            force += direction * attraction;
        }

        let repulsion = params.repulsion_force / (distance * distance);
        force += direction * -repulsion;
    }

    force + jitter(params.jitter_amount, rng)
}

fn jitter(amount: f64, rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        (rng.random::<f64>() - 0.5) * amount,
        (rng.random::<f64>() - 0.5) * amount,
        (rng.random::<f64>() - 0.5) * amount,
    )
}

/// Apply `force` to one node. Returns true if the node was reset to the origin.
fn integrate(node: &mut Node, force: Vec3, params: &PhysicsParams) -> bool {
    node.velocity = ((node.velocity + force) * node.viscosity).clamp_components(params.max_velocity);
    node.position += node.velocity;
    node.decay(params.base_decay);

    if !node.position.is_finite() || node.position.magnitude() > params.max_distance {
        node.position = Vec3::ZERO;
        node.velocity = Vec3::ZERO;
        return true;
    }
    false
}
