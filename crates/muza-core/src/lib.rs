//! Muza associative memory engine.
//!
//! Words become nodes in a 3-D force field. Each node carries a
//! deterministic 32-dimensional embedding, an energy level that decays
//! with time, and directed co-occurrence counts toward its neighbours in
//! the input. A fixed-timestep integrator pulls similar nodes together and
//! pushes everything apart; queries rank nodes by embedding similarity and
//! random walks over the association graph produce short word sequences.
//!
//! Zero I/O. Persistence and scheduling live in `muza-store` and `muza-cli`.

pub mod constants;
pub mod embedding;
pub mod generate;
pub mod graph;
pub mod learn;
pub mod memory;
pub mod node;
pub mod physics;
pub mod prune;
pub mod query;
pub mod serde_compat;
pub mod time;
pub mod tokenizer;
pub mod vector;

pub use constants::{EMBEDDING_DIM, MAX_ENERGY, PERSIST_INTERVAL_MS, TICK_INTERVAL_MS};
pub use embedding::{Embedding, cosine_similarity, embed, string_hash};
pub use generate::generate;
pub use graph::NodeGraph;
pub use learn::{LearnReport, ProgressionContext, learn};
pub use memory::{AssociativeMemory, MemoryStats};
pub use node::{ContentType, Emotion, Node, PhysicalProps, classify};
pub use physics::{PhysicsParams, TickReport};
pub use prune::{RetentionPolicy, prune};
pub use query::{ScoredNode, cached_response, most_active, semantic_search, semantic_search_scored};
pub use serde_compat::{export_json, import_json};
pub use time::{millis_to_iso8601, now_millis};
pub use tokenizer::tokenize;
pub use vector::Vec3;
