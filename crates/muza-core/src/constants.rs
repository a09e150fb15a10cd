/// Embedding dimensionality.
pub const EMBEDDING_DIM: usize = 32;

/// Phase step between embedding components: component i = sin(hash + i * STEP).
pub const EMBEDDING_PHASE_STEP: f64 = 1.1;

/// Upper bound on node energy.
pub const MAX_ENERGY: f64 = 4.0;

/// Energy of a freshly created node.
pub const INITIAL_ENERGY: f64 = 1.0;

/// Energy added when a known token is seen again.
pub const REPEAT_BOOST: f64 = 0.4;

/// Energy added to a node that resonates with a whole input (adaptive memory).
pub const NODE_ACTIVATION_BOOST: f64 = 0.7;

/// Similarity a node needs against the whole input to resonate.
pub const RESONANCE_THRESHOLD: f64 = 0.8;

/// Cached response: minimum similarity to the query.
pub const CACHE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Cached response: minimum energy of a candidate node.
pub const CACHE_ENERGY_THRESHOLD: f64 = 2.0;

/// Tokens of this many UTF-16 code units or fewer are dropped at ingestion.
pub const MIN_TOKEN_CHARS: usize = 2;

// --- Physics ---

pub const ATTRACTION_FORCE: f64 = 0.002;
pub const REPULSION_FORCE: f64 = 0.015;
pub const SIMILARITY_THRESHOLD: f64 = 0.75;
pub const TYPE_RESONANCE_BONUS: f64 = 1.5;
pub const CENTER_GRAVITY: f64 = 0.0008;
pub const JITTER_AMOUNT: f64 = 0.005;
pub const MAX_VELOCITY: f64 = 0.3;

/// Nodes farther than this from the origin are reset to it.
pub const MAX_DISTANCE: f64 = 25.0;

/// Energy lost per tick.
pub const BASE_DECAY: f64 = 0.0005;

/// Added to pairwise distances so coincident nodes never divide by zero.
pub const DISTANCE_EPSILON: f64 = 0.001;

// --- Pruning ---

/// Nodes at or below this energy are prune candidates.
pub const PRUNING_THRESHOLD: f64 = 0.1;

/// Nodes touched within this window (ms) survive pruning regardless of energy.
pub const ACTIVE_NODE_RETENTION_MS: u64 = 300_000;

/// Physics tick interval (ms).
pub const TICK_INTERVAL_MS: u64 = 50;

/// Prune + persist interval (ms).
pub const PERSIST_INTERVAL_MS: u64 = 5_000;
