use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{INITIAL_ENERGY, MAX_ENERGY};
use crate::embedding::{Embedding, embed};
use crate::vector::Vec3;

/// Content tag carried from the ingesting caller. Drives a node's mass and viscosity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum ContentType {
    #[default]
    General,
    Musical,
    Code,
    Physics,
    Question,
    Creative,
    Technical,
    Emotional,
    Philosophical,
    Encrypted,
    Collective,
    Image,
    Logic,
}

impl ContentType {
    pub const ALL: [ContentType; 13] = [
        Self::General,
        Self::Musical,
        Self::Code,
        Self::Physics,
        Self::Question,
        Self::Creative,
        Self::Technical,
        Self::Emotional,
        Self::Philosophical,
        Self::Encrypted,
        Self::Collective,
        Self::Image,
        Self::Logic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Musical => "MUSICAL",
            Self::Code => "CODE",
            Self::Physics => "PHYSICS",
            Self::Question => "QUESTION",
            Self::Creative => "CREATIVE",
            Self::Technical => "TECHNICAL",
            Self::Emotional => "EMOTIONAL",
            Self::Philosophical => "PHILOSOPHICAL",
            Self::Encrypted => "ENCRYPTED",
            Self::Collective => "COLLECTIVE",
            Self::Image => "IMAGE",
            Self::Logic => "LOGIC",
        }
    }

    /// Case-insensitive parse; unknown tags fall back to `General`.
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("unknown content type '{s}'"))
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        Self::from_str_lossy(&s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotional tag carried from the ingesting caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Excited,
    Curious,
    Thoughtful,
    Melancholic,
    Inspired,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Self::Neutral,
        Self::Happy,
        Self::Excited,
        Self::Curious,
        Self::Thoughtful,
        Self::Melancholic,
        Self::Inspired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Happy => "HAPPY",
            Self::Excited => "EXCITED",
            Self::Curious => "CURIOUS",
            Self::Thoughtful => "THOUGHTFUL",
            Self::Melancholic => "MELANCHOLIC",
            Self::Inspired => "INSPIRED",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == upper)
            .ok_or_else(|| format!("unknown emotion '{s}'"))
    }
}

impl From<String> for Emotion {
    fn from(s: String) -> Self {
        Self::from_str_lossy(&s)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical constants derived from a node's content type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalProps {
    pub mass: f64,
    /// Per-tick velocity damping factor, applied multiplicatively.
    pub viscosity: f64,
}

/// Total lookup from content type to physical properties.
pub fn classify(content_type: ContentType) -> PhysicalProps {
    let (mass, viscosity) = match content_type {
        // heavy, stable
        ContentType::Logic | ContentType::Technical | ContentType::Code => (2.0, 0.95),
        // light, fluid
        ContentType::Creative | ContentType::Image | ContentType::Musical => (0.8, 0.90),
        ContentType::Emotional => (0.5, 0.88),
        // anchored
        ContentType::Philosophical | ContentType::Question => (5.0, 0.98),
        ContentType::General
        | ContentType::Physics
        | ContentType::Encrypted
        | ContentType::Collective => (1.0, 0.92),
    };
    PhysicalProps { mass, viscosity }
}

/// One learned token: embedding, simulation state, energy and associations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default = "zero_embedding")]
    pub embedding: Embedding,
    #[serde(rename = "vector", default)]
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    pub energy: f64,
    #[serde(with = "crate::serde_compat::association_pairs", default)]
    pub associations: BTreeMap<String, u32>,
    /// Unix millis of the last reinforcement, resonance or cache hit.
    #[serde(rename = "lastAccess", default)]
    pub last_access: u64,
    #[serde(rename = "type", default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub emotion: Emotion,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_viscosity")]
    pub viscosity: f64,
}

fn zero_embedding() -> Embedding {
    [0.0; crate::constants::EMBEDDING_DIM]
}

fn default_mass() -> f64 {
    classify(ContentType::General).mass
}

fn default_viscosity() -> f64 {
    classify(ContentType::General).viscosity
}

impl Node {
    pub fn new(
        id: &str,
        position: Vec3,
        content_type: ContentType,
        emotion: Emotion,
        now_ms: u64,
    ) -> Self {
        let props = classify(content_type);
        Self {
            id: id.to_string(),
            embedding: embed(id),
            position,
            velocity: Vec3::ZERO,
            energy: INITIAL_ENERGY,
            associations: BTreeMap::new(),
            last_access: now_ms,
            content_type,
            emotion,
            mass: props.mass,
            viscosity: props.viscosity,
        }
    }

    /// Add energy, capped at MAX_ENERGY.
    pub fn boost(&mut self, amount: f64) {
        self.energy = (self.energy + amount).clamp(0.0, MAX_ENERGY);
    }

    /// Remove energy, floored at zero.
    pub fn decay(&mut self, amount: f64) {
        self.energy = (self.energy - amount).clamp(0.0, MAX_ENERGY);
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_access = now_ms;
    }

    /// Increment the directed association weight toward `other`.
    pub fn associate(&mut self, other: &str) {
        *self.associations.entry(other.to_string()).or_insert(0) += 1;
    }

    pub fn association(&self, other: &str) -> u32 {
        self.associations.get(other).copied().unwrap_or(0)
    }

    /// Snap to the origin at full energy. Marks the node as in focus.
    pub fn focus(&mut self, now_ms: u64) {
        self.energy = MAX_ENERGY;
        self.last_access = now_ms;
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
    }

    /// Recompute fields that are pure functions of id and type.
    /// Used after loading records written by older or foreign writers.
    pub fn refresh_derived(&mut self) {
        self.embedding = embed(&self.id);
        if !self.energy.is_finite() {
            self.energy = 0.0;
        }
        self.energy = self.energy.clamp(0.0, MAX_ENERGY);
        if !self.position.is_finite() || !self.velocity.is_finite() {
            self.position = Vec3::ZERO;
            self.velocity = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str) -> Node {
        Node::new(id, Vec3::ZERO, ContentType::General, Emotion::Neutral, 0)
    }

    #[test]
    fn test_classify_table() {
        let cases = [
            (ContentType::Logic, 2.0, 0.95),
            (ContentType::Technical, 2.0, 0.95),
            (ContentType::Code, 2.0, 0.95),
            (ContentType::Creative, 0.8, 0.90),
            (ContentType::Image, 0.8, 0.90),
            (ContentType::Musical, 0.8, 0.90),
            (ContentType::Emotional, 0.5, 0.88),
            (ContentType::Philosophical, 5.0, 0.98),
            (ContentType::Question, 5.0, 0.98),
            (ContentType::General, 1.0, 0.92),
            (ContentType::Encrypted, 1.0, 0.92),
        ];
        for (t, mass, viscosity) in cases {
            let p = classify(t);
            assert_eq!(p.mass, mass, "mass for {t}");
            assert_eq!(p.viscosity, viscosity, "viscosity for {t}");
        }
    }

    #[test]
    fn test_classify_is_total() {
        for t in ContentType::ALL {
            let p = classify(t);
            assert!(p.mass > 0.0);
            assert!(p.viscosity > 0.0 && p.viscosity < 1.0);
        }
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("code".parse::<ContentType>(), Ok(ContentType::Code));
        assert_eq!(" Philosophical ".parse::<ContentType>(), Ok(ContentType::Philosophical));
        assert!("nonsense".parse::<ContentType>().is_err());
        assert_eq!(ContentType::from_str_lossy("nonsense"), ContentType::General);
        assert_eq!(Emotion::from_str_lossy("curious"), Emotion::Curious);
        assert_eq!(Emotion::from_str_lossy(""), Emotion::Neutral);
    }

    #[test]
    fn test_type_serde_tags() {
        let json = serde_json::to_string(&ContentType::Philosophical).unwrap();
        assert_eq!(json, "\"PHILOSOPHICAL\"");
        let t: ContentType = serde_json::from_str("\"UNHEARD_OF\"").unwrap();
        assert_eq!(t, ContentType::General);
        let e: Emotion = serde_json::from_str("\"INSPIRED\"").unwrap();
        assert_eq!(e, Emotion::Inspired);
    }

    #[test]
    fn test_new_node_defaults() {
        let n = Node::new("quartz", Vec3::new(0.5, 0.0, -0.5), ContentType::Code, Emotion::Happy, 7);
        assert_eq!(n.energy, INITIAL_ENERGY);
        assert_eq!(n.velocity, Vec3::ZERO);
        assert_eq!(n.mass, 2.0);
        assert_eq!(n.viscosity, 0.95);
        assert_eq!(n.last_access, 7);
        assert!(n.associations.is_empty());
    }

    #[test]
    fn test_boost_clamps_at_max() {
        let mut n = make_node("bright");
        for _ in 0..20 {
            n.boost(0.7);
        }
        assert_eq!(n.energy, MAX_ENERGY);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let mut n = make_node("dim");
        n.decay(5.0);
        assert_eq!(n.energy, 0.0);
    }

    #[test]
    fn test_focus() {
        let mut n = make_node("lens");
        n.position = Vec3::new(3.0, 3.0, 3.0);
        n.velocity = Vec3::new(0.1, 0.1, 0.1);
        n.focus(99);
        assert_eq!(n.position, Vec3::ZERO);
        assert_eq!(n.velocity, Vec3::ZERO);
        assert_eq!(n.energy, MAX_ENERGY);
        assert_eq!(n.last_access, 99);
    }

    #[test]
    fn test_refresh_derived_repairs_record() {
        let mut n = make_node("repair");
        n.embedding = [0.0; crate::constants::EMBEDDING_DIM];
        n.energy = 17.0;
        n.position = Vec3::new(f64::NAN, 0.0, 0.0);
        n.refresh_derived();
        assert_eq!(n.embedding, embed("repair"));
        assert_eq!(n.energy, MAX_ENERGY);
        assert_eq!(n.position, Vec3::ZERO);
    }
}
