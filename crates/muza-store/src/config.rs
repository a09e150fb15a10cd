use std::fs;
use std::path::Path;

use muza_core::{PERSIST_INTERVAL_MS, PhysicsParams, RetentionPolicy, TICK_INTERVAL_MS};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "muza.toml";

/// Engine settings read from `<data_dir>/muza.toml`.
///
/// Every field is optional in the file:
///
/// ```toml
/// tick_interval_ms = 50
/// persist_interval_ms = 5000
///
/// [physics]
/// repulsion_force = 0.02
///
/// [retention]
/// retention_window_ms = 600000
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    pub persist_interval_ms: u64,
    pub physics: PhysicsParams,
    pub retention: RetentionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            persist_interval_ms: PERSIST_INTERVAL_MS,
            physics: PhysicsParams::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(s)?;
        // Zero intervals would spin the timers.
        config.tick_interval_ms = config.tick_interval_ms.max(1);
        config.persist_interval_ms = config.persist_interval_ms.max(1);
        config.validate()?;
        Ok(config)
    }

    /// Reject physics and retention values the integrator cannot run with.
    fn validate(&self) -> Result<()> {
        let p = &self.physics;
        let non_negative = [
            ("attraction_force", p.attraction_force),
            ("repulsion_force", p.repulsion_force),
            ("type_resonance_bonus", p.type_resonance_bonus),
            ("center_gravity", p.center_gravity),
            ("jitter_amount", p.jitter_amount),
            ("max_velocity", p.max_velocity),
            ("max_distance", p.max_distance),
            ("base_decay", p.base_decay),
            ("distance_epsilon", p.distance_epsilon),
            ("retention.energy_threshold", self.retention.energy_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(StoreError::InvalidData(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if !p.similarity_threshold.is_finite() {
            return Err(StoreError::InvalidData(format!(
                "similarity_threshold must be finite, got {}",
                p.similarity_threshold
            )));
        }
        Ok(())
    }

    /// Read `muza.toml` from `data_dir`. A missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(s) => {
                let config = Self::from_toml_str(&s)?;
                tracing::info!("loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EngineConfig::load(dir.path()).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            "tick_interval_ms = 20\n[physics]\nrepulsion_force = 0.02\n",
        )
        .unwrap();
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.persist_interval_ms, PERSIST_INTERVAL_MS);
        assert_eq!(config.physics.repulsion_force, 0.02);
        assert_eq!(
            config.physics.attraction_force,
            PhysicsParams::default().attraction_force
        );
        assert_eq!(config.retention, RetentionPolicy::default());
    }

    #[test]
    fn test_zero_interval_clamped() {
        let config = EngineConfig::from_toml_str("persist_interval_ms = 0").unwrap();
        assert_eq!(config.persist_interval_ms, 1);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("tick_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_negative_max_velocity_rejected() {
        let err = EngineConfig::from_toml_str("[physics]\nmax_velocity = -1.0\n").unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(ref m) if m.contains("max_velocity")));
    }

    #[test]
    fn test_non_finite_physics_rejected() {
        for toml in [
            "[physics]\nmax_velocity = nan\n",
            "[physics]\nrepulsion_force = inf\n",
            "[physics]\nsimilarity_threshold = nan\n",
            "[retention]\nenergy_threshold = -inf\n",
        ] {
            let err = EngineConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, StoreError::InvalidData(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn test_negative_similarity_threshold_allowed() {
        let config =
            EngineConfig::from_toml_str("[physics]\nsimilarity_threshold = -0.5\n").unwrap();
        assert_eq!(config.physics.similarity_threshold, -0.5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[retention]\nretention_window_ms = 1000\n",
        )
        .unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.retention.retention_window_ms, 1000);
        assert_eq!(config.tick_interval_ms, TICK_INTERVAL_MS);
    }
}
