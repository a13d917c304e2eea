//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document is enough to
//! override a single setting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::GameError;

/// Default circle radius.
pub const DEFAULT_CIRCLE_RADIUS: f64 = 30.0;

/// Draws per target before a placement is forced.
pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: u32 = 100;

/// Default idle lifetime of an unfinished session (30 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Default time a finished session stays queryable (60 seconds).
pub const DEFAULT_FINISHED_RETENTION: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radius of every target
    pub circle_radius: f64,
    /// Random draws per target before giving up on overlap avoidance
    pub max_placement_attempts: u32,

    // === Fallback canvas ===
    pub default_canvas_width: f64,
    pub default_canvas_height: f64,
    /// Horizontal margin on both sides
    pub side_padding: f64,
    /// Reserved space for the header bar
    pub header_margin: f64,
    /// Reserved space for the footer buttons
    pub footer_margin: f64,

    // === Requests ===
    pub min_targets: u32,
    pub max_targets: u32,
    pub default_player_name: String,
    pub max_name_len: usize,

    // === Retention ===
    pub session_ttl_secs: u64,
    pub finished_retention_secs: u64,
    /// Record a failed result when a player quits mid-game
    pub record_abandoned: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            circle_radius: DEFAULT_CIRCLE_RADIUS,
            max_placement_attempts: DEFAULT_MAX_PLACEMENT_ATTEMPTS,

            default_canvas_width: 800.0,
            default_canvas_height: 600.0,
            side_padding: 40.0,
            header_margin: 100.0,
            footer_margin: 120.0,

            min_targets: 1,
            max_targets: 50,
            default_player_name: "Player".to_string(),
            max_name_len: 32,

            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            finished_retention_secs: DEFAULT_FINISHED_RETENTION.as_secs(),
            record_abandoned: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GameError::invalid(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !self.circle_radius.is_finite() || self.circle_radius <= 0.0 {
            return Err(GameError::invalid("circle_radius must be positive"));
        }
        if self.max_placement_attempts == 0 {
            return Err(GameError::invalid("max_placement_attempts must be at least 1"));
        }
        if self.min_targets == 0 || self.min_targets > self.max_targets {
            return Err(GameError::invalid(format!(
                "target range {}..={} is empty",
                self.min_targets, self.max_targets
            )));
        }
        if self.default_player_name.trim().is_empty() {
            return Err(GameError::invalid("default_player_name must not be blank"));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }

    /// Normalize a requested display name.
    pub fn player_name(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(name) if !name.is_empty() => name.chars().take(self.max_name_len).collect(),
            _ => self.default_player_name.clone(),
        }
    }

    /// Check a requested target count against the allowed range.
    pub fn check_target_count(&self, count: u32) -> Result<(), GameError> {
        if count < self.min_targets || count > self.max_targets {
            return Err(GameError::invalid(format!(
                "numbers_count must be between {} and {}, got {}",
                self.min_targets, self.max_targets, count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), DEFAULT_SESSION_TTL);
        assert!(config.record_abandoned);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"circle_radius": 25.0, "max_targets": 20}"#).unwrap();
        assert_eq!(config.circle_radius, 25.0);
        assert_eq!(config.max_targets, 20);
        assert_eq!(config.side_padding, 40.0); // untouched
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"circle_radius": -1.0}"#),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"min_targets": 10, "max_targets": 5}"#),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_player_name() {
        let config = EngineConfig::default();

        assert_eq!(config.player_name(Some("  Alice ")), "Alice");
        assert_eq!(config.player_name(Some("   ")), "Player");
        assert_eq!(config.player_name(None), "Player");

        let long = "x".repeat(100);
        assert_eq!(config.player_name(Some(&long)).len(), 32);
    }

    #[test]
    fn test_target_count_range() {
        let config = EngineConfig::default();
        assert!(config.check_target_count(10).is_ok());
        assert!(config.check_target_count(0).is_err());
        assert!(config.check_target_count(51).is_err());
    }
}
