//! ECS configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::EcsError;

/// Sizing hints for a new [`Ecs`](crate::Ecs).
///
/// Every field is optional in the JSON form:
///
/// ```json
/// { "initial_entity_capacity": 4096, "initial_component_capacity": 32 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Entity slots to reserve up front.
    pub initial_entity_capacity: usize,
    /// Component types to reserve reverse-index slots for.
    pub initial_component_capacity: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 1024,
            initial_component_capacity: 16,
        }
    }
}

impl EcsConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, EcsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EcsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Override the entity capacity.
    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.initial_entity_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EcsConfig::from_json_str(r#"{ "initial_entity_capacity": 8 }"#).unwrap();
        assert_eq!(config.initial_entity_capacity, 8);
        assert_eq!(
            config.initial_component_capacity,
            EcsConfig::default().initial_component_capacity
        );
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EcsConfig::from_json_str("{}").unwrap(), EcsConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let err = EcsConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, EcsError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EcsConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, EcsError::Io(_)));
    }
}
