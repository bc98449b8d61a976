//! Engine configuration.

use serde::Deserialize;

/// How the engine treats query nodes it cannot use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Drop the node, log it at debug level, and answer the rest of the query.
    #[default]
    Permissive,
    /// Reject the whole query with the first problem found.
    Strict,
}

impl ResolutionMode {
    pub fn is_strict(self) -> bool {
        matches!(self, ResolutionMode::Strict)
    }
}

/// Settings for a [`QueryEngine`](crate::QueryEngine).
///
/// ```
/// use tabquery::{EngineConfig, ResolutionMode};
///
/// let config: EngineConfig = serde_json::from_str(r#"{ "mode": "strict" }"#).unwrap();
/// assert_eq!(config.mode, ResolutionMode::Strict);
///
/// let config: EngineConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.mode, ResolutionMode::Permissive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: ResolutionMode,
}

impl EngineConfig {
    pub fn strict() -> Self {
        EngineConfig {
            mode: ResolutionMode::Strict,
        }
    }
}
