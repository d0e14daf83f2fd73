//! Engine configuration.

/// Engine configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ENGINE_ATOMIC`: commit every raise immediately (default: `true`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// `true` stores each raised batch as its own envelope; `false` queues
    /// events until an explicit commit.
    pub atomic: bool,
}

impl EngineConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            atomic: std::env::var("ENGINE_ATOMIC")
                .ok()
                .and_then(|value| parse_flag(&value))
                .unwrap_or(true),
        }
    }

    /// Configuration that queues events until an explicit commit.
    pub fn batched() -> Self {
        Self { atomic: false }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { atomic: true }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert!(config.atomic);
        assert!(!EngineConfig::batched().atomic);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag(" OFF "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
