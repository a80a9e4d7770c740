//! Agent configuration.

use std::env;

/// Answer returned when a turn cannot produce a model answer.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm sorry, I couldn't produce an answer right now. Please try asking again.";

/// Configuration for [`Agent`](crate::Agent) and [`ChatService`](crate::ChatService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Number of prior conversation messages sent with each turn.
    pub history_window: usize,

    /// Content returned when the model yields no usable answer.
    pub fallback_message: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl AgentConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `AGENT_HISTORY_WINDOW` - Prior messages per turn (default: 10)
    /// - `AGENT_FALLBACK_MESSAGE` - Fallback answer text
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let history_window = env::var("AGENT_HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_window);

        let fallback_message = env::var("AGENT_FALLBACK_MESSAGE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.fallback_message);

        Self {
            history_window,
            fallback_message,
        }
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let config = AgentConfig::default();
        assert_eq!(config.history_window, 10);
        assert!(!config.fallback_message.is_empty());

        let config = config.with_history_window(4).with_fallback_message("try later");
        assert_eq!(config.history_window, 4);
        assert_eq!(config.fallback_message, "try later");
    }

    // Single test so parallel tests never observe each other's env vars.
    #[test]
    fn test_from_env_scenarios() {
        fn clear() {
            std::env::remove_var("AGENT_HISTORY_WINDOW");
            std::env::remove_var("AGENT_FALLBACK_MESSAGE");
        }

        clear();
        assert_eq!(AgentConfig::from_env(), AgentConfig::default());

        std::env::set_var("AGENT_HISTORY_WINDOW", "20");
        std::env::set_var("AGENT_FALLBACK_MESSAGE", "Please retry.");
        let config = AgentConfig::from_env();
        assert_eq!(config.history_window, 20);
        assert_eq!(config.fallback_message, "Please retry.");

        std::env::set_var("AGENT_HISTORY_WINDOW", "lots");
        std::env::set_var("AGENT_FALLBACK_MESSAGE", "  ");
        assert_eq!(AgentConfig::from_env(), AgentConfig::default());

        clear();
    }
}
