use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for SQAD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SqadConfig {
    #[serde(default)]
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default = "default_specialists")]
    pub specialists: Vec<SpecialistConfig>,
}

/// Circuit breaker thresholds for one named dependency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive matching failures before the circuit opens.
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a recovery probe is allowed.
    pub recovery_timeout_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout_seconds: 30,
        }
    }
}

/// Breaker configuration: one default plus per-dependency overrides keyed by
/// dependency name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResilienceConfig {
    #[serde(default)]
    pub default_breaker: BreakerConfig,
    #[serde(default)]
    pub overrides: HashMap<String, BreakerConfig>,
}

impl ResilienceConfig {
    pub fn breaker_for(&self, dependency: &str) -> BreakerConfig {
        self.overrides
            .get(dependency)
            .copied()
            .unwrap_or(self.default_breaker)
    }
}

/// Exponential-backoff retry settings for transient failures.
///
/// Delays are deterministic: `initial_delay_ms * backoff_factor^attempt`,
/// capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum retries. Total attempts = `retries + 1`.
    pub retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

/// Configuration for the tier-2 instrument lookup subprocess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    pub search_command: String,
    #[serde(default)]
    pub search_args: Vec<String>,
    pub search_timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_command: "instrument-search".to_string(),
            search_args: Vec::new(),
            search_timeout_seconds: 10,
        }
    }
}

/// Dispatcher-level settings applied to every specialist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Per-specialist invocation timeout in seconds.
    pub specialist_timeout_seconds: u64,
    /// Retry policy for specialists without an explicit override.
    #[serde(default)]
    pub default_retry: RetryConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            specialist_timeout_seconds: 15,
            default_retry: RetryConfig::default(),
        }
    }
}

/// Configuration for a single specialist provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialistConfig {
    pub name: String,
    /// External system this specialist talks to; the circuit breaker key.
    pub dependency: String,
    /// Subprocess invoked with the JSON context as its final argument.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Override retry policy. Falls back to `DispatchConfig::default_retry`.
    pub retry: Option<RetryConfig>,
}

fn default_enabled() -> bool {
    true
}

fn specialist(name: &str, dependency: &str) -> SpecialistConfig {
    SpecialistConfig {
        name: name.to_string(),
        dependency: dependency.to_string(),
        command: format!("sqad-{name}"),
        args: Vec::new(),
        enabled: true,
        retry: None,
    }
}

fn default_specialists() -> Vec<SpecialistConfig> {
    vec![
        specialist("technical", "market-data"),
        specialist("price_history", "market-data"),
        specialist("news", "news-feed"),
        specialist("forecast", "forecast-engine"),
        specialist("social", "social-feed"),
        specialist("flow", "flow-feed"),
    ]
}

impl SqadConfig {
    pub fn with_default_specialists() -> Self {
        Self {
            specialists: default_specialists(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_six_specialists() {
        let config = SqadConfig::with_default_specialists();
        assert_eq!(config.specialists.len(), 6);
        assert!(config.specialists.iter().all(|s| s.enabled));
    }

    #[test]
    fn breaker_override_wins() {
        let mut resilience = ResilienceConfig::default();
        resilience.overrides.insert(
            "news-feed".to_string(),
            BreakerConfig {
                failure_threshold: 5,
                recovery_timeout_seconds: 60,
            },
        );

        assert_eq!(resilience.breaker_for("news-feed").failure_threshold, 5);
        assert_eq!(resilience.breaker_for("market-data").failure_threshold, 3);
    }

    #[test]
    fn roundtrip_config_json() {
        let config = SqadConfig::with_default_specialists();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SqadConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[resilience.default_breaker]
failure_threshold = 4
recovery_timeout_seconds = 20

[resilience.overrides.forecast-engine]
failure_threshold = 2
recovery_timeout_seconds = 90

[resolver]
search_command = "t212-search"
search_timeout_seconds = 5

[dispatch]
specialist_timeout_seconds = 10

[dispatch.default_retry]
retries = 1
initial_delay_ms = 250
backoff_factor = 2.0
max_delay_ms = 2000

[[specialists]]
name = "technical"
dependency = "market-data"
command = "sqad-technical"

[[specialists]]
name = "news"
dependency = "news-feed"
command = "sqad-news"
enabled = false
"#;

        let config: SqadConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resilience.default_breaker.failure_threshold, 4);
        assert_eq!(
            config.resilience.breaker_for("forecast-engine").recovery_timeout_seconds,
            90
        );
        assert_eq!(config.resolver.search_command, "t212-search");
        assert_eq!(config.dispatch.default_retry.retries, 1);
        assert_eq!(config.specialists.len(), 2);
        assert!(!config.specialists[1].enabled);
    }
}
