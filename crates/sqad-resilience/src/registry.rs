use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};

/// Explicit registry of named circuit breakers, one per external dependency.
///
/// Breakers are created lazily and live for the manager's lifetime; all
/// concurrent queries touching the same dependency share the same breaker.
/// The manager is injected (`Arc`) wherever external calls are issued, so
/// there is no ambient global state.
#[derive(Debug)]
pub struct ResilienceManager {
    default_config: CircuitBreakerConfig,
    overrides: HashMap<String, CircuitBreakerConfig>,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl Default for ResilienceManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default(), HashMap::new())
    }
}

impl ResilienceManager {
    pub fn new(
        default_config: CircuitBreakerConfig,
        overrides: HashMap<String, CircuitBreakerConfig>,
    ) -> Self {
        Self {
            default_config,
            overrides,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the breaker for a dependency name.
    pub fn breaker(&self, dependency: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().expect("registry lock is not poisoned");
        if let Some(existing) = breakers.get(dependency) {
            return Arc::clone(existing);
        }

        let config = self
            .overrides
            .get(dependency)
            .copied()
            .unwrap_or(self.default_config);
        debug!(
            dependency,
            threshold = config.failure_threshold,
            "registering circuit breaker"
        );
        let breaker = Arc::new(CircuitBreaker::new(dependency, config));
        breakers.insert(dependency.to_string(), Arc::clone(&breaker));
        breaker
    }

    pub fn registered(&self) -> Vec<String> {
        let breakers = self.breakers.lock().expect("registry lock is not poisoned");
        let mut names: Vec<String> = breakers.keys().cloned().collect();
        names.sort();
        names
    }
}
