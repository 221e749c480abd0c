//! SQAD - Specialist Query Aggregation Dispatcher
//!
//! A fault-tolerant orchestrator for financial queries: one query fans out
//! to domain specialists (technical, news, forecast, ...) behind circuit
//! breakers, bounded retries, and self-healing ticker resolution, then
//! aggregates whatever survives.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use sqad::models::{QueryRequest, QueryContext, SqadConfig};
//! use sqad::agents::{Dispatcher, RuleIntentClassifier, IntentClassifier};
//! use tokio_util::sync::CancellationToken;
//! ```

pub use sqad_agents as agents;
pub use sqad_models as models;
pub use sqad_resilience as resilience;
pub use sqad_resolve as resolve;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use sqad_agents::{CommandSpecialist, Dispatcher, DispatchError, Specialist, SpecialistExecutor};
use sqad_models::{BreakerConfig, QueryContext, QueryRequest, RetryConfig, SqadConfig};
use sqad_resilience::{CircuitBreakerConfig, ResilienceManager, RetryPolicy};
use sqad_resolve::{CommandInstrumentSearch, TickerResolver};
use tokio_util::sync::CancellationToken;

fn breaker_config(config: BreakerConfig) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: config.failure_threshold,
        recovery_timeout: Duration::from_secs(config.recovery_timeout_seconds),
    }
}

fn retry_policy(config: RetryConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.retries,
        Duration::from_millis(config.initial_delay_ms),
        config.backoff_factor,
        Duration::from_millis(config.max_delay_ms),
    )
}

/// Build a Dispatcher from configuration.
pub fn build_dispatcher(config: &SqadConfig) -> Result<Dispatcher, anyhow::Error> {
    let overrides: HashMap<String, CircuitBreakerConfig> = config
        .resilience
        .overrides
        .iter()
        .map(|(name, cfg)| (name.clone(), breaker_config(*cfg)))
        .collect();
    let resilience = Arc::new(ResilienceManager::new(
        breaker_config(config.resilience.default_breaker),
        overrides,
    ));

    let search = Arc::new(CommandInstrumentSearch::new(
        config.resolver.search_command.clone(),
        config.resolver.search_args.clone(),
        Duration::from_secs(config.resolver.search_timeout_seconds),
    ));
    let resolver = Arc::new(TickerResolver::new(search));

    let executor = Arc::new(SpecialistExecutor::new(
        resilience,
        resolver,
        Duration::from_secs(config.dispatch.specialist_timeout_seconds),
    ));

    let mut dispatcher = Dispatcher::new(executor, retry_policy(config.dispatch.default_retry));
    let mut seen = HashSet::new();
    for specialist in config.specialists.iter().filter(|s| s.enabled) {
        if !seen.insert(specialist.name.clone()) {
            bail!("duplicate specialist name '{}'", specialist.name);
        }
        dispatcher.register(
            Arc::new(CommandSpecialist::from_config(specialist)) as Arc<dyn Specialist>,
            specialist.retry.map(retry_policy),
        );
    }

    Ok(dispatcher)
}

/// Run one query through the given dispatcher.
pub async fn run_query(
    dispatcher: &Dispatcher,
    request: &QueryRequest,
    cancel: CancellationToken,
) -> Result<QueryContext, DispatchError> {
    dispatcher.run_query(request, cancel).await
}
