//! Resilience primitives shared by every external call the dispatcher makes:
//! per-dependency circuit breakers and deterministic exponential-backoff
//! retries. The two compose; this system retries transient failures inside a
//! breaker-guarded call.

pub mod circuit_breaker;
pub mod registry;
pub mod retry;

pub use circuit_breaker::{
    BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitOpenError, CircuitState,
};
pub use registry::ResilienceManager;
pub use retry::RetryPolicy;
