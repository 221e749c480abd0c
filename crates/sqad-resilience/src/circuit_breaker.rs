use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

/// Circuit state for one external dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Dependency unhealthy, calls rejected until the recovery timeout lapses.
    Open,
    /// One recovery probe in flight; its outcome decides the next state.
    HalfOpen,
}

/// Thresholds and timers for one breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive matching failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Rejection issued while the circuit is open, carrying the remaining
/// cooldown. The underlying function is never invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit for '{dependency}' is open; retry in {}ms", retry_in.as_millis())]
pub struct CircuitOpenError {
    pub dependency: String,
    pub retry_in: Duration,
}

/// Outcome of a breaker-guarded call.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpenError),
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
}

/// Admission held by a breaker-guarded call until an outcome is recorded.
/// Dropping it without an outcome (the call future was cancelled) abandons
/// a half-open probe and re-opens the circuit, so the probe slot can never
/// be held forever.
struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    probing: bool,
    settled: bool,
}

impl ProbeGuard<'_> {
    fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probing {
            self.breaker.abandon_probe();
        }
    }
}

/// Per-dependency failure isolation state machine. All transitions happen
/// under one mutex so concurrent callers observe a single consistent
/// transition sequence.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a call may proceed. While open, the cooldown lapse moves
    /// the breaker to half-open and admits exactly one probe; further callers
    /// are rejected until the probe settles.
    pub fn try_acquire(&self) -> Result<(), CircuitOpenError> {
        let mut inner = self.inner.lock().expect("breaker lock is not poisoned");
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Err(self.open_error(Duration::ZERO))
                } else {
                    inner.probe_in_flight = true;
                    Ok(())
                }
            }
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed > self.config.recovery_timeout {
                    info!(dependency = %self.name, "circuit open -> half-open (recovery probe)");
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    Ok(())
                } else {
                    Err(self.open_error(self.config.recovery_timeout.saturating_sub(elapsed)))
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock is not poisoned");
        if inner.state != CircuitState::Closed {
            info!(dependency = %self.name, "circuit -> closed");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        inner.probe_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock is not poisoned");
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());
        match inner.state {
            CircuitState::HalfOpen => {
                warn!(dependency = %self.name, "circuit half-open -> open (probe failed)");
                inner.state = CircuitState::Open;
                inner.probe_in_flight = false;
            }
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                warn!(
                    dependency = %self.name,
                    failures = inner.failure_count,
                    "circuit closed -> open"
                );
                inner.state = CircuitState::Open;
            }
            _ => {}
        }
    }

    /// Guard one call. `trips` is the matching-exception set: errors it
    /// rejects still prove the dependency answered, so they count as contact
    /// rather than failure.
    ///
    /// Cancellation-safe: if the returned future is dropped before the
    /// wrapped call settles, an admitted half-open probe is abandoned and
    /// the circuit re-opens with a fresh cooldown.
    pub async fn call<T, E, F, Fut>(&self, trips: impl Fn(&E) -> bool, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let guard = self.acquire()?;
        match f().await {
            Ok(value) => {
                guard.success();
                Ok(value)
            }
            Err(error) => {
                if trips(&error) {
                    guard.failure();
                } else {
                    guard.success();
                }
                Err(BreakerError::Inner(error))
            }
        }
    }

    fn acquire(&self) -> Result<ProbeGuard<'_>, CircuitOpenError> {
        self.try_acquire()?;
        let probing = {
            let inner = self.inner.lock().expect("breaker lock is not poisoned");
            inner.state == CircuitState::HalfOpen && inner.probe_in_flight
        };
        Ok(ProbeGuard {
            breaker: self,
            probing,
            settled: false,
        })
    }

    fn abandon_probe(&self) {
        let mut inner = self.inner.lock().expect("breaker lock is not poisoned");
        if inner.state == CircuitState::HalfOpen && inner.probe_in_flight {
            warn!(dependency = %self.name, "circuit half-open probe abandoned -> open");
            inner.state = CircuitState::Open;
            inner.probe_in_flight = false;
            inner.last_failure = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock is not poisoned").state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("breaker lock is not poisoned")
            .failure_count
    }

    fn open_error(&self, retry_in: Duration) -> CircuitOpenError {
        CircuitOpenError {
            dependency: self.name.clone(),
            retry_in,
        }
    }
}
