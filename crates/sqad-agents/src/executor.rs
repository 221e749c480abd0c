use std::sync::Arc;
use std::time::{Duration, Instant};

use sqad_models::{SpecialistContext, SpecialistResult};
use sqad_resilience::{BreakerError, ResilienceManager, RetryPolicy};
use sqad_resolve::TickerResolver;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::specialist::Specialist;

/// Runs one specialist invocation behind the full resilience stack.
///
/// Layering, outermost first: retry (transient only) -> circuit breaker on
/// the specialist's dependency -> per-invocation timeout -> the specialist.
/// An `Identifier` failure after all that triggers exactly one ticker
/// escalation followed by a single healed attempt; the healed attempt is
/// breaker-guarded but never retried or re-escalated.
pub struct SpecialistExecutor {
    resilience: Arc<ResilienceManager>,
    resolver: Arc<TickerResolver>,
    specialist_timeout: Duration,
}

impl SpecialistExecutor {
    pub fn new(
        resilience: Arc<ResilienceManager>,
        resolver: Arc<TickerResolver>,
        specialist_timeout: Duration,
    ) -> Self {
        Self {
            resilience,
            resolver,
            specialist_timeout,
        }
    }

    /// Execute one specialist to completion. Never panics or errors out of
    /// the dispatch pipeline; every outcome lands in a `SpecialistResult`.
    pub async fn run(
        &self,
        specialist: &dyn Specialist,
        context: &SpecialistContext,
        retry: &RetryPolicy,
    ) -> SpecialistResult {
        let start = Instant::now();
        let name = specialist.name().to_string();

        let attempt = retry
            .run(
                |e: &AgentError| e.kind().is_transient(),
                || self.guarded(specialist, context),
            )
            .await;

        match attempt {
            Ok(payload) => {
                SpecialistResult::success(&name, payload, elapsed_ms(start))
            }
            Err(error) if error.kind().is_identifier() => {
                self.heal(specialist, context, error, start).await
            }
            Err(error) => {
                warn!(specialist = %name, error = %error, "specialist failed");
                SpecialistResult::failure(&name, error.kind(), error.to_string(), elapsed_ms(start))
            }
        }
    }

    /// Self-healing path for identifier failures: escalate the ticker to the
    /// instrument search and, if it resolves to something new, make one more
    /// guarded attempt with the rewritten context.
    async fn heal(
        &self,
        specialist: &dyn Specialist,
        context: &SpecialistContext,
        original: AgentError,
        start: Instant,
    ) -> SpecialistResult {
        let name = specialist.name().to_string();

        let Some(ticker) = context.ticker.as_deref() else {
            warn!(specialist = %name, error = %original, "identifier failure without a ticker");
            return SpecialistResult::failure(
                &name,
                original.kind(),
                original.to_string(),
                elapsed_ms(start),
            );
        };

        let resolved = match self.resolver.escalate(ticker).await {
            Ok(resolved) => resolved,
            Err(resolve_error) => {
                warn!(
                    specialist = %name,
                    ticker = %ticker,
                    error = %resolve_error,
                    "ticker escalation failed"
                );
                return SpecialistResult::failure(
                    &name,
                    original.kind(),
                    format!("{original}; escalation failed: {resolve_error}"),
                    elapsed_ms(start),
                );
            }
        };

        if resolved == ticker {
            // Search agreed with the failing ticker; nothing left to try.
            return SpecialistResult::failure(
                &name,
                original.kind(),
                original.to_string(),
                elapsed_ms(start),
            );
        }

        info!(
            specialist = %name,
            failing = %ticker,
            resolved = %resolved,
            "retrying with escalated ticker"
        );

        let healed_context = context.with_ticker(&resolved);
        match self.guarded(specialist, &healed_context).await {
            Ok(payload) => SpecialistResult::success(&name, payload, elapsed_ms(start))
                .with_resolved_ticker(&resolved),
            Err(error) => {
                warn!(
                    specialist = %name,
                    resolved = %resolved,
                    error = %error,
                    "healed attempt failed"
                );
                SpecialistResult::failure(&name, error.kind(), error.to_string(), elapsed_ms(start))
            }
        }
    }

    /// One breaker-guarded, timeout-bounded call. Only transient failures
    /// trip the breaker: an identifier rejection proves the dependency
    /// answered, so it counts as contact.
    async fn guarded(
        &self,
        specialist: &dyn Specialist,
        context: &SpecialistContext,
    ) -> Result<serde_json::Value, AgentError> {
        let breaker = self.resilience.breaker(specialist.dependency());
        let timeout = self.specialist_timeout;

        let result = breaker
            .call(
                |e: &AgentError| e.kind().is_transient(),
                || async {
                    match tokio::time::timeout(timeout, specialist.execute(context)).await {
                        Ok(inner) => inner,
                        Err(_) => Err(AgentError::Transient(format!(
                            "specialist timed out after {}s",
                            timeout.as_secs()
                        ))),
                    }
                },
            )
            .await;

        match result {
            Ok(payload) => Ok(payload),
            Err(BreakerError::Open(open)) => Err(AgentError::CircuitOpen {
                dependency: open.dependency,
                retry_in_ms: open.retry_in.as_millis() as u64,
            }),
            Err(BreakerError::Inner(error)) => Err(error),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
