use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use sqad_models::{ErrorKind, QueryContext, QueryRequest, SpecialistContext, SpecialistResult};
use sqad_resilience::RetryPolicy;
use sqad_resolve::{extract_ticker, normalize_ticker, recall_from_history};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::DispatchError;
use crate::executor::SpecialistExecutor;
use crate::specialist::Specialist;

/// Fans one query out to its specialist set and aggregates whatever comes
/// back. Results are merged in arrival order; a failed specialist costs only
/// its own slice of the answer.
pub struct Dispatcher {
    specialists: HashMap<String, Arc<dyn Specialist>>,
    retries: HashMap<String, RetryPolicy>,
    default_retry: RetryPolicy,
    executor: Arc<SpecialistExecutor>,
}

impl Dispatcher {
    pub fn new(executor: Arc<SpecialistExecutor>, default_retry: RetryPolicy) -> Self {
        Self {
            specialists: HashMap::new(),
            retries: HashMap::new(),
            default_retry,
            executor,
        }
    }

    /// Register a specialist, optionally with its own retry policy.
    pub fn register(&mut self, specialist: Arc<dyn Specialist>, retry: Option<RetryPolicy>) {
        let name = specialist.name().to_string();
        if let Some(retry) = retry {
            self.retries.insert(name.clone(), retry);
        }
        self.specialists.insert(name, specialist);
    }

    /// Registered specialist names, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.specialists.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run one query to completion.
    ///
    /// The specialist set is validated up front; an unknown name fails the
    /// whole query before anything runs. Cancelling the token stops
    /// in-flight specialists at the next await point while results already
    /// collected stay in the context.
    pub async fn run_query(
        &self,
        request: &QueryRequest,
        cancel: CancellationToken,
    ) -> Result<QueryContext, DispatchError> {
        for name in &request.specialist_set {
            if !self.specialists.contains_key(name) {
                return Err(DispatchError::UnknownSpecialist(name.clone()));
            }
        }

        let canonical = self.resolve_ticker(request);
        let mut context = QueryContext::new(&request.query, canonical.clone());
        let start = Instant::now();
        info!(
            correlation_id = %context.correlation_id,
            specialists = request.specialist_set.len(),
            ticker = canonical.as_deref().unwrap_or("-"),
            "dispatching query"
        );

        let specialist_context = SpecialistContext::new(canonical, &request.query);
        let mut tasks = JoinSet::new();
        for name in &request.specialist_set {
            let specialist = Arc::clone(&self.specialists[name]);
            let retry = self
                .retries
                .get(name)
                .copied()
                .unwrap_or(self.default_retry);
            let executor = Arc::clone(&self.executor);
            let specialist_context = specialist_context.clone();
            let cancelled = cancel.child_token();
            let name = name.clone();

            tasks.spawn(async move {
                tokio::select! {
                    _ = cancelled.cancelled() => SpecialistResult::failure(
                        &name,
                        ErrorKind::Transient,
                        "query cancelled".to_string(),
                        0,
                    ),
                    result = executor.run(specialist.as_ref(), &specialist_context, &retry) => result,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => context.record(result),
                Err(join_error) => {
                    error!(
                        correlation_id = %context.correlation_id,
                        error = %join_error,
                        "specialist task panicked"
                    );
                }
            }
        }

        context.freeze();
        info!(
            correlation_id = %context.correlation_id,
            executed = context.specialists_executed.len(),
            failed = context.specialists_failed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query complete"
        );
        Ok(context)
    }

    /// Tiered ticker resolution: explicit hint, then the query text, then
    /// conversation history, newest turn first. Whatever tier answers goes
    /// through deterministic normalization.
    fn resolve_ticker(&self, request: &QueryRequest) -> Option<String> {
        request
            .ticker_hint
            .clone()
            .or_else(|| extract_ticker(&request.query))
            .or_else(|| recall_from_history(&request.history))
            .map(|raw| normalize_ticker(&raw))
            .filter(|t| !t.is_empty())
    }
}
