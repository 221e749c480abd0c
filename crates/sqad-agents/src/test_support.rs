//! Deterministic doubles for exercising the dispatch pipeline without real
//! subprocesses: scriptable specialists and a canned instrument search.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sqad_models::SpecialistContext;
use sqad_resolve::{Candidate, InstrumentSearch, ResolveError};

use crate::error::AgentError;
use crate::specialist::Specialist;

/// One scripted invocation outcome. Clonable so scripts can repeat.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(serde_json::Value),
    Identifier(String),
    Transient(String),
    Fatal(String),
}

impl MockOutcome {
    fn into_result(self) -> Result<serde_json::Value, AgentError> {
        match self {
            MockOutcome::Success(payload) => Ok(payload),
            MockOutcome::Identifier(msg) => Err(AgentError::Identifier(msg)),
            MockOutcome::Transient(msg) => Err(AgentError::Transient(msg)),
            MockOutcome::Fatal(msg) => Err(AgentError::Fatal(msg)),
        }
    }
}

enum Behavior {
    /// Same outcome on every invocation.
    Always(MockOutcome),
    /// Consume outcomes front to back; the last one repeats once exhausted.
    Sequence(Mutex<VecDeque<MockOutcome>>),
    /// Fail with an identifier error for one specific ticker, succeed for
    /// any other. Drives the self-healing path.
    TickerSensitive {
        fail_ticker: String,
        error: String,
        payload: serde_json::Value,
    },
}

/// Scriptable in-process specialist with an invocation counter.
pub struct MockSpecialist {
    name: String,
    dependency: String,
    behavior: Behavior,
    delay: Option<Duration>,
    invocations: AtomicU32,
}

impl MockSpecialist {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            dependency: format!("{name}-dep"),
            behavior,
            delay: None,
            invocations: AtomicU32::new(0),
        }
    }

    pub fn succeeding(name: &str, payload: serde_json::Value) -> Self {
        Self::with_behavior(name, Behavior::Always(MockOutcome::Success(payload)))
    }

    pub fn always(name: &str, outcome: MockOutcome) -> Self {
        Self::with_behavior(name, Behavior::Always(outcome))
    }

    pub fn scripted(name: &str, outcomes: Vec<MockOutcome>) -> Self {
        Self::with_behavior(
            name,
            Behavior::Sequence(Mutex::new(outcomes.into_iter().collect())),
        )
    }

    pub fn ticker_sensitive(name: &str, fail_ticker: &str, payload: serde_json::Value) -> Self {
        Self::with_behavior(
            name,
            Behavior::TickerSensitive {
                fail_ticker: fail_ticker.to_string(),
                error: format!("instrument {fail_ticker} not found"),
                payload,
            },
        )
    }

    pub fn with_dependency(mut self, dependency: &str) -> Self {
        self.dependency = dependency.to_string();
        self
    }

    /// Sleep before answering. Uses tokio time, so paused-clock tests can
    /// fast-forward through it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Specialist for MockSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependency(&self) -> &str {
        &self.dependency
    }

    async fn execute(&self, context: &SpecialistContext) -> Result<serde_json::Value, AgentError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Always(outcome) => outcome.clone().into_result(),
            Behavior::Sequence(script) => {
                let mut script = script.lock().expect("script lock is not poisoned");
                let outcome = if script.len() > 1 {
                    script.pop_front().expect("script is non-empty")
                } else {
                    script.front().cloned().unwrap_or(MockOutcome::Fatal(
                        "script exhausted".to_string(),
                    ))
                };
                outcome.into_result()
            }
            Behavior::TickerSensitive {
                fail_ticker,
                error,
                payload,
            } => {
                if context.ticker.as_deref() == Some(fail_ticker.as_str()) {
                    Err(AgentError::Identifier(error.clone()))
                } else {
                    Ok(payload.clone())
                }
            }
        }
    }
}

/// Instrument search answering every fragment with the same candidate list.
pub struct MockInstrumentSearch {
    candidates: Vec<Candidate>,
    calls: AtomicU32,
}

impl MockInstrumentSearch {
    pub fn returning(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            calls: AtomicU32::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::returning(Vec::new())
    }

    pub fn single(ticker: &str, name: &str) -> Self {
        Self::returning(vec![Candidate {
            ticker: ticker.to_string(),
            name: name.to_string(),
        }])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstrumentSearch for MockInstrumentSearch {
    async fn search(&self, _fragment: &str) -> Result<Vec<Candidate>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candidates.clone())
    }
}
