use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::SpecialistResult;

/// One user query as handed to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    /// Raw ticker hint from the caller or intent classifier, if any.
    pub ticker_hint: Option<String>,
    /// Names of the specialists to fan out to.
    pub specialist_set: Vec<String>,
    /// Prior conversation turns, oldest first. Used for tier-0 ticker recall
    /// when the query itself carries no identifier.
    #[serde(default)]
    pub history: Vec<String>,
}

impl QueryRequest {
    pub fn new(query: &str, ticker_hint: Option<&str>, specialist_set: Vec<String>) -> Self {
        Self {
            query: query.to_string(),
            ticker_hint: ticker_hint.map(|t| t.to_string()),
            specialist_set,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// Input handed to a single specialist invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialistContext {
    /// Canonical ticker for this query, if resolution succeeded.
    pub ticker: Option<String>,
    pub raw_query: String,
}

impl SpecialistContext {
    pub fn new(ticker: Option<String>, raw_query: &str) -> Self {
        Self {
            ticker,
            raw_query: raw_query.to_string(),
        }
    }

    /// Copy of this context with the ticker substituted (self-healing retry).
    pub fn with_ticker(&self, ticker: &str) -> Self {
        Self {
            ticker: Some(ticker.to_string()),
            raw_query: self.raw_query.clone(),
        }
    }
}

/// Accumulated outcome of one query, owned exclusively by the dispatcher
/// while specialists run, frozen when `run_query` returns.
///
/// `specialists_executed` and `specialists_failed` record arrival order,
/// which is nondeterministic under concurrent fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryContext {
    pub correlation_id: Uuid,
    pub query: String,
    pub canonical_ticker: Option<String>,
    pub specialists_executed: Vec<String>,
    pub specialists_failed: Vec<String>,
    /// Successful payloads keyed by specialist name.
    pub payloads: HashMap<String, serde_json::Value>,
    /// Full per-specialist telemetry, including failures.
    pub results: Vec<SpecialistResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueryContext {
    pub fn new(query: &str, canonical_ticker: Option<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            query: query.to_string(),
            canonical_ticker,
            specialists_executed: Vec::new(),
            specialists_failed: Vec::new(),
            payloads: HashMap::new(),
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Merge one specialist outcome. Successful payloads land in the payload
    /// map; a rewritten ticker from a healed invocation becomes the new
    /// canonical ticker for the frozen context.
    pub fn record(&mut self, result: SpecialistResult) {
        if result.success {
            self.specialists_executed.push(result.specialist.clone());
            if !result.payload.is_null() {
                self.payloads
                    .insert(result.specialist.clone(), result.payload.clone());
            }
            if let Some(ticker) = &result.resolved_ticker {
                self.canonical_ticker = Some(ticker.clone());
            }
        } else {
            self.specialists_failed.push(result.specialist.clone());
        }
        self.results.push(result);
    }

    pub fn freeze(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
