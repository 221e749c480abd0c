//! Tier-2 remote instrument search and the resolver facade.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::rules::normalize_ticker;

/// One instrument returned by the search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
}

/// Fuzzy instrument lookup. Implementations answer free-text fragments with
/// ranked candidates, best match first.
#[async_trait]
pub trait InstrumentSearch: Send + Sync {
    async fn search(&self, fragment: &str) -> Result<Vec<Candidate>, ResolveError>;
}

/// Shells out to an external search command, passing the fragment as the
/// final argument and parsing a JSON candidate array from stdout.
#[derive(Debug, Clone)]
pub struct CommandInstrumentSearch {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInstrumentSearch {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl InstrumentSearch for CommandInstrumentSearch {
    async fn search(&self, fragment: &str) -> Result<Vec<Candidate>, ResolveError> {
        debug!(command = %self.command, fragment = %fragment, "Running instrument search");

        let output = tokio::time::timeout(self.timeout, async {
            Command::new(&self.command)
                .args(&self.args)
                .arg(fragment)
                .output()
                .await
        })
        .await
        .map_err(|_| ResolveError::Timeout(self.timeout.as_secs()))?
        .map_err(|e| ResolveError::Search(format!("failed to spawn {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr, "Instrument search failed");
            return Err(ResolveError::Search(format!(
                "{} exited {}: {}",
                self.command, output.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let candidates: Vec<Candidate> = serde_json::from_str(stdout.trim())?;
        Ok(candidates)
    }
}

/// Ties the cheap deterministic tier to the expensive search tier.
pub struct TickerResolver {
    search: Arc<dyn InstrumentSearch>,
}

impl TickerResolver {
    pub fn new(search: Arc<dyn InstrumentSearch>) -> Self {
        Self { search }
    }

    /// Deterministic normalization. No I/O.
    pub fn canonicalize(&self, raw: &str) -> String {
        normalize_ticker(raw)
    }

    /// Escalate a ticker that failed downstream to the remote search.
    /// Takes the top-ranked candidate and normalizes it; returns
    /// `Unresolved` when the search comes back empty.
    pub async fn escalate(&self, failing: &str) -> Result<String, ResolveError> {
        let candidates = self.search.search(failing).await?;
        let best = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::Unresolved(failing.to_string()))?;

        let resolved = normalize_ticker(&best.ticker);
        info!(
            failing = %failing,
            resolved = %resolved,
            name = %best.name,
            "Escalated ticker via instrument search"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedSearch {
        candidates: Vec<Candidate>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl InstrumentSearch for ScriptedSearch {
        async fn search(&self, _fragment: &str) -> Result<Vec<Candidate>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    #[tokio::test]
    async fn escalate_takes_top_candidate_and_normalizes() {
        let search = Arc::new(ScriptedSearch {
            candidates: vec![
                Candidate {
                    ticker: "VOD".to_string(),
                    name: "Vodafone Group".to_string(),
                },
                Candidate {
                    ticker: "VODI".to_string(),
                    name: "Vodafone Idea".to_string(),
                },
            ],
            calls: AtomicU32::new(0),
        });
        let resolver = TickerResolver::new(search.clone());

        let resolved = resolver.escalate("VODAF").await.unwrap();
        assert_eq!(resolved, "VOD.L");
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn escalate_reports_unresolved_on_empty_results() {
        let search = Arc::new(ScriptedSearch {
            candidates: vec![],
            calls: AtomicU32::new(0),
        });
        let resolver = TickerResolver::new(search);

        let err = resolver.escalate("XXXXX").await.unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(ref s) if s == "XXXXX"));
    }

    #[test]
    fn candidate_parses_without_name() {
        let parsed: Vec<Candidate> = serde_json::from_str(r#"[{"ticker": "AAPL"}]"#).unwrap();
        assert_eq!(parsed[0].ticker, "AAPL");
        assert_eq!(parsed[0].name, "");
    }
}
