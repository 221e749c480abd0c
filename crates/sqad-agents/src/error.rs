use sqad_models::ErrorKind;
use thiserror::Error;

/// Failure of one specialist invocation, classified for the dispatch
/// pipeline. The variant decides the recovery path: `Transient` is retried,
/// `Identifier` triggers one ticker escalation, `CircuitOpen` and `Fatal`
/// end the invocation immediately.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("identifier rejected: {0}")]
    Identifier(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("circuit for '{dependency}' is open; retry in {retry_in_ms}ms")]
    CircuitOpen { dependency: String, retry_in_ms: u64 },

    #[error("fatal: {0}")]
    Fatal(String),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Identifier(_) => ErrorKind::Identifier,
            AgentError::Transient(_) => ErrorKind::Transient,
            AgentError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            AgentError::Fatal(_) => ErrorKind::Fatal,
        }
    }
}

/// Substrings in upstream error text that mean the *identifier* was wrong,
/// not that the dependency is unhealthy.
const IDENTIFIER_SIGNATURES: &[&str] = &[
    "not found",
    "delisted",
    "invalid symbol",
    "unknown ticker",
    "no data",
    "404",
];

/// Classify a raw failure message from a specialist subprocess.
///
/// Specialists report errors as free text; identifier-shaped messages become
/// `Identifier` so the executor can attempt a ticker escalation, everything
/// else is `Transient` and goes through the retry/breaker path.
pub fn classify_failure(message: &str) -> AgentError {
    let lowered = message.to_lowercase();
    if IDENTIFIER_SIGNATURES.iter().any(|sig| lowered.contains(sig)) {
        AgentError::Identifier(message.to_string())
    } else {
        AgentError::Transient(message.to_string())
    }
}

/// Dispatcher-level failure. Raised before any specialist runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown specialist '{0}'")]
    UnknownSpecialist(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_signatures_classify_as_identifier() {
        assert_eq!(
            classify_failure("instrument VODL not found").kind(),
            ErrorKind::Identifier
        );
        assert_eq!(
            classify_failure("Symbol was DELISTED in 2021").kind(),
            ErrorKind::Identifier
        );
        assert_eq!(classify_failure("HTTP 404 from upstream").kind(), ErrorKind::Identifier);
    }

    #[test]
    fn other_messages_classify_as_transient() {
        assert_eq!(classify_failure("connection reset by peer").kind(), ErrorKind::Transient);
        assert_eq!(classify_failure("rate limited, try later").kind(), ErrorKind::Transient);
        assert_eq!(classify_failure("").kind(), ErrorKind::Transient);
    }

    #[test]
    fn kinds_map_one_to_one() {
        assert_eq!(
            AgentError::CircuitOpen {
                dependency: "market-data".to_string(),
                retry_in_ms: 1200,
            }
            .kind(),
            ErrorKind::CircuitOpen
        );
        assert_eq!(AgentError::Fatal("bad config".to_string()).kind(), ErrorKind::Fatal);
    }
}
