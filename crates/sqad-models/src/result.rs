use serde::{Deserialize, Serialize};

/// Failure classification shared by every layer of the dispatch pipeline.
///
/// The kind decides what happens next: `Identifier` triggers exactly one
/// resolution escalation, `Transient` is retried per policy, `CircuitOpen`
/// fast-fails without touching the dependency, `Fatal` propagates untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Ticker not found / delisted / invalid symbol.
    Identifier,
    /// Timeout, rate limit, 5xx-equivalent.
    Transient,
    /// Dependency marked unhealthy by its circuit breaker.
    CircuitOpen,
    /// Programming or configuration error. Never retried.
    Fatal,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        self == ErrorKind::Transient
    }

    pub fn is_identifier(self) -> bool {
        self == ErrorKind::Identifier
    }
}

/// Classified failure attached to an unsuccessful specialist result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one specialist invocation. Immutable once returned; the
/// dispatcher merges it into the query context and never mutates it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistResult {
    pub specialist: String,
    pub success: bool,
    /// Domain payload on success, `null` otherwise.
    pub payload: serde_json::Value,
    pub error: Option<SpecialistFailure>,
    pub latency_ms: u64,
    /// Set only when a self-healing escalation rewrote the ticker for this
    /// invocation.
    pub resolved_ticker: Option<String>,
}

impl SpecialistResult {
    pub fn success(specialist: &str, payload: serde_json::Value, latency_ms: u64) -> Self {
        Self {
            specialist: specialist.to_string(),
            success: true,
            payload,
            error: None,
            latency_ms,
            resolved_ticker: None,
        }
    }

    pub fn failure(specialist: &str, kind: ErrorKind, message: String, latency_ms: u64) -> Self {
        Self {
            specialist: specialist.to_string(),
            success: false,
            payload: serde_json::Value::Null,
            error: Some(SpecialistFailure { kind, message }),
            latency_ms,
            resolved_ticker: None,
        }
    }

    pub fn with_resolved_ticker(mut self, ticker: &str) -> Self {
        self.resolved_ticker = Some(ticker.to_string());
        self
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_success_result() {
        let result = SpecialistResult::success(
            "technical",
            serde_json::json!({"rsi_14": 28.4, "signal": "oversold"}),
            412,
        );

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: SpecialistResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
        assert!(deserialized.success);
        assert!(deserialized.error.is_none());
    }

    #[test]
    fn roundtrip_failure_result() {
        let result = SpecialistResult::failure(
            "news",
            ErrorKind::Identifier,
            "instrument VODL not found".to_string(),
            87,
        );

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: SpecialistResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error_kind(), Some(ErrorKind::Identifier));
        assert!(deserialized.payload.is_null());
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::CircuitOpen).unwrap();
        assert_eq!(json, "\"circuit_open\"");
    }
}
