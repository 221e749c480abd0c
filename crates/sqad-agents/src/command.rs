use async_trait::async_trait;
use sqad_models::{SpecialistConfig, SpecialistContext};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{classify_failure, AgentError};
use crate::specialist::Specialist;

/// Specialist backed by an external command.
///
/// The JSON-serialized context goes in as the final argument; the command
/// answers with a JSON object on stdout. An object carrying a top-level
/// `"error"` string is a structured failure and gets classified like a
/// nonzero exit would be. Timeouts are enforced by the executor, not here.
pub struct CommandSpecialist {
    name: String,
    dependency: String,
    command: String,
    args: Vec<String>,
}

impl CommandSpecialist {
    pub fn new(name: &str, dependency: &str, command: &str, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            dependency: dependency.to_string(),
            command: command.to_string(),
            args,
        }
    }

    pub fn from_config(config: &SpecialistConfig) -> Self {
        Self::new(&config.name, &config.dependency, &config.command, config.args.clone())
    }
}

#[async_trait]
impl Specialist for CommandSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependency(&self) -> &str {
        &self.dependency
    }

    async fn execute(&self, context: &SpecialistContext) -> Result<serde_json::Value, AgentError> {
        let context_json = serde_json::to_string(context)
            .map_err(|e| AgentError::Fatal(format!("context serialization failed: {e}")))?;

        debug!(specialist = %self.name, command = %self.command, "invoking specialist command");

        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(&context_json)
            .output()
            .await
            .map_err(|e| AgentError::Fatal(format!("failed to spawn {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                specialist = %self.name,
                status = %output.status,
                stderr = %stderr,
                "specialist command failed"
            );
            return Err(classify_failure(stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Err(AgentError::Transient(format!(
                "{} returned empty output",
                self.command
            )));
        }

        let payload: serde_json::Value = serde_json::from_str(stdout)
            .map_err(|e| AgentError::Transient(format!("malformed specialist output: {e}")))?;

        // Structured failure path: exit 0 with {"error": "..."}.
        if let Some(message) = payload.get("error").and_then(|v| v.as_str()) {
            return Err(classify_failure(message));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqad_models::ErrorKind;

    #[tokio::test]
    async fn echo_round_trips_the_context() {
        // `echo` prints its final argument, so the payload is the context
        // object itself. Exercises spawn, arg passing, and stdout parsing.
        let specialist = CommandSpecialist::new("echoer", "local", "echo", vec![]);
        let context = SpecialistContext::new(Some("AAPL".to_string()), "quote AAPL");

        let payload = specialist.execute(&context).await.unwrap();
        assert_eq!(payload["ticker"], "AAPL");
        assert_eq!(payload["raw_query"], "quote AAPL");
    }

    #[tokio::test]
    async fn nonzero_exit_classifies_stderr() {
        let specialist = CommandSpecialist::new(
            "fails",
            "local",
            "sh",
            vec!["-c".to_string(), "echo 'ticker not found' >&2; exit 1".to_string()],
        );
        let context = SpecialistContext::new(Some("ZZZZ".to_string()), "quote ZZZZ");

        let err = specialist.execute(&context).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Identifier);
    }

    #[tokio::test]
    async fn structured_error_field_is_classified() {
        let specialist = CommandSpecialist::new(
            "structured",
            "local",
            "sh",
            vec![
                "-c".to_string(),
                r#"echo '{"error": "rate limited"}'"#.to_string(),
            ],
        );
        let context = SpecialistContext::new(None, "anything");

        let err = specialist.execute(&context).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[tokio::test]
    async fn missing_binary_is_fatal() {
        let specialist =
            CommandSpecialist::new("ghost", "local", "sqad-no-such-binary-zz", vec![]);
        let context = SpecialistContext::new(None, "anything");

        let err = specialist.execute(&context).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[tokio::test]
    async fn empty_output_is_transient() {
        let specialist = CommandSpecialist::new("silent", "local", "true", vec![]);
        let context = SpecialistContext::new(None, "anything");

        let err = specialist.execute(&context).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
    }
}
