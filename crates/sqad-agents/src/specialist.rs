use async_trait::async_trait;
use sqad_models::SpecialistContext;

use crate::error::AgentError;

/// One domain specialist. Mockable for testing.
///
/// `dependency` names the external system the specialist talks to and keys
/// its circuit breaker; several specialists may share one dependency.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn name(&self) -> &str;
    fn dependency(&self) -> &str;

    async fn execute(&self, context: &SpecialistContext) -> Result<serde_json::Value, AgentError>;
}
