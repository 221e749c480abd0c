//! Specialist execution and query dispatch.
//!
//! A query fans out to independent specialists. Each invocation runs behind
//! the full resilience stack: per-invocation timeout, circuit breaker on the
//! specialist's dependency, bounded retry for transient failures, and a
//! single self-healing ticker escalation for identifier failures. One broken
//! specialist degrades its slice of the answer, never the whole query.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod intent;
pub mod specialist;
pub mod test_support;

pub use command::CommandSpecialist;
pub use dispatcher::Dispatcher;
pub use error::{classify_failure, AgentError, DispatchError};
pub use executor::SpecialistExecutor;
pub use intent::{Intent, IntentClassifier, IntentKind, RuleIntentClassifier};
pub use specialist::Specialist;
