pub mod config;
pub mod query;
pub mod result;

pub use config::{
    BreakerConfig, DispatchConfig, ResilienceConfig, ResolverConfig, RetryConfig,
    SpecialistConfig, SqadConfig,
};
pub use query::{QueryContext, QueryRequest, SpecialistContext};
pub use result::{ErrorKind, SpecialistFailure, SpecialistResult};
