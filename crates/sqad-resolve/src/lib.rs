//! Tiered ticker resolution.
//!
//! Tier 0 recalls an identifier from prior conversation turns, tier 1 applies
//! deterministic venue/suffix rules at zero network cost, tier 2 escalates to
//! a remote fuzzy instrument search. Tier 2 runs only when a tier-1 result
//! has already failed downstream, never speculatively.

pub mod error;
pub mod history;
pub mod rules;
pub mod search;

pub use error::ResolveError;
pub use history::{extract_ticker, recall_from_history};
pub use rules::normalize_ticker;
pub use search::{Candidate, CommandInstrumentSearch, InstrumentSearch, TickerResolver};
