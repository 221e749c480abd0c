use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The remote search returned zero candidates; the ticker stays
    /// unresolved rather than guessed.
    #[error("no instrument matched '{0}'")]
    Unresolved(String),

    #[error("instrument search failed: {0}")]
    Search(String),

    #[error("instrument search timed out after {0} seconds")]
    Timeout(u64),

    #[error("search output parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
