use thiserror::Error;

/// Failures reported by the link store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The hash derived from the submitted URL is already taken.
    #[error("url already exists")]
    DuplicateKey,

    #[error("no link matches that identifier")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// A submission rejected before it reaches the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("both fields are required")]
    MissingFields,
}

/// Failures while regenerating or loading the cached feed artifact.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("reading feed entries: {0}")]
    Store(#[from] StoreError),

    #[error("feed file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("rendering feed: {0}")]
    Render(#[from] askama::Error),

    #[error("feed writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
