use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection has been closed; no further calls are accepted.
    #[error("the store connection is closed")]
    Closed,

    /// A driver-level failure. The engine treats these as fatal for the current
    /// call and propagates them to the caller.
    #[error("{0}")]
    Backend(String),
}
