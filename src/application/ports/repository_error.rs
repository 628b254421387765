/// Shared failure vocabulary for the repository ports. Adapters fold their
/// driver-specific errors into these before they cross the port boundary.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// A uniqueness constraint rejected the write, e.g. two requests racing
    /// for the same episode number.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
}
