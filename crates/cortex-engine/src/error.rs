use cortex_store::StoreError;

/// Errors surfaced by the game services.
///
/// Everything except [`GameError::Persistence`] is a caller error and is
/// reported before any state is written.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Unknown session, or a session owned by someone else.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session already ended: {0}")]
    AlreadyEnded(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),
}

impl GameError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Only store I/O is worth retrying; the core never writes partially.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::AlreadyEnded(_) => "already_ended",
            Self::Persistence(_) => "persistence_failure",
        }
    }
}

impl From<StoreError> for GameError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Persistence(other),
        }
    }
}
