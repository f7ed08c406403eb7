#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie '{name}' is {size} bytes encoded, limit is {limit}")]
    SizeExceeded {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Chunk sequence for '{name}' is broken: {reason}")]
    ChunkSequence { name: String, reason: String },

    #[error("Invalid cookie name: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CookieError {
    /// True for every failure that stems from turning a stored string back into a value.
    pub fn is_serialization(&self) -> bool {
        matches!(self, CookieError::Serialization(_) | CookieError::ChunkSequence { .. })
    }
}

impl From<serde_json::Error> for CookieError {
    fn from(e: serde_json::Error) -> Self {
        CookieError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CookieError>;
