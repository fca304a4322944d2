use thiserror::Error;

/// Errors raised while selecting a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("couldn't find connection \"{name}\"")]
    NotFound { name: String },
}

impl ConnectionError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
