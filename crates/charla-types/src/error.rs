use thiserror::Error;

/// Errors from repository operations (used by trait definitions in charla-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Validation errors raised before any side effect of an exchange.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid character: '{0}'")]
    UnknownCharacter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::UnknownCharacter("zorro".to_string());
        assert_eq!(err.to_string(), "invalid character: 'zorro'");
        let err = ChatError::MissingField("prompt");
        assert_eq!(err.to_string(), "missing required field: prompt");
    }
}
