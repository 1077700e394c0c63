use crate::models::TargetSchema;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,
    #[error("request to the generation backend failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation backend returned an error: {0}")]
    Api(String),
    #[error("generated payload failed validation: {0}")]
    Validation(String),
    #[error("generation did not finish within {0:?}")]
    TimedOut(Duration),
}

impl GenerationError {
    /// The one-line notification shown to the user. Details only go to the log.
    pub fn user_message(schema: TargetSchema) -> String {
        format!("Failed to generate {}. Please try again.", schema.noun())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not encode session value: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("could not prepare session directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    #[error("no source document in the session store")]
    MissingDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_schema() {
        assert_eq!(
            GenerationError::user_message(TargetSchema::Quiz),
            "Failed to generate quiz. Please try again."
        );
        assert_eq!(
            GenerationError::user_message(TargetSchema::Flashcards),
            "Failed to generate flashcards. Please try again."
        );
    }
}
