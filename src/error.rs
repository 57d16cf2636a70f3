use crate::engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Error from engine: `{0}`")]
    Engine(#[from] EngineError),

    #[error("Error from engine: `{source}` when executing query: `{query}`")]
    EngineErrorWithQuery {
        query: String,
        #[source]
        source: EngineError,
    },

    #[error("Invalid number of results returned from query. Expected `{expected}`, got `{actual}`")]
    InvalidNumberOfResults {
        actual: usize,
        expected: usize,
    },

    #[error("Unexpected value in column {column_index} of engine row: {message}")]
    UnexpectedRowValue {
        column_index: usize,
        message: String,
    },

    #[error("Failed to serialize workbench state: `{0}`")]
    StateSerialization(#[from] serde_json::Error),
}

impl WorkbenchError {
    /// The engine's own message, without the wrapping context. This is what
    /// gets surfaced to the user, verbatim.
    pub fn engine_message(&self) -> String {
        match self {
            WorkbenchError::Engine(e) => e.message.clone(),
            WorkbenchError::EngineErrorWithQuery { source, .. } => source.message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T = ()> = std::result::Result<T, WorkbenchError>;
