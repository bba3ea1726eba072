//! Shared error types for the processing pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Invalid artifact key: {input}")]
    InvalidKey { input: String },

    #[error("Staging store {operation} failed: {message}")]
    StoreError { operation: String, message: String },

    #[error("Failed to read input file {name}: {message}")]
    ReadError { name: String, message: String },

    #[error("Message protocol error: {message}")]
    ProtocolError { message: String },
}

impl SharedError {
    pub fn store(operation: &str, error: impl std::fmt::Display) -> Self {
        Self::StoreError {
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<bincode::Error> for SharedError {
    fn from(error: bincode::Error) -> Self {
        Self::SerializationError {
            message: error.to_string(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
