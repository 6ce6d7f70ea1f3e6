// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier mass-email engine.

use thiserror::Error;

use crate::types::MassEmailStatus;

/// The primary error type used across all Courier collaborator traits and engine operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A mass email is not in the status an operation requires.
    #[error("mass email {id} should be {expected}, found {actual}")]
    InvalidState {
        id: String,
        expected: MassEmailStatus,
        actual: MassEmailStatus,
    },

    /// Mail transport errors (connection failure, rejected recipient, malformed message).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The recipient address cannot be carried by the transport at all.
    /// Retrying does not help, so no attempt is spent on it.
    #[error("invalid recipient address `{address}`")]
    InvalidAddress { address: String },

    /// Template rendering errors.
    #[error("template error: {message}")]
    Template { message: String },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a transport failure without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        CourierError::Transport {
            message: message.into(),
            source: None,
        }
    }
}
