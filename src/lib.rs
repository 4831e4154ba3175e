//! Cohort - a clinical trial study tracking library.
//!
//! This library provides the core functionality for the `ct` CLI tool:
//! study record management, enrollment insight classification, token-based
//! filtering, sorting, pagination, chart aggregations, and column
//! projection for spreadsheet export.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod engine;
pub mod models;
pub mod store;

/// Library-level error type for Cohort operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not initialized: run `ct system init` first")]
    NotInitialized,

    #[error("Study not found: {0}")]
    NotFound(String),

    #[error("Study ID '{0}' already exists")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Cohort operations.
pub type Result<T> = std::result::Result<T, Error>;
