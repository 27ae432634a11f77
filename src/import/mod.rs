//! Import/export of whole calendars as JSON documents.

pub mod document;
pub mod importer;

pub use document::*;
pub use importer::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import document must be an object with providers, clinicTypes and shifts, not an array")]
    TopLevelArray,

    #[error("Import document must be a JSON object")]
    NotAnObject,

    #[error("Import document does not match the schema: {0}")]
    Schema(String),

    #[error("Invalid timestamp in {field}: {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Shift {index} ends before it starts")]
    InvalidRange { index: usize },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
