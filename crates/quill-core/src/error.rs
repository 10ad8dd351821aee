//! Domain-level error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A field of [`crate::domain::Post`] that is subject to the presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Body,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Body => "body",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence validation failure. Lists every missing field, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field(s): {}", join_fields(.missing))]
pub struct ValidationError {
    missing: Vec<Field>,
}

impl ValidationError {
    /// Returns `None` when nothing is missing.
    pub(crate) fn from_missing(missing: Vec<Field>) -> Option<Self> {
        if missing.is_empty() {
            None
        } else {
            Some(Self { missing })
        }
    }

    pub fn missing(&self) -> &[Field] {
        &self.missing
    }

    pub fn is_missing(&self, field: Field) -> bool {
        self.missing.contains(&field)
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
