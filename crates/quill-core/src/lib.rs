//! # Quill Core
//!
//! The domain layer of Quill: the `Post` record, its presence validation
//! and the publish transition.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, Field, RepoError, ValidationError};
