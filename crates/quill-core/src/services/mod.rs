//! Application services - orchestrate validation and persistence.

mod post_service;

pub use post_service::PostService;
