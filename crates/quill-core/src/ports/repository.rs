use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Post;
use crate::error::RepoError;

/// Listing filter. `published: None` returns every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub published: Option<bool>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            published: Some(true),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.published
            .is_none_or(|published| post.is_published() == published)
    }
}

/// Storage for posts.
///
/// Implementations persist what they are given; validation happens before
/// these methods are called.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post.
    async fn create(&self, post: Post) -> Result<Post, RepoError>;

    /// Overwrite the title, body and timestamps of an existing post.
    ///
    /// The stored `published` flag is left as it is. `RepoError::NotFound`
    /// if the id is unknown.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    /// Set the stored `published` flag and return the stored row.
    ///
    /// Writes only the flag and `updated_at`, and only when the flag was
    /// false. `RepoError::NotFound` if the id is unknown.
    async fn mark_published(&self, id: Uuid) -> Result<Post, RepoError>;

    /// Find a post by its unique ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Delete a post by its ID. `RepoError::NotFound` if the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Posts matching `filter`, oldest first.
    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError>;
}
