//! In-memory post repository - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{PostFilter, PostRepository};

/// Post storage backed by a `HashMap` behind an async `RwLock`.
///
/// Note: Data is lost on process restart.
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!(
                "post {} already exists",
                post.id
            )));
        }

        tracing::debug!(post_id = %post.id, "Inserting post in memory");
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let slot = store.get_mut(&post.id).ok_or(RepoError::NotFound)?;

        // The flag is owned by `mark_published`; keep the stored value.
        *slot = Post::restore(
            post.id,
            post.title,
            post.body,
            slot.is_published(),
            post.created_at,
            post.updated_at,
        );
        Ok(slot.clone())
    }

    async fn mark_published(&self, id: Uuid) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let slot = store.get_mut(&id).ok_or(RepoError::NotFound)?;

        if slot.publish() {
            tracing::debug!(post_id = %id, "Published post in memory");
        }
        Ok(slot.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use quill_core::domain::PostDraft;

    use super::*;

    fn post(title: &str) -> Post {
        PostDraft::new(title, "lorem ipsum").into_post().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryPostRepository::new();
        let created = repo.create(post("Hello world")).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_create_duplicate_id() {
        let repo = InMemoryPostRepository::new();
        let p = post("Hello world");
        repo.create(p.clone()).await.unwrap();

        let err = repo.create(p).await.unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let repo = InMemoryPostRepository::new();
        let mut p = repo.create(post("Hello world")).await.unwrap();
        p.title = "Edited".to_string();

        repo.update(p.clone()).await.unwrap();
        let stored = repo.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Edited");
    }

    #[tokio::test]
    async fn test_update_never_writes_published_flag() {
        let repo = InMemoryPostRepository::new();
        let created = repo.create(post("Hello world")).await.unwrap();

        // A copy taken before publishing must not unpublish on write-back.
        let stale = created.clone();
        repo.mark_published(created.id).await.unwrap();
        let after = repo.update(stale).await.unwrap();
        assert!(after.is_published());

        // A copy marked published must not publish through update.
        let other = repo.create(post("draft")).await.unwrap();
        let mut flagged = other.clone();
        flagged.publish();
        let after = repo.update(flagged).await.unwrap();
        assert!(!after.is_published());
    }

    #[tokio::test]
    async fn test_mark_published_keeps_later_edits() {
        let repo = InMemoryPostRepository::new();
        let snapshot = repo.create(post("Hello world")).await.unwrap();

        let mut edited = snapshot.clone();
        edited.title = "Edited".to_string();
        repo.update(edited).await.unwrap();

        let published = repo.mark_published(snapshot.id).await.unwrap();
        assert!(published.is_published());
        assert_eq!(published.title, "Edited");

        let again = repo.mark_published(snapshot.id).await.unwrap();
        assert_eq!(again, published);
    }

    #[tokio::test]
    async fn test_mark_published_unknown_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let err = repo.mark_published(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let err = repo.update(post("ghost")).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryPostRepository::new();
        let p = repo.create(post("Hello world")).await.unwrap();

        repo.delete(p.id).await.unwrap();
        assert_eq!(repo.find_by_id(p.id).await.unwrap(), None);
        assert!(matches!(
            repo.delete(p.id).await.unwrap_err(),
            RepoError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_published() {
        let repo = InMemoryPostRepository::new();
        let a = repo.create(post("a")).await.unwrap();
        repo.create(post("b")).await.unwrap();
        let a = repo.mark_published(a.id).await.unwrap();

        let published = repo.list(PostFilter::published()).await.unwrap();
        assert_eq!(published, vec![a]);

        let drafts = repo
            .list(PostFilter {
                published: Some(false),
            })
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "b");

        assert_eq!(repo.list(PostFilter::default()).await.unwrap().len(), 2);
    }
}
