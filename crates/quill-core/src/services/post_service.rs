use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Post, PostChanges, PostDraft};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostFilter, PostRepository};

const ENTITY: &str = "Post";

/// Write path for posts. Every create and update is validated before the
/// repository is touched.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, draft: PostDraft) -> Result<Post, DomainError> {
        let post = draft.into_post()?;
        Ok(self.repo.create(post).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: ENTITY,
                id,
            })
    }

    pub async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, DomainError> {
        Ok(self.repo.list(filter).await?)
    }

    pub async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, DomainError> {
        let mut post = self.get(id).await?;
        post.apply(changes);
        post.validate()?;
        self.save(post).await
    }

    /// Set `published = true` on the stored post and return it.
    ///
    /// Only the flag is written, so edits stored after `post` was loaded are
    /// kept. Already-published posts stay published.
    pub async fn publish(&self, post: Post) -> Result<Post, DomainError> {
        self.publish_by_id(post.id).await
    }

    pub async fn publish_by_id(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .mark_published(id)
            .await
            .map_err(|e| not_found(e, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id).await.map_err(|e| not_found(e, id))
    }

    async fn save(&self, post: Post) -> Result<Post, DomainError> {
        let id = post.id;
        self.repo.update(post).await.map_err(|e| not_found(e, id))
    }
}

fn not_found(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: ENTITY,
            id,
        },
        other => DomainError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::Field;

    /// Map-backed repository that counts writes.
    #[derive(Default)]
    struct RecordingRepo {
        rows: Mutex<HashMap<Uuid, Post>>,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl RecordingRepo {
        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn write(&self, post: Post) -> Result<Post, RepoError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(RepoError::Connection("storage unavailable".to_string()));
            }
            self.rows.lock().unwrap().insert(post.id, post.clone());
            Ok(post)
        }
    }

    #[async_trait]
    impl PostRepository for RecordingRepo {
        async fn create(&self, post: Post) -> Result<Post, RepoError> {
            self.write(post)
        }

        async fn update(&self, post: Post) -> Result<Post, RepoError> {
            let published = self
                .rows
                .lock()
                .unwrap()
                .get(&post.id)
                .map(Post::is_published)
                .ok_or(RepoError::NotFound)?;
            self.write(Post::restore(
                post.id,
                post.title,
                post.body,
                published,
                post.created_at,
                post.updated_at,
            ))
        }

        async fn mark_published(&self, id: Uuid) -> Result<Post, RepoError> {
            let mut stored = self
                .rows
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            if !stored.publish() {
                return Ok(stored);
            }
            self.write(stored)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.rows
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepoError::NotFound)
        }

        async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.values().filter(|p| filter.matches(p)).cloned().collect())
        }
    }

    fn service() -> (PostService, Arc<RecordingRepo>) {
        let repo = Arc::new(RecordingRepo::default());
        (PostService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn publish_sets_flag_and_keeps_fields() {
        let (service, repo) = service();
        let post = service
            .create(PostDraft::new("Hello world", "lorem ipsum"))
            .await
            .unwrap();
        assert!(!post.is_published());

        let published = service.publish(post.clone()).await.unwrap();
        assert!(published.is_published());
        assert_eq!(published.title, "Hello world");
        assert_eq!(published.body, "lorem ipsum");

        let stored = service.get(post.id).await.unwrap();
        assert!(stored.is_published());
        assert_eq!(repo.writes(), 2);
    }

    #[tokio::test]
    async fn publish_from_stale_copy_keeps_later_edits() {
        let (service, _repo) = service();
        let snapshot = service
            .create(PostDraft::new("Hello world", "lorem ipsum"))
            .await
            .unwrap();
        service
            .update(
                snapshot.id,
                PostChanges {
                    title: Some("Edited".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap();

        let published = service.publish(snapshot.clone()).await.unwrap();
        assert!(published.is_published());
        assert_eq!(published.title, "Edited");

        let stored = service.get(snapshot.id).await.unwrap();
        assert!(stored.is_published());
        assert_eq!(stored.title, "Edited");
        assert_eq!(stored.body, "lorem ipsum");
    }

    #[tokio::test]
    async fn update_from_before_publish_keeps_flag() {
        let (service, repo) = service();
        let post = service.create(PostDraft::new("foo", "bar")).await.unwrap();
        service.publish_by_id(post.id).await.unwrap();

        service
            .update(
                post.id,
                PostChanges {
                    title: Some("baz".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap();
        assert!(service.get(post.id).await.unwrap().is_published());
        assert_eq!(repo.writes(), 3);
    }

    #[tokio::test]
    async fn publish_twice_stays_published() {
        let (service, _repo) = service();
        let post = service.create(PostDraft::new("foo", "bar")).await.unwrap();

        let first = service.publish(post).await.unwrap();
        assert!(first.is_published());
        let second = service.publish(first).await.unwrap();
        assert!(second.is_published());
    }

    #[tokio::test]
    async fn publish_by_id_loads_and_publishes() {
        let (service, _repo) = service();
        let post = service.create(PostDraft::new("foo", "bar")).await.unwrap();

        let published = service.publish_by_id(post.id).await.unwrap();
        assert!(published.is_published());
    }

    #[tokio::test]
    async fn publish_by_unknown_id_is_not_found() {
        let (service, _repo) = service();
        let err = service.publish_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_storage() {
        let (service, repo) = service();
        let draft = PostDraft {
            title: None,
            body: Some("foo".to_string()),
        };

        let err = service.create(draft).await.unwrap_err();
        match err {
            DomainError::Validation(e) => assert_eq!(e.missing(), &[Field::Title]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_without_write() {
        let (service, repo) = service();
        let post = service.create(PostDraft::new("foo", "bar")).await.unwrap();

        let err = service
            .update(
                post.id,
                PostChanges {
                    title: Some("  ".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(repo.writes(), 1);
        assert_eq!(service.get(post.id).await.unwrap().title, "foo");
    }

    #[tokio::test]
    async fn update_persists_changes() {
        let (service, _repo) = service();
        let post = service.create(PostDraft::new("foo", "bar")).await.unwrap();

        let updated = service
            .update(
                post.id,
                PostChanges {
                    title: None,
                    body: Some("baz".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "foo");
        assert_eq!(updated.body, "baz");
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let service = PostService::new(Arc::new(RecordingRepo::failing()));
        let err = service
            .create(PostDraft::new("foo", "bar"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Repository(RepoError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let (service, _repo) = service();
        let err = service.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_applies_filter() {
        let (service, _repo) = service();
        let a = service.create(PostDraft::new("a", "a")).await.unwrap();
        service.create(PostDraft::new("b", "b")).await.unwrap();
        service.publish(a.clone()).await.unwrap();

        let published = service.list(PostFilter::published()).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, a.id);

        let all = service.list(PostFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
