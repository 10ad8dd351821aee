//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{PostFilter, PostRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        tracing::debug!(post_id = %post.id, "Inserting post");
        self.insert(post).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        tracing::debug!(
            post_id = %post.id,
            published = post.is_published(),
            "Updating post"
        );
        let mut active_model: post::ActiveModel = post.into();
        // The flag is only written by `mark_published`.
        active_model.published = ActiveValue::NotSet;
        self.replace(active_model).await
    }

    async fn mark_published(&self, id: Uuid) -> Result<Post, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Published, Expr::value(true))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Published.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected > 0 {
            tracing::debug!(post_id = %id, "Published post");
        }

        self.fetch(id).await?.ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.fetch(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        tracing::debug!(post_id = %id, "Deleting post");
        self.remove(id).await
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find();
        if let Some(published) = filter.published {
            query = query.filter(post::Column::Published.eq(published));
        }

        let result = query
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
