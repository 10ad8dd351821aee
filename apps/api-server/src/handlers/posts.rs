//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges, PostDraft};
use quill_core::ports::PostFilter;
use quill_shared::ApiResponse;
use quill_shared::dto::{CreatePostRequest, ListPostsQuery, PostResponse, UpdatePostRequest};

use crate::middleware::error::AppResult;
use crate::state::AppState;

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        published: post.is_published(),
        title: post.title,
        body: post.body,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter {
        published: query.published,
    };
    let posts = state.posts.list(filter).await?;
    let body: Vec<PostResponse> = posts.into_iter().map(to_response).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = state
        .posts
        .create(PostDraft {
            title: req.title,
            body: req.body,
        })
        .await?;

    tracing::info!(post_id = %post.id, "Post created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(to_response(post))))
}

/// GET /api/posts/{id}
pub async fn show(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.posts.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// PATCH /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = state
        .posts
        .update(
            path.into_inner(),
            PostChanges {
                title: req.title,
                body: req.body,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// POST /api/posts/{id}/publish
pub async fn publish(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.posts.publish_by_id(path.into_inner()).await?;

    tracing::info!(post_id = %post.id, "Post published");
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        to_response(post),
        "Post published",
    )))
}

/// DELETE /api/posts/{id}
pub async fn delete(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(id).await?;

    tracing::info!(post_id = %id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
