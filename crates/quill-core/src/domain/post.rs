use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Field, ValidationError};

/// Presence check for the two required text fields.
///
/// A value counts as missing when it is absent, empty, or whitespace only.
/// Every missing field is reported, `title` before `body`.
pub fn validate(title: Option<&str>, body: Option<&str>) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if is_blank(title) {
        missing.push(Field::Title);
    }
    if is_blank(body) {
        missing.push(Field::Body);
    }

    match ValidationError::from_missing(missing) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Post entity - a piece of content with a title, a body and a publication flag.
///
/// `published` can only move from `false` to `true`, through [`Post::publish`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Rebuild a post from stored values.
    ///
    /// Storage adapters only: this takes `published` as given and is the one
    /// way around [`Post::publish`]. Repositories never write the flag back
    /// through `update`, so a restored value cannot unpublish a stored post.
    #[doc(hidden)]
    pub fn restore(
        id: Uuid,
        title: String,
        body: String,
        published: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            body,
            published,
            created_at,
            updated_at,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Run the presence check against the current field values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(Some(&self.title), Some(&self.body))
    }

    /// Mark the post as published.
    ///
    /// Returns `true` if the flag changed. Publishing twice is a no-op.
    pub fn publish(&mut self) -> bool {
        if self.published {
            return false;
        }
        self.published = true;
        self.updated_at = Utc::now();
        true
    }

    /// Assign the provided fields. Does not validate.
    pub fn apply(&mut self, changes: PostChanges) {
        let mut touched = false;
        if let Some(title) = changes.title {
            self.title = title;
            touched = true;
        }
        if let Some(body) = changes.body {
            self.body = body;
            touched = true;
        }
        if touched {
            self.updated_at = Utc::now();
        }
    }
}

/// An unsaved post whose fields may still be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self.title.as_deref(), self.body.as_deref())
    }

    /// Validate and build an unpublished post with a fresh id and timestamps.
    pub fn into_post(self) -> Result<Post, ValidationError> {
        self.validate()?;

        let now = Utc::now();
        Ok(Post {
            id: Uuid::new_v4(),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            published: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
}
