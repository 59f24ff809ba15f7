use crate::datastore::postfilters::PostFilters;
use crate::datastore::tables::{likes, posts, relationships, users};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest body a post may have, in characters.
pub const MAX_BODY_CHARS: usize = 1000;

/// A user of the website.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Parameters for the database statement which inserts new users.
#[derive(Insertable, Debug, Clone)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A post from a user
#[derive(
    Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Associations,
)]
#[belongs_to(User)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    /// Names of the stored images, in upload order. Never empty.
    pub images: Vec<String>,
    pub user_id: Uuid,
}

impl Post {
    #[allow(dead_code)]
    /// Does this post match all specified filters?
    pub fn matches(&self, filters: &PostFilters) -> bool {
        if let Some(uuid) = &filters.id {
            if uuid != &self.id {
                return false;
            }
        }
        if let Some(ids) = &filters.ids {
            if !ids.contains(&self.id) {
                return false;
            }
        }
        if let Some(user_id) = &filters.user_id {
            if user_id != &self.user_id {
                return false;
            }
        }
        if let Some(owners) = &filters.owned_by {
            if !owners.contains(&self.user_id) {
                return false;
            }
        }
        if let Some(substring) = &filters.body_contains {
            if !self.body.contains(substring.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable, Debug, Clone)]
#[table_name = "posts"]
pub struct NewPost {
    pub body: String,
    pub images: Vec<String>,
    pub user_id: Uuid,
}

/// An owner's edit of an existing post. Images are only replaced when new ones were uploaded.
#[derive(AsChangeset, Debug, Clone)]
#[table_name = "posts"]
pub struct PostChanges {
    pub body: String,
    pub images: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// A directed follow edge: `follower_id` sees `followed_id`'s posts in their feed.
#[derive(Queryable, Insertable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[table_name = "relationships"]
pub struct Relationship {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// `user_id` has liked `post_id`.
#[derive(Queryable, Insertable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[table_name = "likes"]
pub struct Like {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Checks a post's body and image list, collecting a message for every problem found.
pub fn post_errors(body: &str, image_count: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if image_count == 0 {
        errors.push("Images can't be blank".to_owned());
    }
    if body.trim().is_empty() {
        errors.push("Body can't be blank".to_owned());
    } else if body.chars().count() > MAX_BODY_CHARS {
        errors.push(format!(
            "Body is too long (maximum is {} characters)",
            MAX_BODY_CHARS
        ));
    }
    errors
}
