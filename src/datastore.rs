#[cfg(test)]
pub mod mock;
pub mod postfilters;
pub mod postgres;
pub mod structs;
pub mod tables;

use crate::datastore::structs::{NewPost, NewUser, Post, PostChanges, User};
use crate::twoface::Fallible;
use async_trait::async_trait;
use postfilters::PostFilters;
use uuid::Uuid;

#[async_trait]
/// The interface for storing users, posts and the follow/like edges between them.
pub trait Client: Send + Sync {
    // Users
    async fn new_user(&self, new_user: NewUser) -> Fallible<User>;
    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>>;
    async fn find_user_by_email(&self, email: String) -> Fallible<Option<User>>;

    // Posts
    async fn new_post(&self, new_post: NewPost) -> Fallible<Post>;
    /// Posts matching every filter, oldest first. No post is returned twice.
    async fn list_posts(&self, filters: PostFilters) -> Fallible<Vec<Post>>;
    async fn find_post(&self, post_id: Uuid) -> Fallible<Option<Post>>;
    /// Returns None unless `user_id` owns the post.
    async fn update_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>>;
    /// Returns None unless `user_id` owns the post. The post's likes go with it.
    async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Fallible<Option<Post>>;

    // Follow graph
    /// True if a new edge was created, false if it already existed.
    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool>;
    /// True if an edge was removed, false if there was none.
    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool>;
    /// Ids of every user `user_id` follows.
    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>>;
    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool>;

    // Likes
    /// True if a new like was recorded, false if the post was already liked.
    async fn like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool>;
    /// True if a like was removed, false if there was none.
    async fn unlike(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool>;
    /// Flip the like atomically and return the new state.
    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool>;
    async fn is_liked(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool>;
    async fn liked_post_ids(&self, user_id: Uuid) -> Fallible<Vec<Uuid>>;
}
