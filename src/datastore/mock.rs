use crate::datastore::{
    postfilters::PostFilters,
    structs::{Like, NewPost, NewUser, Post, PostChanges, Relationship, User},
};
use crate::twoface::{Cause, Fallible, TfError};
use async_trait::async_trait;
use chrono::offset::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Store<T> = Arc<Mutex<Vec<T>>>;

/// A mock implementation of datastore::Client
#[derive(Clone, Default, Debug)]
pub struct Client {
    users: Store<User>,
    posts: Store<Post>,
    relationships: Store<Relationship>,
    likes: Store<Like>,
}

impl Client {
    /// Insert a user with a throwaway password hash.
    pub fn add_user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            username: username.to_owned(),
            email: format!("{}@example.com", username),
            password_hash: String::new(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    /// Insert a one-image post owned by `user_id`.
    pub fn add_post(&self, user_id: Uuid, body: &str) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            body: body.to_owned(),
            images: vec!["fixture.png".to_owned()],
            user_id,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn like_count(&self) -> usize {
        self.likes.lock().unwrap().len()
    }

    // Stand-ins for the foreign keys on `likes` and `relationships`
    fn require_post(&self, post_id: Uuid) -> Fallible<()> {
        if self.posts.lock().unwrap().iter().any(|p| p.id == post_id) {
            Ok(())
        } else {
            Err(TfError::not_found("Post not found"))
        }
    }

    fn require_user(&self, user_id: Uuid) -> Fallible<()> {
        if self.users.lock().unwrap().iter().any(|u| u.id == user_id) {
            Ok(())
        } else {
            Err(TfError::not_found("User not found"))
        }
    }
}

#[async_trait]
impl super::Client for Client {
    async fn new_user(&self, new_user: NewUser) -> Fallible<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(TfError::user(Cause::UserConflict, "Email has already been taken"));
        }
        let user = User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: String) -> Fallible<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        self.require_user(new_post.user_id)?;
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: new_post.body,
            images: new_post.images,
            user_id: new_post.user_id,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self, filters: PostFilters) -> Fallible<Vec<Post>> {
        let all_posts = self.posts.lock().unwrap();
        let limit = filters.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let posts = all_posts
            .iter()
            .filter(|t| t.matches(&filters))
            .take(limit)
            .cloned()
            .collect();
        Ok(posts)
    }

    async fn find_post(&self, post_id: Uuid) -> Fallible<Option<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.iter().find(|t| t.id == post_id).cloned())
    }

    async fn update_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|t| t.id == post_id && t.user_id == user_id)
            .map(|post| {
                post.body = changes.body;
                if let Some(images) = changes.images {
                    post.images = images;
                }
                post.updated_at = changes.updated_at;
                post.clone()
            });
        Ok(post)
    }

    async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Fallible<Option<Post>> {
        let mut posts = self.posts.lock().unwrap();
        guard!(let Some(i) = posts.iter().position(|t| t.id == post_id && t.user_id == user_id) else {
            return Ok(None)
        });
        let post = posts.remove(i);
        self.likes.lock().unwrap().retain(|l| l.post_id != post_id);
        Ok(Some(post))
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        self.require_user(follower_id)?;
        self.require_user(followed_id)?;
        let mut edges = self.relationships.lock().unwrap();
        if edges
            .iter()
            .any(|r| r.follower_id == follower_id && r.followed_id == followed_id)
        {
            return Ok(false);
        }
        edges.push(Relationship {
            follower_id,
            followed_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        let mut edges = self.relationships.lock().unwrap();
        let before = edges.len();
        edges.retain(|r| !(r.follower_id == follower_id && r.followed_id == followed_id));
        Ok(edges.len() != before)
    }

    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        let edges = self.relationships.lock().unwrap();
        Ok(edges
            .iter()
            .filter(|r| r.follower_id == user_id)
            .map(|r| r.followed_id)
            .collect())
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        let edges = self.relationships.lock().unwrap();
        Ok(edges
            .iter()
            .any(|r| r.follower_id == follower_id && r.followed_id == followed_id))
    }

    async fn like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        self.require_user(user_id)?;
        self.require_post(post_id)?;
        let mut likes = self.likes.lock().unwrap();
        if likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Ok(false);
        }
        likes.push(Like {
            user_id,
            post_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn unlike(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let mut likes = self.likes.lock().unwrap();
        let before = likes.len();
        likes.retain(|l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(likes.len() != before)
    }

    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        self.require_user(user_id)?;
        self.require_post(post_id)?;
        // One lock for the whole read-modify-write, like a DB transaction
        let mut likes = self.likes.lock().unwrap();
        match likes
            .iter()
            .position(|l| l.user_id == user_id && l.post_id == post_id)
        {
            Some(i) => {
                likes.remove(i);
                Ok(false)
            }
            None => {
                likes.push(Like {
                    user_id,
                    post_id,
                    created_at: Utc::now(),
                });
                Ok(true)
            }
        }
    }

    async fn is_liked(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let likes = self.likes.lock().unwrap();
        Ok(likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id))
    }

    async fn liked_post_ids(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        let likes = self.likes.lock().unwrap();
        Ok(likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.post_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::Client as _;

    #[actix_rt::test]
    async fn test_follow_is_idempotent() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let bob = ds.add_user("bob");

        assert!(ds.follow(alice.id, bob.id).await.unwrap());
        assert!(!ds.follow(alice.id, bob.id).await.unwrap());
        assert_eq!(ds.following(alice.id).await.unwrap(), vec![bob.id]);
        assert!(ds.is_following(alice.id, bob.id).await.unwrap());
        assert!(!ds.is_following(bob.id, alice.id).await.unwrap());

        assert!(ds.unfollow(alice.id, bob.id).await.unwrap());
        assert!(!ds.unfollow(alice.id, bob.id).await.unwrap());
        assert!(ds.following(alice.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_like_counts_once() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let post = ds.add_post(alice.id, "hello");

        assert!(ds.like(alice.id, post.id).await.unwrap());
        assert_eq!(ds.liked_post_ids(alice.id).await.unwrap().len(), 1);
        assert!(!ds.like(alice.id, post.id).await.unwrap());
        assert_eq!(ds.liked_post_ids(alice.id).await.unwrap().len(), 1);

        assert!(ds.unlike(alice.id, post.id).await.unwrap());
        assert!(ds.liked_post_ids(alice.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_edges_to_missing_rows_are_not_found() {
        let ds = Client::default();
        let alice = ds.add_user("alice");

        let err = ds.like(alice.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.cause(), Cause::NotFound);
        let err = ds.toggle_like(alice.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.cause(), Cause::NotFound);
        assert_eq!(ds.like_count(), 0);

        let err = ds.follow(alice.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.cause(), Cause::NotFound);
        assert!(ds.following(alice.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_toggle_flips_state() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let post = ds.add_post(alice.id, "hello");

        assert!(ds.toggle_like(alice.id, post.id).await.unwrap());
        assert!(ds.is_liked(alice.id, post.id).await.unwrap());
        assert!(!ds.toggle_like(alice.id, post.id).await.unwrap());
        assert!(!ds.is_liked(alice.id, post.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_only_owner_can_delete_and_likes_go_too() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let bob = ds.add_user("bob");
        let post = ds.add_post(alice.id, "hello");
        ds.like(bob.id, post.id).await.unwrap();

        assert_eq!(ds.delete_post(bob.id, post.id).await.unwrap(), None);
        assert_eq!(ds.post_count(), 1);

        let deleted = ds.delete_post(alice.id, post.id).await.unwrap();
        assert_eq!(deleted.map(|p| p.id), Some(post.id));
        assert_eq!(ds.post_count(), 0);
        assert_eq!(ds.like_count(), 0);
    }

    #[actix_rt::test]
    async fn test_update_keeps_images_unless_replaced() {
        let ds = Client::default();
        let alice = ds.add_user("alice");
        let post = ds.add_post(alice.id, "hello");

        let updated = ds
            .update_post(
                alice.id,
                post.id,
                PostChanges {
                    body: "edited".to_owned(),
                    images: None,
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "edited");
        assert_eq!(updated.images, post.images);

        let replaced = ds
            .update_post(
                alice.id,
                post.id,
                PostChanges {
                    body: "edited again".to_owned(),
                    images: Some(vec!["new.png".to_owned()]),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.images, vec!["new.png".to_owned()]);
    }
}
