//! The post listing a viewer sees: their own posts and the posts of everyone they follow,
//! optionally narrowed down to bodies containing a search term. Anonymous viewers see every post.
use crate::datastore::{postfilters::PostFilters, structs::Post, Client};
use crate::twoface::Fallible;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

/// The feed's search form.
#[derive(Default, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchPostsForm {
    pub body: Option<String>,
}

impl SearchPostsForm {
    /// The search term exactly as typed, or None if the form was left blank.
    pub fn term(&self) -> Option<&str> {
        self.body
            .as_deref()
            .filter(|term| !term.trim().is_empty())
    }

    /// Datastore filters selecting what `viewer` should see.
    pub async fn filters<DS: Client + ?Sized>(
        &self,
        ds: &DS,
        viewer: Option<Uuid>,
    ) -> Fallible<PostFilters> {
        let owned_by = match viewer {
            Some(viewer) => {
                let mut owners = ds.following(viewer).await?;
                owners.push(viewer);
                let mut seen = HashSet::new();
                owners.retain(|id| seen.insert(*id));
                Some(owners)
            }
            None => None,
        };
        Ok(PostFilters {
            owned_by,
            body_contains: self.term().map(str::to_owned),
            ..Default::default()
        })
    }

    pub async fn search<DS: Client + ?Sized>(
        &self,
        ds: &DS,
        viewer: Option<Uuid>,
    ) -> Fallible<Vec<Post>> {
        let filters = self.filters(ds, viewer).await?;
        ds.list_posts(filters).await
    }
}

/// A post, plus the state of its buttons for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub post: Post,
    /// The viewer has liked this post.
    pub liked: bool,
    /// The viewer owns this post, so may edit or delete it.
    pub editable: bool,
}

/// Attach per-viewer button state to each post. Anonymous viewers can't like or edit anything.
pub async fn annotate<DS: Client + ?Sized>(
    ds: &DS,
    viewer: Option<Uuid>,
    posts: Vec<Post>,
) -> Fallible<Vec<FeedEntry>> {
    let liked: HashSet<Uuid> = match viewer {
        Some(viewer) => ds.liked_post_ids(viewer).await?.into_iter().collect(),
        None => HashSet::new(),
    };
    Ok(posts
        .into_iter()
        .map(|post| FeedEntry {
            liked: liked.contains(&post.id),
            editable: Some(post.user_id) == viewer,
            post,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::mock;

    fn form(body: &str) -> SearchPostsForm {
        SearchPostsForm {
            body: Some(body.to_owned()),
        }
    }

    fn bodies(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.body.as_str()).collect()
    }

    #[test]
    fn test_blank_term_means_no_search() {
        assert_eq!(SearchPostsForm::default().term(), None);
        assert_eq!(form("   ").term(), None);
        assert_eq!(form("  cat ").term(), Some("  cat "));
    }

    #[actix_rt::test]
    async fn test_viewer_sees_own_and_followed_posts_only() {
        let ds = mock::Client::default();
        let user = ds.add_user("user");
        let followed = ds.add_user("followed");
        let stranger = ds.add_user("stranger");
        ds.add_post(followed.id, "post 1 by others");
        ds.add_post(stranger.id, "post 2 by others");
        ds.add_post(user.id, "post by user");
        ds.follow(user.id, followed.id).await.unwrap();

        let posts = SearchPostsForm::default()
            .search(&ds, Some(user.id))
            .await
            .unwrap();
        assert_eq!(bodies(&posts), vec!["post 1 by others", "post by user"]);
    }

    #[actix_rt::test]
    async fn test_anonymous_viewer_sees_everything() {
        let ds = mock::Client::default();
        let user = ds.add_user("user");
        let other = ds.add_user("other");
        ds.add_post(other.id, "post 1 by others");
        ds.add_post(other.id, "post 2 by others");
        ds.add_post(user.id, "post by user");

        let posts = SearchPostsForm::default().search(&ds, None).await.unwrap();
        assert_eq!(posts.len(), 3);
    }

    #[actix_rt::test]
    async fn test_search_narrows_the_unsearched_feed() {
        let ds = mock::Client::default();
        let user = ds.add_user("user");
        let followed = ds.add_user("followed");
        let stranger = ds.add_user("stranger");
        ds.add_post(user.id, "a cat on a mat");
        ds.add_post(followed.id, "a dog on a log");
        ds.add_post(followed.id, "cats everywhere");
        ds.add_post(stranger.id, "a cat nobody follows");
        ds.follow(user.id, followed.id).await.unwrap();

        for viewer in vec![None, Some(user.id)] {
            let everything = SearchPostsForm::default().search(&ds, viewer).await.unwrap();
            let searched = form("cat").search(&ds, viewer).await.unwrap();
            let expected: Vec<Post> = everything
                .into_iter()
                .filter(|p| p.body.contains("cat"))
                .collect();
            assert_eq!(searched, expected);
        }
        // Surrounding spaces are part of the term
        let searched = form(" cat ").search(&ds, Some(user.id)).await.unwrap();
        assert_eq!(bodies(&searched), vec!["a cat on a mat"]);
    }

    #[actix_rt::test]
    async fn test_self_follow_does_not_duplicate_posts() {
        let ds = mock::Client::default();
        let user = ds.add_user("user");
        ds.add_post(user.id, "mine");
        ds.follow(user.id, user.id).await.unwrap();

        let filters = SearchPostsForm::default()
            .filters(&ds, Some(user.id))
            .await
            .unwrap();
        assert_eq!(filters.owned_by, Some(vec![user.id]));
        let posts = SearchPostsForm::default()
            .search(&ds, Some(user.id))
            .await
            .unwrap();
        assert_eq!(bodies(&posts), vec!["mine"]);
    }

    #[actix_rt::test]
    async fn test_annotate_marks_likes_and_ownership() {
        let ds = mock::Client::default();
        let user = ds.add_user("user");
        let other = ds.add_user("other");
        let mine = ds.add_post(user.id, "mine");
        let theirs = ds.add_post(other.id, "theirs");
        ds.like(user.id, theirs.id).await.unwrap();

        let entries = annotate(&ds, Some(user.id), vec![mine.clone(), theirs.clone()])
            .await
            .unwrap();
        assert_eq!((entries[0].liked, entries[0].editable), (false, true));
        assert_eq!((entries[1].liked, entries[1].editable), (true, false));

        let anonymous = annotate(&ds, None, vec![mine, theirs]).await.unwrap();
        assert!(anonymous.iter().all(|e| !e.liked && !e.editable));
    }
}
