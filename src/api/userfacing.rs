//! For every business-logic struct in `datastore`, this module will have a matching struct
//! which redacts some business-sensitive fields.
use crate::api::{forms::read_post_form, observe, PostPath, State};
use crate::auth::Viewer;
use crate::datastore::{
    structs::{post_errors, NewPost, Post, PostChanges},
    Client,
};
use crate::feed::{annotate, FeedEntry, SearchPostsForm};
use crate::images::{url_for, ImageStore, UploadedImage};
use crate::metrics;
use crate::twoface::{Fallible, OrNotFound, TfError};
use actix_multipart::Multipart;
use actix_web::web;
use chrono::{offset::Utc, DateTime};
use serde::{self, Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("", web::get().to(list_posts::<DS>))
            .route("", web::post().to(write_post::<DS>))
            .route("/{post_id}", web::get().to(get_post::<DS>))
            .route("/{post_id}", web::patch().to(update_post::<DS>))
            .route("/{post_id}", web::delete().to(delete_post::<DS>))
            .route("/{post_id}/like", web::post().to(like_post::<DS>))
            .route("/{post_id}/like", web::delete().to(unlike_post::<DS>))
            .route("/{post_id}/like/toggle", web::put().to(toggle_like::<DS>)),
    );
}

/// A post as the viewer sees it, with the state of its like/edit/delete buttons.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct UserFacingPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    /// URLs of the post's images, in upload order.
    pub images: Vec<String>,
    pub liked: bool,
    pub editable: bool,
}

impl From<FeedEntry> for UserFacingPost {
    fn from(entry: FeedEntry) -> Self {
        let FeedEntry {
            post,
            liked,
            editable,
        } = entry;
        Self {
            id: post.id,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            images: post.images.iter().map(|name| url_for(name)).collect(),
            body: post.body,
            liked,
            editable,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeState {
    pub liked: bool,
}

/// Render posts the way `viewer` sees them.
pub(crate) async fn present<DS: Client + ?Sized>(
    ds: &DS,
    viewer: Option<Viewer>,
    posts: Vec<Post>,
) -> Fallible<Vec<UserFacingPost>> {
    let viewer = viewer.map(|v| v.user_id);
    let entries = annotate(ds, viewer, posts).await?;
    Ok(entries.into_iter().map(UserFacingPost::from).collect())
}

async fn present_one<DS: Client + ?Sized>(
    ds: &DS,
    viewer: Option<Viewer>,
    post: Post,
) -> Fallible<UserFacingPost> {
    let liked = match viewer {
        Some(viewer) => ds.is_liked(viewer.user_id, post.id).await?,
        None => false,
    };
    let entry = FeedEntry {
        editable: viewer.map(|v| v.user_id) == Some(post.user_id),
        liked,
        post,
    };
    Ok(entry.into())
}

/// Store every uploaded image. Returns their names, in upload order.
async fn save_images(
    store: &dyn ImageStore,
    uploads: Vec<UploadedImage>,
) -> Fallible<Vec<String>> {
    let mut names = Vec::with_capacity(uploads.len());
    for image in uploads {
        metrics::UPLOADED_BYTES.inc_by(image.bytes.len() as i64);
        names.push(store.save(image).await?);
    }
    Ok(names)
}

// The feed: own and followed users' posts, or every post for anonymous viewers.
async fn list_posts<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Option<Viewer>,
    search: web::Query<SearchPostsForm>,
) -> Fallible<web::Json<Vec<UserFacingPost>>> {
    observe("list_posts", || async {
        let posts = search
            .search(state.ds.as_ref(), viewer.map(|v| v.user_id))
            .await?;
        metrics::FEED_SIZE.observe(posts.len() as f64);
        Ok(web::Json(present(state.ds.as_ref(), viewer, posts).await?))
    })
    .await
}

// Insert a post into the datastore
async fn write_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    payload: Multipart,
) -> Fallible<web::Json<UserFacingPost>> {
    observe("write_post", || async {
        let form = read_post_form(payload, state.max_upload_size).await?;
        let errors = form.errors();
        if !errors.is_empty() {
            return Err(TfError::invalid_fields("Failed to create post", errors));
        }
        let new_post = NewPost {
            user_id: viewer.user_id,
            images: save_images(state.images.as_ref(), form.images).await?,
            body: form.body,
        };
        let post = state.ds.new_post(new_post).await?;
        info!(post_id = %post.id, user_id = %viewer.user_id, "created post");
        Ok(web::Json(present_one(state.ds.as_ref(), Some(viewer), post).await?))
    })
    .await
}

async fn get_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Option<Viewer>,
    path: web::Path<PostPath>,
) -> Fallible<web::Json<UserFacingPost>> {
    observe("get_post", || async {
        let post = state
            .ds
            .find_post(path.post_id)
            .await?
            .or_not_found("Post not found")?;
        Ok(web::Json(present_one(state.ds.as_ref(), viewer, post).await?))
    })
    .await
}

// Only the owner may edit. Images are replaced only if new ones were uploaded.
async fn update_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<PostPath>,
    payload: Multipart,
) -> Fallible<web::Json<UserFacingPost>> {
    observe("update_post", || async {
        let existing = state
            .ds
            .find_post(path.post_id)
            .await?
            .or_not_found("Post not found")?;
        if existing.user_id != viewer.user_id {
            return Err(TfError::not_found("Post not found"));
        }
        let form = read_post_form(payload, state.max_upload_size).await?;
        let errors = if form.images.is_empty() {
            // Nothing uploaded, so the post keeps the images it has
            post_errors(&form.body, existing.images.len())
        } else {
            form.errors()
        };
        if !errors.is_empty() {
            return Err(TfError::invalid_fields("Failed to update post", errors));
        }
        let images = if form.images.is_empty() {
            None
        } else {
            Some(save_images(state.images.as_ref(), form.images).await?)
        };
        let changes = PostChanges {
            body: form.body,
            images,
            updated_at: Utc::now(),
        };
        guard!(let Some(post) = state.ds.update_post(viewer.user_id, path.post_id, changes).await? else {
            return Err(TfError::not_found("Post not found"))
        });
        info!(post_id = %post.id, "updated post");
        Ok(web::Json(present_one(state.ds.as_ref(), Some(viewer), post).await?))
    })
    .await
}

async fn delete_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<PostPath>,
) -> Fallible<web::Json<UserFacingPost>> {
    observe("delete_post", || async {
        guard!(let Some(post) = state.ds.delete_post(viewer.user_id, path.post_id).await? else {
            return Err(TfError::not_found("Post not found"))
        });
        info!(post_id = %post.id, "deleted post");
        let entry = FeedEntry {
            post,
            liked: false,
            editable: true,
        };
        Ok(web::Json(entry.into()))
    })
    .await
}

async fn like_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<PostPath>,
) -> Fallible<web::Json<LikeState>> {
    observe("like_post", || async {
        state.ds.like(viewer.user_id, path.post_id).await?;
        Ok(web::Json(LikeState { liked: true }))
    })
    .await
}

async fn unlike_post<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<PostPath>,
) -> Fallible<web::Json<LikeState>> {
    observe("unlike_post", || async {
        state.ds.unlike(viewer.user_id, path.post_id).await?;
        Ok(web::Json(LikeState { liked: false }))
    })
    .await
}

async fn toggle_like<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<PostPath>,
) -> Fallible<web::Json<LikeState>> {
    observe("toggle_like", || async {
        let liked = state.ds.toggle_like(viewer.user_id, path.post_id).await?;
        Ok(web::Json(LikeState { liked }))
    })
    .await
}
