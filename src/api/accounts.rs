use crate::accounts::{Login, Registration};
use crate::api::{observe, require_user, userfacing::present, userfacing::UserFacingPost, State, UserPath};
use crate::auth::{Tokens, Viewer};
use crate::datastore::{postfilters::PostFilters, structs::User, Client};
use crate::twoface::{Fallible, OrNotFound};
use actix_web::web;
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/sessions", web::post().to(login::<DS>)).service(
        web::scope("/users")
            .route("", web::post().to(register::<DS>))
            .route("/{user_id}", web::get().to(get_user::<DS>))
            .route("/{user_id}/follow", web::post().to(follow::<DS>))
            .route("/{user_id}/follow", web::delete().to(unfollow::<DS>))
            .route("/{user_id}/following", web::get().to(following::<DS>))
            .route("/{user_id}/likes", web::get().to(liked_posts::<DS>)),
    );
}

/// A subset of User that doesn't include the email or password hash.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct UserFacingUser {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserFacingUser {
    // Discard private fields to convert User into UserFacingUser
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            created_at: u.created_at,
        }
    }
}

/// A logged-in user and the bearer token for their next requests.
#[derive(Serialize, Deserialize, Debug)]
pub struct Session {
    pub user: UserFacingUser,
    pub token: String,
}

/// A user's page, as seen by the viewer.
#[derive(Serialize, Deserialize, Debug)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserFacingUser,
    /// The viewer follows this user. Always false for anonymous viewers.
    pub following: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FollowState {
    pub following: bool,
}

// Sign up. The new user is logged in straight away.
async fn register<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    tokens: web::Data<Tokens>,
    body: web::Json<Registration>,
) -> Fallible<web::Json<Session>> {
    observe("register", || async {
        let user = body.into_inner().register(state.ds.as_ref()).await?;
        let token = tokens.issue(user.id)?;
        Ok(web::Json(Session {
            user: user.into(),
            token,
        }))
    })
    .await
}

async fn login<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    tokens: web::Data<Tokens>,
    body: web::Json<Login>,
) -> Fallible<web::Json<Session>> {
    observe("login", || async {
        let user = body.into_inner().authenticate(state.ds.as_ref()).await?;
        info!(user_id = %user.id, "logged in");
        let token = tokens.issue(user.id)?;
        Ok(web::Json(Session {
            user: user.into(),
            token,
        }))
    })
    .await
}

async fn get_user<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Option<Viewer>,
    path: web::Path<UserPath>,
) -> Fallible<web::Json<Profile>> {
    observe("get_user", || async {
        let user = state
            .ds
            .get_user(path.user_id)
            .await?
            .or_not_found("User not found")?;
        let following = match viewer {
            Some(viewer) => state.ds.is_following(viewer.user_id, user.id).await?,
            None => false,
        };
        Ok(web::Json(Profile {
            user: user.into(),
            following,
        }))
    })
    .await
}

async fn follow<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<UserPath>,
) -> Fallible<web::Json<FollowState>> {
    observe("follow", || async {
        let created = state.ds.follow(viewer.user_id, path.user_id).await?;
        info!(follower = %viewer.user_id, followed = %path.user_id, created, "follow");
        Ok(web::Json(FollowState { following: true }))
    })
    .await
}

async fn unfollow<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Viewer,
    path: web::Path<UserPath>,
) -> Fallible<web::Json<FollowState>> {
    observe("unfollow", || async {
        let removed = state.ds.unfollow(viewer.user_id, path.user_id).await?;
        info!(follower = %viewer.user_id, followed = %path.user_id, removed, "unfollow");
        Ok(web::Json(FollowState { following: false }))
    })
    .await
}

// Everyone the user follows
async fn following<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    path: web::Path<UserPath>,
) -> Fallible<web::Json<Vec<UserFacingUser>>> {
    observe("following", || async {
        require_user(state.ds.as_ref(), path.user_id).await?;
        let mut users = Vec::new();
        for user_id in state.ds.following(path.user_id).await? {
            if let Some(user) = state.ds.get_user(user_id).await? {
                users.push(user.into());
            }
        }
        Ok(web::Json(users))
    })
    .await
}

// Every post the user has liked, rendered for whoever is asking
async fn liked_posts<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    viewer: Option<Viewer>,
    path: web::Path<UserPath>,
) -> Fallible<web::Json<Vec<UserFacingPost>>> {
    observe("liked_posts", || async {
        require_user(state.ds.as_ref(), path.user_id).await?;
        let ids = state.ds.liked_post_ids(path.user_id).await?;
        let filters = PostFilters {
            ids: Some(ids),
            ..Default::default()
        };
        let posts = state.ds.list_posts(filters).await?;
        Ok(web::Json(present(state.ds.as_ref(), viewer, posts).await?))
    })
    .await
}
