use crate::datastore::{
    postfilters::{like_pattern, PostFilters},
    postgres::{
        errors::{conflict_as, missing_as, DbPoolResult},
        PostgresStore,
    },
    structs::{Like, NewPost, NewUser, Post, PostChanges, Relationship, User},
    tables::{likes, posts, relationships, users},
    Client,
};
use crate::twoface::{BlockingResp, Fallible};
use actix_web::web::block;
use async_trait::async_trait;
use chrono::offset::Utc;
use diesel::{
    dsl::exists,
    expression::BoxableExpression,
    pg::Pg,
    query_dsl::{QueryDsl, RunQueryDsl},
    result::Error as DieselError,
    sql_types::Bool,
    Connection, ExpressionMethods, OptionalExtension, TextExpressionMethods,
};
use uuid::Uuid;

#[async_trait]
impl Client for PostgresStore {
    async fn new_user(&self, new_user: NewUser) -> Fallible<User> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<User> = block(move || {
            diesel::insert_into(users::table)
                .values(&new_user)
                .get_result(&conn)
        })
        .await;
        conflict_as(query_result, "Email has already been taken")
    }

    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = users::table.find(user_id).get_result(&conn).optional()?;
            Ok(user)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_user_by_email(&self, email: String) -> Fallible<Option<User>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = users::table
                .filter(users::email.eq(email))
                .first(&conn)
                .optional()?;
            Ok(user)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<Post> = block(move || {
            diesel::insert_into(posts::table)
                .values(&new_post)
                .get_result(&conn)
        })
        .await;
        // The author's account may have been deleted since their token was issued
        missing_as(query_result, "User not found")
    }

    async fn list_posts(&self, filters: PostFilters) -> Fallible<Vec<Post>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            // Get posts. Every filter is a WHERE on `posts` alone, so no row can repeat.
            let mut query = posts::table.into_boxed();
            for filter in filters.as_sql_where() {
                query = query.filter(filter);
            }
            if let Some(limit) = filters.limit {
                query = query.limit(i64::from(limit));
            }
            let posts = query
                .order_by((posts::created_at.asc(), posts::id.asc()))
                .get_results(&conn)?;

            Ok(posts)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_post(&self, id: Uuid) -> Fallible<Option<Post>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target_post: Option<Post> = posts::table.find(id).first(&conn).optional()?;
            Ok(target_post)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn update_post(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: PostChanges,
    ) -> Fallible<Option<Post>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target = posts::table.find(id);
            let post: Option<Post> = diesel::update(target)
                .filter(posts::user_id.eq(user_id))
                .set(&changes)
                .get_result(&conn)
                .optional()?;
            Ok(post)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn delete_post(&self, user_id: Uuid, id: Uuid) -> Fallible<Option<Post>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            // The post's likes are removed by ON DELETE CASCADE
            let target = posts::table.find(id).filter(posts::user_id.eq(user_id));
            let post: Option<Post> = diesel::delete(target).get_result(&conn).optional()?;
            Ok(post)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let inserted = diesel::insert_into(relationships::table)
                .values(&Relationship {
                    follower_id,
                    followed_id,
                    created_at: Utc::now(),
                })
                .on_conflict_do_nothing()
                .execute(&conn)?;
            Ok(inserted > 0)
        })
        .await;
        missing_as(query_result, "User not found")
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target = relationships::table
                .filter(relationships::follower_id.eq(follower_id))
                .filter(relationships::followed_id.eq(followed_id));
            let deleted = diesel::delete(target).execute(&conn)?;
            Ok(deleted > 0)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            let users_they_follow: Vec<Uuid> = relationships::table
                .filter(relationships::follower_id.eq(user_id))
                .order_by(relationships::created_at)
                .select(relationships::followed_id)
                .load(&conn)?;
            Ok(users_they_follow)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            diesel::select(exists(
                relationships::table
                    .filter(relationships::follower_id.eq(follower_id))
                    .filter(relationships::followed_id.eq(followed_id)),
            ))
            .get_result::<bool>(&conn)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || insert_like(&conn, user_id, post_id)).await;
        missing_as(query_result, "Post not found")
    }

    async fn unlike(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || delete_like(&conn, user_id, post_id)).await;
        Ok(query_result.to_resp()?)
    }

    async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            conn.transaction::<_, DieselError, _>(|| {
                if delete_like(&conn, user_id, post_id)? {
                    return Ok(false);
                }
                // A concurrent toggle may have inserted first; the key makes that a no-op.
                insert_like(&conn, user_id, post_id)?;
                Ok(true)
            })
        })
        .await;
        missing_as(query_result, "Post not found")
    }

    async fn is_liked(&self, user_id: Uuid, post_id: Uuid) -> Fallible<bool> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            diesel::select(exists(
                likes::table
                    .filter(likes::user_id.eq(user_id))
                    .filter(likes::post_id.eq(post_id)),
            ))
            .get_result::<bool>(&conn)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn liked_post_ids(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        let conn = self.conn()?;
        let query_result: DbPoolResult<_> = block(move || {
            likes::table
                .filter(likes::user_id.eq(user_id))
                .order_by(likes::created_at)
                .select(likes::post_id)
                .load::<Uuid>(&conn)
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}

fn insert_like(conn: &diesel::PgConnection, user_id: Uuid, post_id: Uuid) -> Result<bool, DieselError> {
    let inserted = diesel::insert_into(likes::table)
        .values(&Like {
            user_id,
            post_id,
            created_at: Utc::now(),
        })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

fn delete_like(conn: &diesel::PgConnection, user_id: Uuid, post_id: Uuid) -> Result<bool, DieselError> {
    let target = likes::table
        .filter(likes::user_id.eq(user_id))
        .filter(likes::post_id.eq(post_id));
    let deleted = diesel::delete(target).execute(conn)?;
    Ok(deleted > 0)
}

impl PostFilters {
    pub fn as_sql_where(
        &self,
    ) -> Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> {
        let mut wheres: Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> =
            Vec::new();
        if let Some(id) = self.id {
            wheres.push(Box::new(posts::id.eq(id)))
        }
        if let Some(ids) = &self.ids {
            wheres.push(Box::new(posts::id.eq_any(ids.clone())))
        }
        if let Some(user_id) = self.user_id {
            wheres.push(Box::new(posts::user_id.eq(user_id)))
        }
        if let Some(owners) = &self.owned_by {
            wheres.push(Box::new(posts::user_id.eq_any(owners.clone())))
        }
        if let Some(substring) = &self.body_contains {
            wheres.push(Box::new(posts::body.like(like_pattern(substring))))
        }
        wheres
    }
}
