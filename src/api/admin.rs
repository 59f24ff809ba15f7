use crate::api::{observe, State};
use crate::datastore::{postfilters::PostFilters, structs::Post, Client};
use crate::twoface::Fallible;
use actix_web::web;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/posts").route(web::get().to(list_all_posts::<DS>)));
}

// Admin endpoint. Unlike the feed, any post can be listed with any filter.
async fn list_all_posts<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    filters: web::Query<PostFilters>,
) -> Fallible<web::Json<Vec<Post>>> {
    observe("admin_list_posts", || async {
        let data = state.ds.list_posts(filters.into_inner()).await?;
        Ok(web::Json(data))
    })
    .await
}
