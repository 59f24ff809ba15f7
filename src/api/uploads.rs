use crate::api::{forms::read_preview_form, observe, State};
use crate::datastore::Client;
use crate::images::preview::preview_src;
use crate::twoface::{Fallible, OrNotFound};
use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/uploads/{name}", web::get().to(get_image::<DS>))
        .route("/previews", web::post().to(preview::<DS>));
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Preview {
    /// Image source for the preview; empty when no file was chosen.
    pub src: String,
}

async fn get_image<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    name: web::Path<String>,
) -> Fallible<HttpResponse> {
    observe("get_image", || async {
        let image = state
            .images
            .load(name.into_inner())
            .await?
            .or_not_found("Image not found")?;
        Ok(HttpResponse::Ok()
            .header(header::CONTENT_TYPE, image.content_type.to_string())
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(image.bytes))
    })
    .await
}

// Render the chosen file inline, before the post form is submitted.
async fn preview<DS: Client + 'static>(
    state: web::Data<State<DS>>,
    payload: Multipart,
) -> Fallible<web::Json<Preview>> {
    observe("preview", || async {
        let file = read_preview_form(payload, state.max_upload_size).await?;
        Ok(web::Json(Preview {
            src: preview_src(file.as_ref()),
        }))
    })
    .await
}
