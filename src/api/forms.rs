//! Reading multipart/form-data submissions.
use crate::images::UploadedImage;
use crate::twoface::{Cause, Describe, Fallible, TfError};
use actix_multipart::{Multipart, MultipartError};
use anyhow::anyhow;
use futures::TryStreamExt;

/// One field of a submitted form.
struct FormField {
    name: String,
    /// Set for file inputs, even when no file was chosen (then it's empty).
    filename: Option<String>,
    content_type: mime::Mime,
    bytes: Vec<u8>,
}

impl FormField {
    fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// Browsers submit a nameless, empty part for a file input with nothing selected.
    fn is_empty_file(&self) -> bool {
        self.filename.as_deref().map_or(false, str::is_empty) && self.bytes.is_empty()
    }

    fn into_image(self) -> UploadedImage {
        UploadedImage {
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

/// The post form: body text plus any number of image files.
#[derive(Debug, Default)]
pub struct PostForm {
    pub body: String,
    pub images: Vec<UploadedImage>,
}

impl PostForm {
    /// Check the body and image list, then that every image is of an accepted type.
    pub fn errors(&self) -> Vec<String> {
        let mut errors = crate::datastore::structs::post_errors(&self.body, self.images.len());
        if self.images.iter().any(|image| image.extension().is_none()) {
            errors.push("Images must be JPEG, PNG or GIF".to_owned());
        }
        errors
    }
}

pub async fn read_post_form(payload: Multipart, max_size: usize) -> Fallible<PostForm> {
    let mut form = PostForm::default();
    for field in read_fields(payload, max_size).await? {
        match field.name.as_str() {
            "body" | "post[body]" => {
                form.body = String::from_utf8(field.bytes)
                    .map_err(|e| e.describe_as(Cause::UserInvalidField, "Body must be UTF-8 text"))?
            }
            "images" | "images[]" | "post[images][]" if field.is_file() && !field.is_empty_file() => {
                form.images.push(field.into_image())
            }
            _ => {}
        }
    }
    Ok(form)
}

/// The file chosen in the preview form's `image` input, if any.
pub async fn read_preview_form(
    payload: Multipart,
    max_size: usize,
) -> Fallible<Option<UploadedImage>> {
    let file = read_fields(payload, max_size)
        .await?
        .into_iter()
        .find(|field| field.name == "image" && field.is_file() && !field.is_empty_file());
    Ok(file.map(FormField::into_image))
}

async fn read_fields(mut payload: Multipart, max_size: usize) -> Fallible<Vec<FormField>> {
    let mut fields = Vec::new();
    let mut total = 0;
    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let disposition = field.content_disposition();
        let name = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_owned();
        let filename = disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let content_type = field.content_type().clone();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            total += chunk.len();
            if total > max_size {
                return Err(TfError::user(
                    Cause::UserActionInvalid,
                    "Upload is too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        fields.push(FormField {
            name,
            filename,
            content_type,
            bytes,
        });
    }
    Ok(fields)
}

fn malformed(e: MultipartError) -> TfError {
    anyhow!("couldn't read multipart form: {}", e)
        .describe_as(Cause::UserActionInvalid, "Malformed multipart form")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(content_type: mime::Mime) -> UploadedImage {
        UploadedImage {
            content_type,
            bytes: vec![0; 4],
        }
    }

    #[test]
    fn test_post_form_errors() {
        let form = PostForm {
            body: "This is an example post".to_owned(),
            images: vec![image(mime::IMAGE_PNG)],
        };
        assert!(form.errors().is_empty());

        let form = PostForm {
            body: "This is an example post".to_owned(),
            images: vec![image(mime::IMAGE_PNG), image(mime::TEXT_PLAIN)],
        };
        assert_eq!(form.errors(), vec!["Images must be JPEG, PNG or GIF"]);

        assert_eq!(
            PostForm::default().errors(),
            vec!["Images can't be blank", "Body can't be blank"]
        );
    }
}
