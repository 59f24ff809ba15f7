//! Storage for the images attached to posts. Images are stored under content-addressed names
//! (`<sha256 hex>.<ext>`), so uploading the same picture twice stores it once.
pub mod filesystem;
#[cfg(test)]
pub mod mock;
pub mod preview;

use crate::twoface::Fallible;
use async_trait::async_trait;
use mime::Mime;
use sha2::{Digest, Sha256};

/// A file the user attached to a form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// An image read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// The file extension images of this type are stored with, or None if the type isn't
    /// accepted for posts.
    pub fn extension(&self) -> Option<&'static str> {
        extension_for(&self.content_type)
    }

    /// Name the image is stored under. None if the type isn't accepted for posts.
    pub fn stored_name(&self) -> Option<String> {
        let ext = self.extension()?;
        Some(format!("{}.{}", hex::encode(Sha256::digest(&self.bytes)), ext))
    }
}

fn extension_for(content_type: &Mime) -> Option<&'static str> {
    if content_type.type_() != mime::IMAGE {
        return None;
    }
    match content_type.subtype().as_str() {
        "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        _ => None,
    }
}

/// The content type of a stored image, judging by its name. None for names the store would
/// never have produced, which also rules out path traversal.
pub fn content_type_of(name: &str) -> Option<Mime> {
    let mut parts = name.splitn(2, '.');
    let digest = parts.next()?;
    let ext = parts.next()?;
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match ext {
        "jpg" => Some(mime::IMAGE_JPEG),
        "png" => Some(mime::IMAGE_PNG),
        "gif" => Some(mime::IMAGE_GIF),
        _ => None,
    }
}

/// Path the API serves a stored image from.
pub fn url_for(name: &str) -> String {
    format!("/uploads/{}", name)
}

#[async_trait]
/// The interface for storing uploaded images.
pub trait ImageStore: Send + Sync {
    /// Persist the image and return the name it's stored under.
    async fn save(&self, image: UploadedImage) -> Fallible<String>;
    async fn load(&self, name: String) -> Fallible<Option<StoredImage>>;
}
