use crate::images::{content_type_of, ImageStore, StoredImage, UploadedImage};
use crate::twoface::{BlockingResp, Cause, Fallible, TfError};
use actix_web::web::block;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// An ImageStore keeping each image as one file in a directory.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Creates `root` if it doesn't exist yet.
    pub fn new(root: PathBuf) -> Result<Self, anyhow::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStore for FilesystemStore {
    async fn save(&self, image: UploadedImage) -> Fallible<String> {
        guard!(let Some(name) = image.stored_name() else {
            return Err(TfError::user(Cause::UserInvalidField, "Images must be JPEG, PNG or GIF"))
        });
        let path = self.root.join(&name);
        let bytes = image.bytes;
        let written = block(move || {
            // Same name means same content, so an existing file is already correct
            if path.exists() {
                return Ok(false);
            }
            std::fs::write(&path, bytes).map(|()| true)
        })
        .await
        .to_resp()?;
        debug!(name = &name[..], written, "stored image");
        Ok(name)
    }

    async fn load(&self, name: String) -> Fallible<Option<StoredImage>> {
        guard!(let Some(content_type) = content_type_of(&name) else {
            return Ok(None)
        });
        let path = self.root.join(&name);
        let bytes = block(move || match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        })
        .await
        .to_resp()?;
        Ok(bytes.map(|bytes| StoredImage {
            content_type,
            bytes,
        }))
    }
}
