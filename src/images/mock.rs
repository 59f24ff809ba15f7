use crate::images::{content_type_of, StoredImage, UploadedImage};
use crate::twoface::{Cause, Fallible, TfError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A mock implementation of images::ImageStore, kept in memory.
#[derive(Clone, Default, Debug)]
pub struct ImageStore {
    images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl ImageStore {
    pub fn len(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl super::ImageStore for ImageStore {
    async fn save(&self, image: UploadedImage) -> Fallible<String> {
        guard!(let Some(name) = image.stored_name() else {
            return Err(TfError::user(Cause::UserInvalidField, "Images must be JPEG, PNG or GIF"))
        });
        self.images
            .lock()
            .unwrap()
            .insert(name.clone(), image.bytes);
        Ok(name)
    }

    async fn load(&self, name: String) -> Fallible<Option<StoredImage>> {
        guard!(let Some(content_type) = content_type_of(&name) else {
            return Ok(None)
        });
        let images = self.images.lock().unwrap();
        Ok(images.get(&name).map(|bytes| StoredImage {
            content_type,
            bytes: bytes.clone(),
        }))
    }
}
