use crate::datastore::Client;
use crate::images::ImageStore;
use crate::metrics;
use crate::twoface::{Fallible, OrNotFound};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub mod accounts;
pub mod admin;
mod forms;
pub mod uploads;
pub mod userfacing;

/// Everything a handler needs, shared by all workers.
pub struct State<DS: ?Sized> {
    pub ds: Arc<DS>,
    pub images: Arc<dyn ImageStore>,
    /// Max bytes accepted in one multipart form
    pub max_upload_size: usize,
}

// Derive would require DS: Clone, but only the Arc is cloned.
impl<DS: ?Sized> Clone for State<DS> {
    fn clone(&self) -> Self {
        Self {
            ds: Arc::clone(&self.ds),
            images: Arc::clone(&self.images),
            max_upload_size: self.max_upload_size,
        }
    }
}

/// Just a post ID, extracted from the path of many endpoints.
#[derive(Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Clone, Copy)]
pub struct PostPath {
    pub post_id: Uuid,
}

/// Just a user ID, extracted from the path of many endpoints.
#[derive(Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Clone, Copy)]
pub struct UserPath {
    pub user_id: Uuid,
}

/// 404 unless the user exists.
async fn require_user<DS: Client + ?Sized>(ds: &DS, user_id: Uuid) -> Fallible<()> {
    ds.get_user(user_id).await?.or_not_found("User not found")?;
    Ok(())
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
