//! Integrate twoface with other libraries, like Actix-web or Diesel.

use crate::twoface::{ExternalError, Fallible, TfError};
use actix_web::{
    error::BlockingError,
    http::{header, StatusCode},
    HttpResponse,
};
use anyhow::anyhow;
use serde::Serialize;
use tracing::error;

/// Convenience extension used to extract errors from `web::block`.
pub trait BlockingResp<T> {
    /// Convert the return from a web::block into a normal `Fallible<T>`.
    fn to_resp(self) -> Fallible<T>;
}

impl<T, I: std::fmt::Debug + Into<TfError>> BlockingResp<T> for Result<T, BlockingError<I>> {
    fn to_resp(self) -> Fallible<T> {
        match self {
            Ok(t) => Ok(t),
            Err(BlockingError::Error(err)) => Err(err.into()),
            Err(BlockingError::Canceled) => Err(TfError {
                internal: anyhow!("blocking operation cancelled"),
                external: ExternalError::default(),
            }),
        }
    }
}

// Twoface errors can be used as Actix-web errors.
// If a handler returns a Twoface error, the external portion will be shown to the user.
// The internal portion will only be logged.
impl actix_web::ResponseError for TfError {
    fn status_code(&self) -> StatusCode {
        self.cause().into()
    }

    fn error_response(&self) -> HttpResponse {
        error!(cause = %self.external.cause, "{:#}", self.internal);
        let resp = serde_json::to_string(&ErrBody {
            error: self.to_string(),
            details: self.external.details.clone(),
        })
        .unwrap_or_else(|e| {
            error!("Serde error: {}", e.to_string());
            "{\"error\": \"ServerError: internal server error\"}".to_owned()
        });
        HttpResponse::build(self.status_code())
            .header(header::CONTENT_TYPE, "application/json")
            .body(resp)
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}
