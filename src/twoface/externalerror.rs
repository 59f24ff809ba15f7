use actix_web::http::StatusCode;
use std::fmt;

/// Used to create HTTP responses with the given text and status code.
#[derive(Debug)]
pub struct ExternalError {
    /// A user-facing explanation of what caused the error.
    pub cause: Cause,
    /// Error text that will describe the problem to the user.
    pub text: &'static str,
    /// One message per rejected form field, e.g. "Body can't be blank".
    pub details: Vec<String>,
}

/// A user-facing explanation of what caused the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    ServerError,
    UserActionInvalid,
    UserBadAuth,
    UserConflict,
    UserInvalidField,
    NotFound,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        // Make fmt::Display the same as fmt::Debug, i.e. each variant's name.
        write!(f, "{:?}", self)
    }
}

impl From<Cause> for StatusCode {
    /// Causes can be mapped to HTTP status codes. ExternalError doesn't use status codes directly,
    /// because some components (e.g. the Datastore) shouldn't need to know about HTTP codes.
    fn from(cause: Cause) -> StatusCode {
        match cause {
            Cause::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Cause::UserActionInvalid => StatusCode::BAD_REQUEST,
            Cause::UserInvalidField => StatusCode::BAD_REQUEST,
            Cause::UserBadAuth => StatusCode::UNAUTHORIZED,
            Cause::UserConflict => StatusCode::CONFLICT,
            Cause::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl ExternalError {
    pub fn new(cause: Cause, text: &'static str) -> Self {
        Self {
            cause,
            text,
            details: Vec::new(),
        }
    }

    /// A form submission was rejected. `details` lists every field that failed validation.
    pub fn invalid_fields(text: &'static str, details: Vec<String>) -> Self {
        Self {
            cause: Cause::UserInvalidField,
            text,
            details,
        }
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}: {}", self.cause, self.text)
    }
}

impl Default for ExternalError {
    // Default to ServerError and a very vague generic message.
    fn default() -> Self {
        Self::new(Cause::ServerError, "Internal server error")
    }
}
