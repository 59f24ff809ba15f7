//! `twoface::Error` wraps a Rust error type with a user-facing description. This stops users from
//! seeing your internal errors, which might contain sensitive implementation details that should be
//! kept private.

mod extensions;
pub mod externalerror;
mod integrations;

pub use extensions::*;
pub use externalerror::{Cause, ExternalError};
pub use integrations::BlockingResp;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Wraps a Rust error type with a user-facing description. This stops users from seeing your internal
/// errors, which might contain sensitive implementation details that should be kept private.
#[derive(Debug)]
pub struct TfError {
    /// The underlying error, from some function. May contain sensitive information, so it should
    /// not be shown to users.
    pub internal: anyhow::Error,
    /// A user-friendly error that doesn't contain any sensitive information.
    pub external: ExternalError,
}

impl TfError {
    /// An error caused by the user rather than by a failing dependency. Nothing here is secret,
    /// so the internal half just repeats the external text.
    pub fn user(cause: Cause, text: &'static str) -> Self {
        TfError {
            internal: anyhow::anyhow!(text),
            external: ExternalError::new(cause, text),
        }
    }

    pub fn not_found(text: &'static str) -> Self {
        Self::user(Cause::NotFound, text)
    }

    /// A form was rejected. Every failed field is listed in `details`.
    pub fn invalid_fields(text: &'static str, details: Vec<String>) -> Self {
        TfError {
            internal: anyhow::anyhow!("{}: {}", text, details.join(", ")),
            external: ExternalError::invalid_fields(text, details),
        }
    }

    pub fn cause(&self) -> Cause {
        self.external.cause
    }
}

/// Displaying a twoface::Error will only display the external section. The internal error remains
/// private.
impl Display for TfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.external)
    }
}

/// Return type of a function that could fail. If it fails, it includes a twoface error (an error with
/// both internal- and external-facing values).
pub type Fallible<T> = Result<T, TfError>;
