//! Convenience methods to turn any error (from any library) into twoface errors.
use crate::twoface::{Cause, ExternalError, Fallible, TfError};

pub trait Describe {
    /// Convert an error into a twoface::Error by describing it to your users.
    fn describe(self, external: ExternalError) -> TfError;

    /// Shorthand for `describe(ExternalError::new(cause, text))`.
    fn describe_as(self, cause: Cause, text: &'static str) -> TfError
    where
        Self: Sized,
    {
        self.describe(ExternalError::new(cause, text))
    }
}

impl<Internal: Into<anyhow::Error>> Describe for Internal {
    fn describe(self, external: ExternalError) -> TfError {
        TfError {
            internal: self.into(),
            external,
        }
    }
}

/// Any regular internal error can be turned into a twoface Error, using the default external error.
impl<Internal: Into<anyhow::Error>> From<Internal> for TfError {
    fn from(internal: Internal) -> TfError {
        internal.describe(Default::default())
    }
}

pub trait DescribeErr<T> {
    /// Convert a result's error into a twoface::Error by describing it to your users.
    fn describe_err(self, external: ExternalError) -> Fallible<T>;
}

impl<T, E> DescribeErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn describe_err(self, external: ExternalError) -> Fallible<T> {
        self.map_err(|e| e.describe(external))
    }
}

/// Lookups return `Option`; a missing row is a 404 with the given text.
pub trait OrNotFound<T> {
    fn or_not_found(self, text: &'static str) -> Fallible<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, text: &'static str) -> Fallible<T> {
        self.ok_or_else(|| TfError::not_found(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_describe_as_keeps_internal_message() {
        let err = anyhow!("connection reset").describe_as(Cause::UserConflict, "Try again");
        assert_eq!(err.cause(), Cause::UserConflict);
        assert_eq!(err.external.text, "Try again");
        assert_eq!(err.internal.to_string(), "connection reset");
    }

    #[test]
    fn test_missing_value_is_not_found() {
        assert_eq!(Some(3).or_not_found("Post not found").unwrap(), 3);
        let err = None::<u8>.or_not_found("Post not found").unwrap_err();
        assert_eq!(err.cause(), Cause::NotFound);
        assert_eq!(err.external.text, "Post not found");
    }
}
