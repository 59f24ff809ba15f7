use crate::twoface::{BlockingResp, Cause, ExternalError, Fallible, TfError};
use actix_web::error::BlockingError;
use anyhow::anyhow;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

type DbPoolErr = BlockingError<DieselError>;
pub type DbPoolResult<T> = Result<T, DbPoolErr>;

/// Like `to_resp`, but a unique-key violation becomes a user-facing conflict with the given text.
pub fn conflict_as<T>(result: DbPoolResult<T>, text: &'static str) -> Fallible<T> {
    match result {
        Err(BlockingError::Error(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            info,
        ))) => Err(TfError {
            internal: anyhow!("unique violation: {}", info.message()),
            external: ExternalError::new(Cause::UserConflict, text),
        }),
        other => other.to_resp(),
    }
}

/// Like `to_resp`, but a foreign-key violation (the row being linked to doesn't exist, or was
/// deleted mid-request) becomes a 404 with the given text.
pub fn missing_as<T>(result: DbPoolResult<T>, text: &'static str) -> Fallible<T> {
    match result {
        Err(BlockingError::Error(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            info,
        ))) => Err(TfError {
            internal: anyhow!(
                "foreign key violation on {}: {}",
                info.constraint_name().unwrap_or("unknown constraint"),
                info.message()
            ),
            external: ExternalError::new(Cause::NotFound, text),
        }),
        other => other.to_resp(),
    }
}
