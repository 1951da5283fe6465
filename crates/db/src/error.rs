//! Translation of `sqlx` failures into store errors.

use slotswap_core::store::StoreError;

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a `sqlx` error to a [`StoreError`]. Unique violations become
/// [`StoreError::Duplicate`] carrying the constraint name.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unique constraint");
            return StoreError::Duplicate(constraint.to_string());
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}
