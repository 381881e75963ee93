use std::error::Error;

/// 
/// Result type for `DataLayer`s. All `DataLayer` implementations
/// should return this type.
/// 
pub type Result<T> = std::result::Result<T, DataLayerError>;

/// 
/// Error type for `DataLayer`s. Represents a generic returned error,
/// which allows different kinds of `DataLayer` implementation.
///
pub type DataLayerError = Box<dyn Error + Send + Sync>;

///
/// Returns `true` if the error was raised by the database because
/// a `UNIQUE` constraint was violated.
///
pub fn is_unique_violation(err: &DataLayerError) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
