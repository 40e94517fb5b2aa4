use thiserror::Error as ThisError;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

/// Failures raised by the data access layer itself.
///
/// They travel inside an [`Error`] (most often as its outermost context, the transport error
/// that caused them stays in the chain), use [`QueryError::find`] to recover them.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum QueryError {
    /// The statement cannot be produced from the context.
    #[error("{0}")]
    Build(String),
    /// A row value could not be converted into the requested type.
    #[error("Cannot map `{property}` of `{target}` at row {row}: {message}")]
    Mapping {
        target: String,
        property: String,
        row: usize,
        message: String,
    },
    /// A versioned update or delete touched a number of rows different than one.
    #[error(
        "Optimistic lock failed for `{entity}` at index {index}: expected 1 affected row but got {count}"
    )]
    OptimisticLock {
        entity: String,
        index: usize,
        count: u64,
    },
    /// The transport reported a unique constraint violation.
    #[error("Unique constraint violated: {message}")]
    UniqueConstraint { message: String },
}

impl QueryError {
    pub fn find(error: &Error) -> Option<&QueryError> {
        error.downcast_ref::<QueryError>()
    }
    pub fn is_build(error: &Error) -> bool {
        matches!(Self::find(error), Some(QueryError::Build(..)))
    }
    pub fn is_mapping(error: &Error) -> bool {
        matches!(Self::find(error), Some(QueryError::Mapping { .. }))
    }
    pub fn is_optimistic_lock(error: &Error) -> bool {
        matches!(Self::find(error), Some(QueryError::OptimisticLock { .. }))
    }
    pub fn is_unique_constraint(error: &Error) -> bool {
        matches!(Self::find(error), Some(QueryError::UniqueConstraint { .. }))
    }
}

/// Error reported by a database driver, the dialect classifies it by code and message.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message} (sql state: {sql_state}, vendor code: {vendor_code})")]
pub struct DriverError {
    /// Five characters SQLSTATE, empty when the driver does not report one.
    pub sql_state: String,
    pub vendor_code: i32,
    pub message: String,
}

impl DriverError {
    pub fn new(sql_state: impl Into<String>, vendor_code: i32, message: impl Into<String>) -> Self {
        Self {
            sql_state: sql_state.into(),
            vendor_code,
            message: message.into(),
        }
    }

    /// First driver error in the chain of `error`.
    pub fn find(error: &Error) -> Option<&DriverError> {
        error
            .chain()
            .find_map(|v| v.downcast_ref::<DriverError>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn query_error_is_found_through_context() {
        let error = Error::new(DriverError::new("23505", 0, "duplicate key"))
            .context(QueryError::UniqueConstraint {
                message: "duplicate key".into(),
            })
            .context("While running the insert");
        assert!(QueryError::is_unique_constraint(&error));
        assert_eq!(DriverError::find(&error).map(|v| v.sql_state.as_str()), Some("23505"));
    }
}
