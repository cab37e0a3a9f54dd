pub mod schema;

pub use ::migrations::{
    initialize, initialize_in_memory, pool, run_all,
    sqlx::{self, SqlitePool},
    MigrationError,
};

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("row not found")]
    RowNotFound,
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("sql error: {0}")]
    Other(sqlx::Error),
}

pub trait SqlxResultExt<T> {
    fn map_database_error(self) -> Result<T, DatabaseError>;
}

impl<T> SqlxResultExt<T> for sqlx::Result<T> {
    fn map_database_error(self) -> Result<T, DatabaseError> {
        self.map_err(|error| match error {
            sqlx::Error::RowNotFound => DatabaseError::RowNotFound,
            sqlx::Error::Database(database_error)
                if database_error.is_check_violation()
                    || database_error.is_unique_violation()
                    || matches!(
                        database_error.kind(),
                        sqlx::error::ErrorKind::NotNullViolation
                    ) =>
            {
                DatabaseError::ConstraintViolation(database_error.message().to_owned())
            }
            other => DatabaseError::Other(other),
        })
    }
}
