use thiserror::Error;

/// Errors raised by a [`UserStore`](crate::UserStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a transaction is already open")]
    TransactionActive,

    #[error("no open transaction")]
    NoTransaction,

    #[error("{0}")]
    Other(String),
}
