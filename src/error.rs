use thiserror::Error;

use crate::transaction::{OutputRef, TxHash};

/// Contract violations on the unspent output pool.
///
/// A transaction failing validation is not one of these; that is reported
/// as a plain `false` by the validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("output not found in pool: {0}")]
    NotFound(OutputRef),

    #[error("output already in pool: {0}")]
    AlreadyPresent(OutputRef),

    #[error("output position {0} does not fit an output reference index")]
    MalformedIndex(usize),
}

pub type PoolResult<T> = Result<T, PoolError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("stored hash {stored} doesn't match its content hash {computed}")]
    HashMismatch { stored: TxHash, computed: TxHash },
}
