use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Classification {0} not found")]
    NotFound(u64),

    #[error("Store lock poisoned")]
    Poisoned,
}
