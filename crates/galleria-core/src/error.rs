use thiserror::Error;

/// Errors surfaced to the caller of a [`MediaLoader`](crate::MediaLoader).
///
/// Provider failures never show up here: they degrade to empty album sets.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("a load cycle is already in progress")]
    AlreadyLoading,

    #[error("loader has been detached from its host")]
    Detached,

    #[error("load cycle ended without delivering a result")]
    Abandoned,

    #[error("invalid load options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type LoadResult<T> = Result<T, LoadError>;
