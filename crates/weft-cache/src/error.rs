use thiserror::Error;

use weft_deref::DerefError;
use weft_rdfize::RegistryError;
use weft_store::StoreError;

use crate::ConfigError;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Store-level failures propagate to the caller; everything fetch- or
    /// parse-shaped is classified onto the cache entry instead.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An IRI that cannot be parsed has no graph form.
    #[error(transparent)]
    Iri(#[from] url::ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Constructing a dereferencer failed (e.g. the HTTP client).
    #[error(transparent)]
    Dereferencer(#[from] DerefError),
}
