use std::io;

use thiserror::Error;
use url::Url;

use weft_store::StoreError;

#[derive(Debug, Error)]
pub enum DerefError {
    /// A generic request error happened while fetching. Refer to the error
    /// message for more details.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },

    /// Rejected before any network round-trip: the path extension marks the
    /// document as something no registered RDFizer will consume.
    #[error("`{0}` has a blocked file extension")]
    BlockedExtension(Url),

    #[error("redirect from {0} carries no usable Location header")]
    BadRedirect(Url),

    #[error("too many redirects resolving {0}")]
    TooManyRedirects(Url),

    #[error("`{0}` does not name a local file")]
    NotAFileUrl(Url),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// Recording a redirect failed at the store level.
    #[error(transparent)]
    Store(#[from] StoreError),
}
