pub use dereferencer::{
    DerefContext, Dereferencer, DereferencerRegistry, IgnoreRedirects, RedirectObserver,
    Representation,
};
pub use error::DerefError;
pub use file::FileDereferencer;
pub use http::HttpDereferencer;

mod dereferencer;
mod error;
mod file;
mod http;
