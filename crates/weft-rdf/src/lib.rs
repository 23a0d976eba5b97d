pub use handler::{HandlerError, StatementHandler};
pub use iri::{namespace, GraphIri};

pub mod vocab;

mod handler;
mod iri;
