pub use datatype::{DatatypeFilter, DatatypeHandling, UnknownDatatypeHandling};
pub use formats::{ParserFormat, ParserRdfizer};
pub use rdfizer::{Rdfizer, RdfizeStatus};
pub use registry::{RdfizerRegistry, RegistryError};

mod convert;
mod datatype;
mod formats;
mod rdfizer;
mod registry;
