pub use builder::{LinkedDataCacheBuilder, IMAGE_QUALITY};
pub use cache::LinkedDataCache;
pub use config::{CacheConfig, ConfigError, StatementPosition};
pub use error::CacheError;

pub use weft_deref::{
    DerefContext, DerefError, Dereferencer, DereferencerRegistry, FileDereferencer,
    HttpDereferencer, RedirectObserver, Representation,
};
pub use weft_memo::{ExpirationPolicy, MaxAge, Memo, MemoIndex, RedirectManager, Status};
pub use weft_rdf::{vocab, GraphIri, HandlerError, StatementHandler};
pub use weft_rdfize::{
    DatatypeHandling, ParserFormat, ParserRdfizer, Rdfizer, RdfizerRegistry, RdfizeStatus,
};
pub use weft_store::{
    DataStoreFactory, DirectStore, MemoryStore, StatementSink, StoreConnection, StoreError,
};

mod builder;
mod cache;
mod config;
mod error;
mod pipeline;
