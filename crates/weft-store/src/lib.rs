pub use connection::StoreConnection;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use sink::{DataStoreFactory, DirectStore, StatementSink};

mod connection;
mod error;
mod memory;
mod sink;
