use oxrdf::Quad;

use crate::{StoreConnection, StoreError};

/// Destination for the statements of one successful RDFize pass.
pub trait StatementSink {
    fn put(&mut self, quad: &Quad) -> Result<(), StoreError>;
}

/// Write-side injection point.
///
/// The engine asks the factory for a consumer each time a buffer is flushed, so
/// alternative factories can observe or divert statements before they reach the
/// store. The default factory writes straight through.
pub trait DataStoreFactory: Send + Sync {
    fn consumer<'a>(&self, conn: &'a dyn StoreConnection) -> Box<dyn StatementSink + 'a>;
}

/// Default write path: every statement goes directly to the connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectStore;

impl DataStoreFactory for DirectStore {
    fn consumer<'a>(&self, conn: &'a dyn StoreConnection) -> Box<dyn StatementSink + 'a> {
        Box::new(DirectConsumer(conn))
    }
}

struct DirectConsumer<'a>(&'a dyn StoreConnection);

impl StatementSink for DirectConsumer<'_> {
    fn put(&mut self, quad: &Quad) -> Result<(), StoreError> {
        self.0.add(quad)
    }
}
