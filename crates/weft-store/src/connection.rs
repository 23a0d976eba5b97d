use oxrdf::{GraphName, NamedNode, Quad, Subject, Term};

use crate::StoreError;

/// A live connection to the hosting triple store.
///
/// The engine funnels every read and write through one shared connection.
/// Lifecycle calls (`begin`/`commit`/`clear`/`close`) are serialised by the
/// engine, but statement-level calls may arrive concurrently from retrievals of
/// distinct graph IRIs; implementations must be safe under that interleaving.
///
/// `None` in a pattern position is a wildcard.
pub trait StoreConnection: Send + Sync {
    fn add(&self, quad: &Quad) -> Result<(), StoreError>;

    /// Remove every statement matching the pattern, returning the removed count.
    fn remove_matching(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&GraphName>,
    ) -> Result<usize, StoreError>;

    /// All statements matching the pattern.
    fn matching(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&GraphName>,
    ) -> Result<Vec<Quad>, StoreError>;

    fn begin(&self) -> Result<(), StoreError>;

    fn commit(&self) -> Result<(), StoreError>;

    /// Truncate the store: every graph, including the default graph.
    fn clear(&self) -> Result<(), StoreError>;

    fn close(&self) -> Result<(), StoreError>;
}

pub(crate) fn quad_matches(
    quad: &Quad,
    subject: Option<&Subject>,
    predicate: Option<&NamedNode>,
    object: Option<&Term>,
    graph: Option<&GraphName>,
) -> bool {
    subject.map_or(true, |s| quad.subject == *s)
        && predicate.map_or(true, |p| quad.predicate == *p)
        && object.map_or(true, |o| quad.object == *o)
        && graph.map_or(true, |g| quad.graph_name == *g)
}
