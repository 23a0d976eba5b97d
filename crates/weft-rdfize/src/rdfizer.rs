use std::io::Read;

use weft_rdf::StatementHandler;

/// Outcome of one RDFize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfizeStatus {
    /// The input parsed to completion; every statement reached the handler.
    Success,
    /// The input parsed but the RDFizer judged it semantically unusable.
    Failure,
    /// The input was rejected mid-stream (syntax error, truncation, or a
    /// handler refusing a statement).
    ParseError,
}

/// Turns one representation's byte stream into a statement stream.
///
/// Implementations must be restartable across inputs, tolerate truncated input
/// (reporting `ParseError`), and emit exclusively through the handler, never
/// into the store.
pub trait Rdfizer: Send + Sync {
    /// Symbolic name recorded on the cache entry.
    fn name(&self) -> &'static str;

    fn rdfize(
        &self,
        input: &mut dyn Read,
        handler: &mut dyn StatementHandler,
        base_iri: &str,
    ) -> RdfizeStatus;
}
