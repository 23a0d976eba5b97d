use oxrdf::Quad;

/// Receiver for the statement stream produced by an RDFizer.
///
/// The engine assembles a chain of these per retrieval (context rewriting, blank
/// node mapping, buffering); RDFizers emit through the head of the chain and never
/// touch the store directly. Only `handle_statement` carries data; the remaining
/// parser events default to no-ops and exist for handlers that care about them.
pub trait StatementHandler {
    fn handle_statement(&mut self, statement: Quad) -> Result<(), HandlerError>;

    fn start_rdf(&mut self) {}

    fn end_rdf(&mut self) {}

    fn handle_namespace(&mut self, _prefix: &str, _iri: &str) {}

    fn handle_comment(&mut self, _text: &str) {}
}

/// A handler refused a statement; the RDFize pass aborts and is classified as a
/// parse error.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("invalid lexical form `{value}` for datatype {datatype}")]
    InvalidLiteral { value: String, datatype: String },
}
