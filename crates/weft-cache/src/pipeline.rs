//! The per-retrieval statement pipeline.
//!
//! Assembled fresh for every fetch, source to sink: context rewriting, optional
//! blank-node-to-IRI mapping, optional datatype handling, then a buffer. The
//! buffer only drains into the store after the RDFizer reports success, so a
//! partial parse never pollutes the target graph.

use oxrdf::{GraphName, NamedNode, Quad, Subject, Term};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use weft_rdf::{HandlerError, StatementHandler};
use weft_store::{StatementSink, StoreError};

/// Overwrites the context of every inbound statement with the target graph,
/// whatever the parser produced.
pub(crate) struct ContextRewriter<'a> {
    graph: GraphName,
    inner: &'a mut dyn StatementHandler,
}

impl<'a> ContextRewriter<'a> {
    pub(crate) fn new(graph: NamedNode, inner: &'a mut dyn StatementHandler) -> Self {
        ContextRewriter {
            graph: GraphName::NamedNode(graph),
            inner,
        }
    }
}

impl StatementHandler for ContextRewriter<'_> {
    fn handle_statement(&mut self, statement: Quad) -> Result<(), HandlerError> {
        self.inner.handle_statement(Quad::new(
            statement.subject,
            statement.predicate,
            statement.object,
            self.graph.clone(),
        ))
    }

    fn start_rdf(&mut self) {
        self.inner.start_rdf();
    }

    fn end_rdf(&mut self) {
        self.inner.end_rdf();
    }
}

/// Replaces each fresh blank node with a minted IRI, collision-free within the
/// run. The mapping is discarded with the pipeline.
pub(crate) struct BnodeToIri<'a> {
    minted: FxHashMap<String, NamedNode>,
    inner: &'a mut dyn StatementHandler,
}

impl<'a> BnodeToIri<'a> {
    pub(crate) fn new(inner: &'a mut dyn StatementHandler) -> Self {
        BnodeToIri {
            minted: FxHashMap::default(),
            inner,
        }
    }

    fn mint(&mut self, id: &str) -> NamedNode {
        self.minted
            .entry(id.to_owned())
            .or_insert_with(|| {
                NamedNode::new_unchecked(format!("urn:uuid:{}", Uuid::new_v4()))
            })
            .clone()
    }
}

impl StatementHandler for BnodeToIri<'_> {
    fn handle_statement(&mut self, statement: Quad) -> Result<(), HandlerError> {
        let subject = match statement.subject {
            Subject::BlankNode(node) => Subject::NamedNode(self.mint(node.as_str())),
            other => other,
        };
        let object = match statement.object {
            Term::BlankNode(node) => Term::NamedNode(self.mint(node.as_str())),
            other => other,
        };
        self.inner.handle_statement(Quad::new(
            subject,
            statement.predicate,
            object,
            statement.graph_name,
        ))
    }

    fn start_rdf(&mut self) {
        self.inner.start_rdf();
    }

    fn end_rdf(&mut self) {
        self.inner.end_rdf();
    }
}

/// Collects the whole pass in memory until the verdict is known.
#[derive(Default)]
pub(crate) struct StatementBuffer {
    statements: Vec<Quad>,
}

impl StatementBuffer {
    pub(crate) fn len(&self) -> usize {
        self.statements.len()
    }

    /// Push everything into the sink, emptying the buffer.
    pub(crate) fn drain_into(&mut self, sink: &mut dyn StatementSink) -> Result<(), StoreError> {
        for statement in self.statements.drain(..) {
            sink.put(&statement)?;
        }
        Ok(())
    }
}

impl StatementHandler for StatementBuffer {
    fn handle_statement(&mut self, statement: Quad) -> Result<(), HandlerError> {
        self.statements.push(statement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use oxrdf::BlankNode;

    use super::*;

    fn statement(graph: &str) -> Quad {
        Quad::new(
            NamedNode::new("http://ex/s").unwrap(),
            NamedNode::new("http://ex/p").unwrap(),
            NamedNode::new("http://ex/o").unwrap(),
            NamedNode::new(graph).unwrap(),
        )
    }

    #[test]
    fn rewriter_overwrites_any_context() {
        let mut buffer = StatementBuffer::default();
        let mut rewriter =
            ContextRewriter::new(NamedNode::new("http://ex/target").unwrap(), &mut buffer);
        rewriter.handle_statement(statement("http://ex/elsewhere")).unwrap();

        assert_eq!(
            buffer.statements[0].graph_name,
            GraphName::NamedNode(NamedNode::new("http://ex/target").unwrap())
        );
    }

    #[test]
    fn bnode_mapping_is_stable_within_a_run() {
        let mut buffer = StatementBuffer::default();
        let mut filter = BnodeToIri::new(&mut buffer);
        let bnode = BlankNode::new("b0").unwrap();
        let quad = Quad::new(
            bnode.clone(),
            NamedNode::new("http://ex/p").unwrap(),
            bnode.clone(),
            GraphName::DefaultGraph,
        );
        filter.handle_statement(quad.clone()).unwrap();
        filter.handle_statement(quad).unwrap();

        let first = &buffer.statements[0];
        let Subject::NamedNode(minted_subject) = &first.subject else {
            panic!("blank subject should have been minted");
        };
        assert!(minted_subject.as_str().starts_with("urn:uuid:"));
        // Subject and object of the same blank node share a minted IRI…
        assert_eq!(
            first.object,
            Term::NamedNode(minted_subject.clone())
        );
        // …and the second statement reuses it.
        assert_eq!(buffer.statements[1].subject, first.subject);
    }

    #[test]
    fn buffer_holds_until_drained() {
        struct Collect(Vec<Quad>);
        impl StatementSink for Collect {
            fn put(&mut self, quad: &Quad) -> Result<(), StoreError> {
                self.0.push(quad.clone());
                Ok(())
            }
        }

        let mut buffer = StatementBuffer::default();
        buffer.handle_statement(statement("http://ex/g")).unwrap();
        buffer.handle_statement(statement("http://ex/g")).unwrap();
        assert_eq!(buffer.len(), 2);

        let mut sink = Collect(Vec::new());
        buffer.drain_into(&mut sink).unwrap();
        assert_eq!(sink.0.len(), 2);
        assert_eq!(buffer.len(), 0);
    }
}
