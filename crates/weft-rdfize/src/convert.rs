//! Conversion from the parsers' borrowed statement model into owned terms.

use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term, Triple};
use rio_api::model as rio;

pub(crate) fn quad_from_triple(triple: &rio::Triple<'_>) -> Quad {
    Quad::new(
        subject(&triple.subject),
        named_node(&triple.predicate),
        term(&triple.object),
        GraphName::DefaultGraph,
    )
}

pub(crate) fn quad(quad: &rio::Quad<'_>) -> Quad {
    Quad::new(
        subject(&quad.subject),
        named_node(&quad.predicate),
        term(&quad.object),
        graph_name(quad.graph_name.as_ref()),
    )
}

fn named_node(node: &rio::NamedNode<'_>) -> NamedNode {
    // The parser has already validated the IRI.
    NamedNode::new_unchecked(node.iri)
}

fn blank_node(node: &rio::BlankNode<'_>) -> BlankNode {
    BlankNode::new_unchecked(node.id)
}

fn subject(subject: &rio::Subject<'_>) -> Subject {
    match subject {
        rio::Subject::NamedNode(node) => Subject::NamedNode(named_node(node)),
        rio::Subject::BlankNode(node) => Subject::BlankNode(blank_node(node)),
        rio::Subject::Triple(triple) => Subject::Triple(Box::new(embedded_triple(triple))),
    }
}

fn term(term: &rio::Term<'_>) -> Term {
    match term {
        rio::Term::NamedNode(node) => Term::NamedNode(named_node(node)),
        rio::Term::BlankNode(node) => Term::BlankNode(blank_node(node)),
        rio::Term::Literal(literal) => Term::Literal(convert_literal(literal)),
        rio::Term::Triple(triple) => Term::Triple(Box::new(embedded_triple(triple))),
    }
}

fn embedded_triple(triple: &rio::Triple<'_>) -> Triple {
    Triple::new(
        subject(&triple.subject),
        named_node(&triple.predicate),
        term(&triple.object),
    )
}

fn convert_literal(literal: &rio::Literal<'_>) -> Literal {
    match literal {
        rio::Literal::Simple { value } => Literal::new_simple_literal(*value),
        rio::Literal::LanguageTaggedString { value, language } => {
            Literal::new_language_tagged_literal_unchecked(*value, *language)
        }
        rio::Literal::Typed { value, datatype } => {
            Literal::new_typed_literal(*value, named_node(datatype))
        }
    }
}

fn graph_name(graph: Option<&rio::GraphName<'_>>) -> GraphName {
    match graph {
        None => GraphName::DefaultGraph,
        Some(rio::GraphName::NamedNode(node)) => GraphName::NamedNode(named_node(node)),
        Some(rio::GraphName::BlankNode(node)) => GraphName::BlankNode(blank_node(node)),
    }
}
