use std::io::{BufReader, Read};

use oxiri::Iri;
use rio_api::parser::{QuadsParser, TriplesParser};
use rio_turtle::{NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use rio_xml::RdfXmlParser;
use tracing::debug;

use weft_rdf::{HandlerError, StatementHandler};

use crate::convert;
use crate::{Rdfizer, RdfizeStatus};

/// The built-in verbatim formats: statements come straight from a streaming
/// parser, one rdfizer per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserFormat {
    RdfXml,
    Turtle,
    NTriples,
    TriG,
    NQuads,
}

impl ParserFormat {
    pub const ALL: [ParserFormat; 5] = [
        ParserFormat::RdfXml,
        ParserFormat::Turtle,
        ParserFormat::NTriples,
        ParserFormat::TriG,
        ParserFormat::NQuads,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParserFormat::RdfXml => "rdf-xml",
            ParserFormat::Turtle => "turtle",
            ParserFormat::NTriples => "n-triples",
            ParserFormat::TriG => "trig",
            ParserFormat::NQuads => "n-quads",
        }
    }

    /// Media types this format is conventionally served under. The first entry
    /// is the canonical one.
    pub fn media_types(self) -> &'static [&'static str] {
        match self {
            ParserFormat::RdfXml => &["application/rdf+xml", "text/xml"],
            ParserFormat::Turtle => &["text/turtle", "application/x-turtle"],
            ParserFormat::NTriples => &["application/n-triples", "text/plain"],
            ParserFormat::TriG => &["application/trig"],
            ParserFormat::NQuads => &["application/n-quads"],
        }
    }
}

/// Why an RDFize pass stopped early.
enum Abort {
    Syntax(String),
    Handler(HandlerError),
}

impl From<rio_turtle::TurtleError> for Abort {
    fn from(err: rio_turtle::TurtleError) -> Self {
        Abort::Syntax(err.to_string())
    }
}

impl From<rio_xml::RdfXmlError> for Abort {
    fn from(err: rio_xml::RdfXmlError) -> Self {
        Abort::Syntax(err.to_string())
    }
}

/// A verbatim rdfizer backed by one of the streaming parsers.
#[derive(Debug, Clone, Copy)]
pub struct ParserRdfizer {
    format: ParserFormat,
}

impl ParserRdfizer {
    pub fn new(format: ParserFormat) -> Self {
        ParserRdfizer { format }
    }

    pub fn format(&self) -> ParserFormat {
        self.format
    }
}

impl Rdfizer for ParserRdfizer {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    fn rdfize(
        &self,
        input: &mut dyn Read,
        handler: &mut dyn StatementHandler,
        base_iri: &str,
    ) -> RdfizeStatus {
        let reader = BufReader::new(input);
        let base = Iri::parse(base_iri.to_owned()).ok();

        handler.start_rdf();
        let outcome = match self.format {
            ParserFormat::RdfXml => run_triples(RdfXmlParser::new(reader, base), &mut *handler),
            ParserFormat::Turtle => run_triples(TurtleParser::new(reader, base), &mut *handler),
            ParserFormat::NTriples => run_triples(NTriplesParser::new(reader), &mut *handler),
            ParserFormat::TriG => run_quads(TriGParser::new(reader, base), &mut *handler),
            ParserFormat::NQuads => run_quads(NQuadsParser::new(reader), &mut *handler),
        };
        handler.end_rdf();

        match outcome {
            Ok(()) => RdfizeStatus::Success,
            Err(Abort::Syntax(message)) => {
                debug!("{} parse aborted: {message}", self.format.name());
                RdfizeStatus::ParseError
            }
            Err(Abort::Handler(err)) => {
                debug!("{} statement rejected: {err}", self.format.name());
                RdfizeStatus::ParseError
            }
        }
    }
}

fn run_triples<P>(mut parser: P, handler: &mut dyn StatementHandler) -> Result<(), Abort>
where
    P: TriplesParser,
    Abort: From<P::Error>,
{
    parser.parse_all(&mut |triple| {
        handler
            .handle_statement(convert::quad_from_triple(&triple))
            .map_err(Abort::Handler)
    })
}

fn run_quads<P>(mut parser: P, handler: &mut dyn StatementHandler) -> Result<(), Abort>
where
    P: QuadsParser,
    Abort: From<P::Error>,
{
    parser.parse_all(&mut |quad| {
        handler
            .handle_statement(convert::quad(&quad))
            .map_err(Abort::Handler)
    })
}
