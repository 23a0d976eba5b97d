//! Vocabulary of the metadata graph.
//!
//! Every statement the engine writes about its own behaviour (cache entries,
//! redirects) lives in the default graph of the hosting store and uses these
//! predicates.

use oxrdf::NamedNodeRef;

/// Namespace for all engine-owned predicates.
pub const NAMESPACE: &str = "http://fortytwo.net/2012/02/linkeddata#";

/// Associates a graph IRI with the serialised cache entry describing its last
/// retrieval attempt.
pub const MEMO: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://fortytwo.net/2012/02/linkeddata#memo");

/// Links a dereferenced IRI to the IRI it was redirected to.
pub const REDIRECTS_TO: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://fortytwo.net/2012/02/linkeddata#redirectsTo");
