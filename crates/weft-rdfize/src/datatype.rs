use std::fmt::{Display, Formatter};
use std::str::FromStr;

use oxrdf::vocab::xsd;
use oxrdf::{Literal, Quad, Term};
use serde::Deserialize;

use weft_rdf::{HandlerError, StatementHandler};

/// What to do with the lexical forms of typed literals while RDFizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatatypeHandling {
    /// Pass literals through untouched.
    #[default]
    Ignore,
    /// Reject the pass when a literal's lexical form does not match its
    /// datatype; the run is classified as a parse error.
    Verify,
    /// Verify, then rewrite the lexical form to a canonical one.
    Normalize,
}

impl FromStr for DatatypeHandling {
    type Err = UnknownDatatypeHandling;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(DatatypeHandling::Ignore),
            "verify" => Ok(DatatypeHandling::Verify),
            "normalize" => Ok(DatatypeHandling::Normalize),
            other => Err(UnknownDatatypeHandling(other.to_owned())),
        }
    }
}

impl Display for DatatypeHandling {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatatypeHandling::Ignore => "ignore",
            DatatypeHandling::Verify => "verify",
            DatatypeHandling::Normalize => "normalize",
        })
    }
}

/// Unknown values are fatal at configuration time.
#[derive(Debug, thiserror::Error)]
#[error("unknown datatypeHandling `{0}` (expected ignore, verify or normalize)")]
pub struct UnknownDatatypeHandling(pub String);

/// Pipeline stage enforcing the configured datatype handling for the common
/// XSD types (boolean, integer, decimal, double).
pub struct DatatypeFilter<'a> {
    handling: DatatypeHandling,
    inner: &'a mut dyn StatementHandler,
}

impl<'a> DatatypeFilter<'a> {
    pub fn new(handling: DatatypeHandling, inner: &'a mut dyn StatementHandler) -> Self {
        DatatypeFilter { handling, inner }
    }
}

impl StatementHandler for DatatypeFilter<'_> {
    fn handle_statement(&mut self, statement: Quad) -> Result<(), HandlerError> {
        self.inner.handle_statement(check(self.handling, statement)?)
    }

    fn start_rdf(&mut self) {
        self.inner.start_rdf();
    }

    fn end_rdf(&mut self) {
        self.inner.end_rdf();
    }

    fn handle_namespace(&mut self, prefix: &str, iri: &str) {
        self.inner.handle_namespace(prefix, iri);
    }

    fn handle_comment(&mut self, text: &str) {
        self.inner.handle_comment(text);
    }
}

fn check(handling: DatatypeHandling, statement: Quad) -> Result<Quad, HandlerError> {
    if handling == DatatypeHandling::Ignore {
        return Ok(statement);
    }
    let Term::Literal(literal) = &statement.object else {
        return Ok(statement);
    };
    if literal.language().is_some() {
        return Ok(statement);
    }

    let datatype = literal.datatype();
    let value = literal.value();
    let canonical = if datatype == xsd::BOOLEAN {
        canonical_boolean(value)
    } else if datatype == xsd::INTEGER {
        canonical_integer(value)
    } else if datatype == xsd::DECIMAL {
        canonical_decimal(value)
    } else if datatype == xsd::DOUBLE {
        verify_double(value).then(|| value.to_owned())
    } else {
        return Ok(statement);
    };

    let Some(canonical) = canonical else {
        return Err(HandlerError::InvalidLiteral {
            value: value.to_owned(),
            datatype: datatype.as_str().to_owned(),
        });
    };

    if handling == DatatypeHandling::Normalize && canonical != value {
        let rewritten = Literal::new_typed_literal(canonical, datatype.into_owned());
        return Ok(Quad::new(
            statement.subject,
            statement.predicate,
            rewritten,
            statement.graph_name,
        ));
    }
    Ok(statement)
}

fn canonical_boolean(value: &str) -> Option<String> {
    match value {
        "true" | "1" => Some("true".to_owned()),
        "false" | "0" => Some("false".to_owned()),
        _ => None,
    }
}

fn canonical_integer(value: &str) -> Option<String> {
    let (negative, digits) = match value.as_bytes() {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        rest => (false, rest),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let trimmed = digits
        .iter()
        .position(|digit| *digit != b'0')
        .map_or("0", |start| std::str::from_utf8(&digits[start..]).unwrap());
    if negative && trimmed != "0" {
        Some(format!("-{trimmed}"))
    } else {
        Some(trimmed.to_owned())
    }
}

fn canonical_decimal(value: &str) -> Option<String> {
    let unsigned = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let digits_ok = |s: &str| s.bytes().all(|byte| byte.is_ascii_digit());
    if !digits_ok(integer) || !fraction.map_or(true, digits_ok) {
        return None;
    }
    if integer.is_empty() && fraction.map_or(true, str::is_empty) {
        return None;
    }
    // Canonicalisation proper is left to the store; verification is what the
    // pipeline needs.
    Some(value.to_owned())
}

fn verify_double(value: &str) -> bool {
    matches!(value, "INF" | "-INF" | "NaN") || value.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use oxrdf::NamedNode;

    use super::*;

    fn typed(value: &str, datatype: oxrdf::NamedNodeRef<'_>) -> Quad {
        Quad::new(
            NamedNode::new("http://ex/s").unwrap(),
            NamedNode::new("http://ex/p").unwrap(),
            Literal::new_typed_literal(value, datatype.into_owned()),
            oxrdf::GraphName::DefaultGraph,
        )
    }

    #[test]
    fn ignore_passes_anything() {
        let quad = typed("not a number", xsd::INTEGER);
        assert!(check(DatatypeHandling::Ignore, quad).is_ok());
    }

    #[test]
    fn verify_rejects_bad_lexical_forms() {
        for (value, datatype) in [
            ("maybe", xsd::BOOLEAN),
            ("12.5.1", xsd::DECIMAL),
            ("twelve", xsd::INTEGER),
            ("1.2.3", xsd::DOUBLE),
        ] {
            let result = check(DatatypeHandling::Verify, typed(value, datatype));
            assert!(result.is_err(), "{value} should be invalid for {datatype}");
        }
    }

    #[test]
    fn verify_accepts_good_lexical_forms() {
        for (value, datatype) in [
            ("true", xsd::BOOLEAN),
            ("-12", xsd::INTEGER),
            ("003.50", xsd::DECIMAL),
            ("-1.5e10", xsd::DOUBLE),
            ("INF", xsd::DOUBLE),
        ] {
            assert!(check(DatatypeHandling::Verify, typed(value, datatype)).is_ok());
        }
    }

    #[test]
    fn normalize_rewrites_to_canonical_forms() {
        let quad = typed("0042", xsd::INTEGER);
        let out = check(DatatypeHandling::Normalize, quad).unwrap();
        let Term::Literal(literal) = &out.object else {
            panic!("literal expected");
        };
        assert_eq!(literal.value(), "42");

        let quad = typed("1", xsd::BOOLEAN);
        let out = check(DatatypeHandling::Normalize, quad).unwrap();
        let Term::Literal(literal) = &out.object else {
            panic!("literal expected");
        };
        assert_eq!(literal.value(), "true");
    }

    #[test]
    fn negative_zero_integers_normalise_to_zero() {
        assert_eq!(canonical_integer("-000").as_deref(), Some("0"));
        assert_eq!(canonical_integer("+07").as_deref(), Some("7"));
        assert_eq!(canonical_integer(""), None);
    }

    #[test]
    fn unknown_handling_values_are_fatal() {
        assert!("ignore".parse::<DatatypeHandling>().is_ok());
        assert!("sometimes".parse::<DatatypeHandling>().is_err());
    }
}
