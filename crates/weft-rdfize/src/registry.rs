use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tracing::warn;

use crate::Rdfizer;

/// Media type → rdfizer with a quality weight in `(0, 1]`.
///
/// The registry also owns content negotiation: the aggregate Accept preference
/// string is built lazily from the registered qualities and cached until the
/// next mutation.
pub struct RdfizerRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    // Insertion-ordered so equal qualities keep a stable Accept ordering.
    by_media_type: IndexMap<String, Registration>,
    accept: Option<String>,
}

#[derive(Clone)]
struct Registration {
    rdfizer: Arc<dyn Rdfizer>,
    quality: f64,
}

impl RdfizerRegistry {
    pub fn new() -> Self {
        RdfizerRegistry {
            inner: Mutex::new(Inner {
                by_media_type: IndexMap::new(),
                accept: None,
            }),
        }
    }

    /// Register `rdfizer` for `media_type`. Re-registration overrides the
    /// previous entry with a warning; an out-of-range quality is refused.
    pub fn register(
        &self,
        media_type: &str,
        quality: f64,
        rdfizer: Arc<dyn Rdfizer>,
    ) -> Result<(), RegistryError> {
        if !(quality > 0.0 && quality <= 1.0) || !quality.is_finite() {
            return Err(RegistryError::InvalidQuality {
                media_type: media_type.to_owned(),
                quality,
            });
        }
        let media_type = normalize(media_type)?;
        let mut inner = self.inner.lock().unwrap();
        if inner
            .by_media_type
            .insert(media_type.clone(), Registration { rdfizer, quality })
            .is_some()
        {
            warn!("overriding the rdfizer registered for {media_type}");
        }
        inner.accept = None;
        Ok(())
    }

    /// The rdfizer registered for `media_type`, parameters ignored.
    pub fn get(&self, media_type: &str) -> Option<Arc<dyn Rdfizer>> {
        let media_type = normalize(media_type).ok()?;
        let inner = self.inner.lock().unwrap();
        inner
            .by_media_type
            .get(&media_type)
            .map(|registration| Arc::clone(&registration.rdfizer))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().by_media_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The aggregate HTTP Accept preference string: media types sorted by
    /// descending quality, `;q=` omitted for quality 1.0. Registration order
    /// breaks ties. Cached until the registry changes.
    pub fn accept_header(&self) -> String {
        let mut inner = self.inner.lock().unwrap();
        if inner.accept.is_none() {
            let mut entries: Vec<(&String, f64)> = inner
                .by_media_type
                .iter()
                .map(|(media_type, registration)| (media_type, registration.quality))
                .collect();
            entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            let accept = entries
                .iter()
                .map(|(media_type, quality)| {
                    if *quality == 1.0 {
                        (*media_type).clone()
                    } else {
                        format!("{media_type};q={quality}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            inner.accept = Some(accept);
        }
        inner.accept.clone().unwrap_or_default()
    }
}

impl Default for RdfizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RdfizerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_list().entries(inner.by_media_type.keys()).finish()
    }
}

fn normalize(media_type: &str) -> Result<String, RegistryError> {
    media_type
        .parse::<mime::Mime>()
        .map(|mime| mime.essence_str().to_ascii_lowercase())
        .map_err(|_| RegistryError::InvalidMediaType(media_type.to_owned()))
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("quality {quality} for {media_type} is outside (0, 1]")]
    InvalidQuality { media_type: String, quality: f64 },

    #[error("`{0}` is not a media type")]
    InvalidMediaType(String),
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use weft_rdf::StatementHandler;

    use crate::RdfizeStatus;

    use super::*;

    struct Stub;

    impl Rdfizer for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn rdfize(
            &self,
            _input: &mut dyn Read,
            _handler: &mut dyn StatementHandler,
            _base_iri: &str,
        ) -> RdfizeStatus {
            RdfizeStatus::Success
        }
    }

    #[test]
    fn accept_header_sorts_by_descending_quality() -> anyhow::Result<()> {
        let registry = RdfizerRegistry::new();
        registry.register("application/rdf+xml", 1.0, Arc::new(Stub))?;
        registry.register("text/turtle", 0.8, Arc::new(Stub))?;
        registry.register("text/xml", 0.25, Arc::new(Stub))?;

        assert_eq!(
            registry.accept_header(),
            "application/rdf+xml, text/turtle;q=0.8, text/xml;q=0.25"
        );
        Ok(())
    }

    #[test]
    fn accept_header_cache_invalidates_on_mutation() -> anyhow::Result<()> {
        let registry = RdfizerRegistry::new();
        registry.register("text/turtle", 0.8, Arc::new(Stub))?;
        assert_eq!(registry.accept_header(), "text/turtle;q=0.8");

        registry.register("application/rdf+xml", 1.0, Arc::new(Stub))?;
        assert_eq!(
            registry.accept_header(),
            "application/rdf+xml, text/turtle;q=0.8"
        );
        Ok(())
    }

    #[test]
    fn equal_qualities_keep_registration_order() -> anyhow::Result<()> {
        let registry = RdfizerRegistry::new();
        registry.register("text/turtle", 0.5, Arc::new(Stub))?;
        registry.register("application/trig", 0.5, Arc::new(Stub))?;

        assert_eq!(
            registry.accept_header(),
            "text/turtle;q=0.5, application/trig;q=0.5"
        );
        Ok(())
    }

    #[test]
    fn out_of_range_qualities_are_refused() {
        let registry = RdfizerRegistry::new();
        for quality in [0.0, -0.1, 1.01, f64::NAN] {
            assert!(matches!(
                registry.register("text/turtle", quality, Arc::new(Stub)),
                Err(RegistryError::InvalidQuality { .. })
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn re_registration_overrides() -> anyhow::Result<()> {
        let registry = RdfizerRegistry::new();
        registry.register("text/turtle", 0.5, Arc::new(Stub))?;
        registry.register("text/turtle", 0.9, Arc::new(Stub))?;
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.accept_header(), "text/turtle;q=0.9");
        Ok(())
    }

    #[test]
    fn lookup_ignores_parameters_and_case() -> anyhow::Result<()> {
        let registry = RdfizerRegistry::new();
        registry.register("text/turtle", 0.5, Arc::new(Stub))?;
        assert!(registry.get("text/turtle; charset=utf-8").is_some());
        assert!(registry.get("Text/Turtle").is_some());
        assert!(registry.get("application/pdf").is_none());
        Ok(())
    }
}
