use tracing::trace;
use url::Url;

use crate::{DerefContext, Dereferencer, DerefError, Representation};

/// Dereferencer for `file:` IRIs. The media type is guessed from the path
/// extension; unknown extensions yield `application/octet-stream`, which the
/// orchestrator classifies as a bad media type unless an RDFizer claims it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDereferencer;

impl FileDereferencer {
    pub fn new() -> Self {
        FileDereferencer
    }
}

impl Dereferencer for FileDereferencer {
    fn name(&self) -> &'static str {
        "file"
    }

    fn dereference(
        &self,
        iri: &Url,
        _cx: &mut DerefContext<'_>,
    ) -> Result<Option<Representation>, DerefError> {
        let path = iri
            .to_file_path()
            .map_err(|()| DerefError::NotAFileUrl(iri.clone()))?;
        trace!("reading {}", path.display());
        let media_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| media_type_for_extension(&ext.to_ascii_lowercase()))
            .unwrap_or("application/octet-stream");
        let file = fs_err::File::open(path)?;
        Ok(Some(Representation::new(media_type, file)))
    }
}

fn media_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "rdf" | "rdfs" | "owl" => "application/rdf+xml",
        "ttl" => "text/turtle",
        "nt" => "application/n-triples",
        "trig" => "application/trig",
        "nq" => "application/n-quads",
        "xml" => "text/xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::io::Write;

    use crate::IgnoreRedirects;

    use super::*;

    #[test]
    fn reads_local_files_with_guessed_media_type() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data.ttl");
        let mut file = fs_err::File::create(&path)?;
        writeln!(file, "<http://ex/a> <http://ex/b> <http://ex/c> .")?;

        let iri = Url::from_file_path(&path).unwrap();
        let mut ignore = IgnoreRedirects;
        let mut cx = DerefContext {
            accept: None,
            redirects: &mut ignore,
        };
        let mut rep = FileDereferencer::new()
            .dereference(&iri, &mut cx)?
            .expect("a representation");
        assert_eq!(rep.media_type(), "text/turtle");

        let mut body = String::new();
        rep.body_mut().read_to_string(&mut body)?;
        assert!(body.contains("http://ex/a"));
        Ok(())
    }

    #[test]
    fn unknown_extensions_fall_back_to_octet_stream() {
        assert_eq!(media_type_for_extension("dat"), "application/octet-stream");
        assert_eq!(media_type_for_extension("rdf"), "application/rdf+xml");
    }

    #[test]
    fn non_file_urls_are_rejected() {
        let mut ignore = IgnoreRedirects;
        let mut cx = DerefContext {
            accept: None,
            redirects: &mut ignore,
        };
        let result = FileDereferencer::new()
            .dereference(&Url::parse("http://ex/a").unwrap(), &mut cx);
        assert!(matches!(result, Err(DerefError::NotAFileUrl(_))));
    }
}
