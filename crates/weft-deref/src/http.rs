use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use url::Url;

use crate::{DerefContext, Dereferencer, DerefError, Representation};

/// Path extensions rejected without a network round-trip: binary, media, archive
/// and office formats, plus script and source files. `.htm`/`.html`/`.xhtml` and
/// `.jpg`/`.jpeg` are deliberately absent: RDFa and image-metadata RDFizers may
/// consume them.
const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    "3gp", "7z", "aac", "ai", "aif", "asf", "avi", "bat", "bin", "bmp", "bz2", "c", "cab",
    "class", "com", "cpp", "css", "csv", "dat", "dll", "dmg", "doc", "docx", "dvi", "exe",
    "flv", "gif", "gz", "h", "ico", "iso", "jar", "java", "js", "m4a", "m4v", "mdb", "mid",
    "mov", "mp2", "mp3", "mp4", "mpe", "mpeg", "mpg", "msi", "o", "odg", "odp", "ods", "odt",
    "ogg", "pdf", "php", "pl", "png", "pps", "ppt", "pptx", "ps", "psd", "py", "ra", "ram",
    "rar", "rb", "rm", "rtf", "sh", "sit", "svg", "swf", "sys", "tar", "tgz", "tif", "tiff",
    "vob", "wav", "wma", "wmv", "xls", "xlsx", "zip",
];

const MAX_REDIRECTS: usize = 10;

/// Dereferencer for `http` and `https` IRIs.
///
/// Redirect following is disabled on the client and handled in a loop here, so
/// every hop can be reported to the redirect observer before the next request
/// goes out. The Accept header comes from the context (the aggregate preference
/// string of the registered RDFizers).
pub struct HttpDereferencer {
    client: Client,
    blocked_extensions: FxHashSet<String>,
}

impl HttpDereferencer {
    pub fn new() -> Result<Self, DerefError> {
        let client = Client::builder()
            .user_agent(concat!("weft/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none())
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(HttpDereferencer {
            client,
            blocked_extensions: DEFAULT_BLOCKED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
        })
    }

    /// Add an extension to the blocked list.
    pub fn block_extension(&mut self, extension: &str) {
        self.blocked_extensions.insert(extension.to_ascii_lowercase());
    }

    /// Remove an extension from the blocked list.
    pub fn allow_extension(&mut self, extension: &str) {
        self.blocked_extensions.remove(&extension.to_ascii_lowercase());
    }

    pub fn is_blocked(&self, iri: &Url) -> bool {
        path_extension(iri).is_some_and(|ext| self.blocked_extensions.contains(&ext))
    }
}

impl Dereferencer for HttpDereferencer {
    fn name(&self) -> &'static str {
        "http"
    }

    fn dereference(
        &self,
        iri: &Url,
        cx: &mut DerefContext<'_>,
    ) -> Result<Option<Representation>, DerefError> {
        if self.is_blocked(iri) {
            return Err(DerefError::BlockedExtension(iri.clone()));
        }

        let mut url = iri.clone();
        for _ in 0..MAX_REDIRECTS {
            trace!("GET {url}");
            let mut request = self.client.get(url.clone());
            if let Some(accept) = &cx.accept {
                request = request.header(ACCEPT, accept);
            }
            let response = request.send()?;
            let status = response.status();

            if status.is_redirection() {
                let target = redirect_target(&url, &response)?;
                if cx.redirects.on_redirect(&url, &target)? {
                    debug!("redirect target {target} is already cached; stopping");
                    return Ok(None);
                }
                url = target;
                continue;
            }
            if !status.is_success() {
                return Err(DerefError::Status { url, status });
            }

            let media_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(media_type_essence)
                .unwrap_or_default();
            return Ok(Some(Representation::new(media_type, response)));
        }
        Err(DerefError::TooManyRedirects(iri.clone()))
    }
}

fn redirect_target(
    url: &Url,
    response: &reqwest::blocking::Response,
) -> Result<Url, DerefError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DerefError::BadRedirect(url.clone()))?;
    let mut target = url
        .join(location)
        .map_err(|_| DerefError::BadRedirect(url.clone()))?;
    // Redirect targets identify documents; their graph form has no fragment.
    target.set_fragment(None);
    Ok(target)
}

/// The declared media type with parameters stripped and lowercased, e.g.
/// `text/turtle; charset=utf-8` → `text/turtle`.
fn media_type_essence(value: &str) -> String {
    value.parse::<mime::Mime>().map_or_else(
        |_| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        },
        |mime| mime.essence_str().to_ascii_lowercase(),
    )
}

fn path_extension(iri: &Url) -> Option<String> {
    let last_segment = iri.path_segments()?.last()?;
    let (_, extension) = last_segment.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Read;
    use std::thread;

    use tiny_http::{Header, Response, Server};

    use crate::IgnoreRedirects;

    use super::*;

    /// Serve each (path → response) once, on a private port.
    fn serve(routes: HashMap<String, Response<std::io::Cursor<Vec<u8>>>>) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let ip = server.server_addr().to_ip().expect("an ip listener");
        thread::spawn(move || {
            let mut routes = routes;
            while let Ok(request) = server.recv() {
                let url = request.url().to_owned();
                match routes.remove(&url) {
                    Some(response) => {
                        let _ = request.respond(response);
                    }
                    None => {
                        let _ = request.respond(Response::empty(404));
                    }
                }
                if routes.is_empty() {
                    break;
                }
            }
        });
        format!("http://{ip}")
    }

    fn response(body: &str, content_type: &str) -> Response<std::io::Cursor<Vec<u8>>> {
        Response::from_string(body).with_header(
            Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap(),
        )
    }

    #[test]
    fn blocked_extensions() -> anyhow::Result<()> {
        let http = HttpDereferencer::new()?;
        assert!(http.is_blocked(&Url::parse("http://ex/archive.ZIP")?));
        assert!(http.is_blocked(&Url::parse("http://ex/a/song.mp3")?));
        // RDFa and EXIF inputs stay fetchable.
        assert!(!http.is_blocked(&Url::parse("http://ex/page.html")?));
        assert!(!http.is_blocked(&Url::parse("http://ex/photo.jpeg")?));
        assert!(!http.is_blocked(&Url::parse("http://ex/data")?));
        Ok(())
    }

    #[test]
    fn extension_list_is_editable() -> anyhow::Result<()> {
        let mut http = HttpDereferencer::new()?;
        http.allow_extension("zip");
        assert!(!http.is_blocked(&Url::parse("http://ex/a.zip")?));
        http.block_extension("ttl");
        assert!(http.is_blocked(&Url::parse("http://ex/a.ttl")?));
        Ok(())
    }

    #[test]
    fn fetches_and_strips_media_type_parameters() -> anyhow::Result<()> {
        let mut routes = HashMap::new();
        routes.insert(
            "/doc".to_owned(),
            response("<a> <b> <c> .", "text/turtle; charset=utf-8"),
        );
        let base = serve(routes);

        let http = HttpDereferencer::new()?;
        let mut ignore = IgnoreRedirects;
        let mut cx = DerefContext {
            accept: Some("text/turtle".to_owned()),
            redirects: &mut ignore,
        };
        let mut rep = http
            .dereference(&Url::parse(&format!("{base}/doc"))?, &mut cx)?
            .expect("a representation");
        assert_eq!(rep.media_type(), "text/turtle");

        let mut body = String::new();
        rep.body_mut().read_to_string(&mut body)?;
        assert_eq!(body, "<a> <b> <c> .");
        Ok(())
    }

    #[test]
    fn reports_each_redirect_hop() -> anyhow::Result<()> {
        let mut routes = HashMap::new();
        routes.insert(
            "/a".to_owned(),
            Response::from_string("")
                .with_status_code(303)
                .with_header(Header::from_bytes(&b"Location"[..], &b"/b"[..]).unwrap()),
        );
        routes.insert("/b".to_owned(), response("<a> <b> <c> .", "text/turtle"));
        let base = serve(routes);

        struct Recording(Vec<(Url, Url)>);
        impl crate::RedirectObserver for Recording {
            fn on_redirect(
                &mut self,
                source: &Url,
                target: &Url,
            ) -> Result<bool, weft_store::StoreError> {
                self.0.push((source.clone(), target.clone()));
                Ok(false)
            }
        }

        let http = HttpDereferencer::new()?;
        let mut observer = Recording(Vec::new());
        let mut cx = DerefContext {
            accept: None,
            redirects: &mut observer,
        };
        let rep = http.dereference(&Url::parse(&format!("{base}/a"))?, &mut cx)?;
        assert!(rep.is_some());
        assert_eq!(observer.0.len(), 1);
        assert_eq!(observer.0[0].0.path(), "/a");
        assert_eq!(observer.0[0].1.path(), "/b");
        Ok(())
    }

    #[test]
    fn cached_redirect_target_short_circuits() -> anyhow::Result<()> {
        let mut routes = HashMap::new();
        routes.insert(
            "/a".to_owned(),
            Response::from_string("")
                .with_status_code(303)
                .with_header(Header::from_bytes(&b"Location"[..], &b"/b"[..]).unwrap()),
        );
        let base = serve(routes);

        struct AlreadyCached;
        impl crate::RedirectObserver for AlreadyCached {
            fn on_redirect(
                &mut self,
                _source: &Url,
                _target: &Url,
            ) -> Result<bool, weft_store::StoreError> {
                Ok(true)
            }
        }

        let http = HttpDereferencer::new()?;
        let mut cx = DerefContext {
            accept: None,
            redirects: &mut AlreadyCached,
        };
        let rep = http.dereference(&Url::parse(&format!("{base}/a"))?, &mut cx)?;
        assert!(rep.is_none());
        Ok(())
    }

    #[test]
    fn error_statuses_are_errors() -> anyhow::Result<()> {
        let base = serve(HashMap::new());
        let http = HttpDereferencer::new()?;
        let mut ignore = IgnoreRedirects;
        let mut cx = DerefContext {
            accept: None,
            redirects: &mut ignore,
        };
        let result = http.dereference(&Url::parse(&format!("{base}/missing"))?, &mut cx);
        assert!(matches!(result, Err(DerefError::Status { .. })));
        Ok(())
    }
}
