use crate::logging;
use crate::source::source_map::SourceMapIndex;
use crate::OverlayError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};

/// A fetched source file with its optional source map.
///
/// Immutable once resolved; owned by the fetcher's cache for the lifetime of
/// the dev session.
#[derive(Debug)]
pub struct SourceFile {
    pub uri: String,
    pub contents: Option<String>,
    pub source_map: Option<SourceMapIndex>,
}

/// Transport seam for retrieving raw file text.
///
/// Absolute (`http`-prefixed) URIs are fetched directly; anything else is
/// routed through the dev server's internal source endpoint.
pub trait SourceTransport: Send + Sync + 'static {
    fn fetch(
        &self,
        file_uri: &str,
    ) -> impl Future<Output = Result<String, OverlayError>> + Send;
}

/// HTTP-backed transport using the dev server's source retrieval endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    source_url: String,
}

impl HttpTransport {
    /// `source_url` is the full URL of the internal source endpoint, e.g.
    /// `http://localhost:8080/__get-internal-source`.
    pub fn new(source_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            source_url,
        }
    }
}

impl SourceTransport for HttpTransport {
    async fn fetch(&self, file_uri: &str) -> Result<String, OverlayError> {
        let request = if file_uri.starts_with("http") {
            self.client.get(file_uri)
        } else {
            self.client
                .get(&self.source_url)
                .query(&[("fileName", file_uri)])
        };

        let response = request
            .send()
            .await
            .map_err(|e| OverlayError::SourceFetch(format!("{}: {}", file_uri, e)))?
            .error_for_status()
            .map_err(|e| OverlayError::SourceFetch(format!("{}: {}", file_uri, e)))?;

        response
            .text()
            .await
            .map_err(|e| OverlayError::SourceFetch(format!("{}: {}", file_uri, e)))
    }
}

type FetchFuture = Shared<BoxFuture<'static, Option<Arc<SourceFile>>>>;

/// Retrieves and caches source files keyed by URI.
///
/// The cache stores the shared future itself, so any number of concurrent
/// callers for the same URI piggyback on a single transport request; the
/// entry never expires within the session.
pub struct SourceFetcher<T: SourceTransport> {
    transport: Arc<T>,
    cache: Mutex<HashMap<String, FetchFuture>>,
}

impl<T: SourceTransport> SourceFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a file and, when `want_source_map` is set, its source map.
    ///
    /// Returns `None` when the file itself is unavailable; a missing or
    /// broken source map only degrades `source_map` to `None`.
    pub async fn get(&self, file_uri: &str, want_source_map: bool) -> Option<Arc<SourceFile>> {
        let shared = {
            let mut cache = self.cache.lock().expect("source cache poisoned");
            match cache.get(file_uri) {
                Some(existing) => existing.clone(),
                None => {
                    let fut = resolve(
                        Arc::clone(&self.transport),
                        file_uri.to_string(),
                        want_source_map,
                    )
                    .boxed()
                    .shared();
                    cache.insert(file_uri.to_string(), fut.clone());
                    fut
                }
            }
        };
        shared.await
    }
}

async fn resolve<T: SourceTransport>(
    transport: Arc<T>,
    file_uri: String,
    want_source_map: bool,
) -> Option<Arc<SourceFile>> {
    logging::log_fetching_source(&file_uri);
    let contents = match transport.fetch(&file_uri).await {
        Ok(text) => text,
        Err(e) => {
            logging::log_source_unavailable(&file_uri, &e.to_string());
            return None;
        }
    };

    let source_map = if want_source_map {
        match load_source_map(transport.as_ref(), &file_uri, &contents).await {
            Ok(map) => map,
            Err(e @ OverlayError::SourceMapData(_)) => {
                logging::log_source_map_invalid(&file_uri, &e.to_string());
                None
            }
            Err(e) => {
                logging::log_source_map_failed(&file_uri, &e.to_string());
                None
            }
        }
    } else {
        None
    };

    Some(Arc::new(SourceFile {
        uri: file_uri,
        contents: Some(contents),
        source_map,
    }))
}

fn source_mapping_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)//[#@] ?sourceMappingURL=([^\s'"]+)"#).unwrap())
}

fn data_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^data:application/json;(?:[\w=:"-]+;)*base64,"#).unwrap())
}

/// Locate and load the source map referenced by `contents`, if any.
///
/// The last sourceMappingURL directive in the file wins. A missing directive
/// is not an error; a `data:` URI that is not a base64 JSON map is.
async fn load_source_map<T: SourceTransport>(
    transport: &T,
    file_uri: &str,
    contents: &str,
) -> Result<Option<SourceMapIndex>, OverlayError> {
    let directive = match source_mapping_url_regex().captures_iter(contents).last() {
        Some(captures) => captures.get(1).map(|m| m.as_str().to_string()),
        None => None,
    };
    let url = match directive {
        Some(url) => url,
        None => return Ok(None),
    };

    if url.starts_with("data:") {
        let matched = data_uri_regex()
            .find(&url)
            .ok_or_else(|| OverlayError::SourceMapData(format!("unsupported data URI in {}", file_uri)))?;
        let payload = &url[matched.end()..];
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| OverlayError::SourceMapData(format!("bad base64 in {}: {}", file_uri, e)))?;
        let index = SourceMapIndex::from_slice(&bytes).map_err(|e| {
            OverlayError::SourceMapData(format!("bad map payload in {}: {}", file_uri, e))
        })?;
        return Ok(Some(index));
    }

    let map_uri = if url.starts_with("http") {
        url
    } else {
        resolve_relative(file_uri, &url)
    };
    let map_json = transport.fetch(&map_uri).await?;
    let index = SourceMapIndex::from_json(&map_json)
        .map_err(|e| OverlayError::SourceMapParse(format!("{}: {}", map_uri, e)))?;
    Ok(Some(index))
}

/// Resolve `relative` against the directory of `base_uri`.
fn resolve_relative(base_uri: &str, relative: &str) -> String {
    match base_uri.rfind('/') {
        Some(idx) => format!("{}/{}", &base_uri[..idx], relative),
        None => relative.to_string(),
    }
}
