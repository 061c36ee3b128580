//! Fetching verified downloads.

use std::path::PathBuf;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::debug;

/// A failure to get any response at all.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Reading the resource failed.
    #[error("failed to fetch {url}: {source}")]
    Io {
        /// The requested URL.
        url: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A response to a fetch, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Reason phrase for `status`.
    pub status_text: String,
    /// Response payload.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Create a response with the standard reason phrase for `status`.
    #[must_use]
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            body,
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}

/// Something that can resolve a page-relative URL to a payload.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response can be produced; missing or
    /// forbidden resources are reported through the response status.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Serves page-relative URLs from a local site directory, the way a static
/// file server would.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    root: PathBuf,
}

impl SiteFetcher {
    /// Serve files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL to a file below the root.
    ///
    /// Each segment is percent-decoded on its own; segments that are empty,
    /// `.` or `..`, or that decode to a path separator are refused.
    fn resolve(&self, url: &str) -> Result<PathBuf, u16> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let mut resolved = self.root.clone();

        for segment in path.split('/') {
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| 400_u16)?;
            if decoded.is_empty()
                || decoded == "."
                || decoded == ".."
                || decoded.contains(['/', '\\'])
            {
                return Err(403);
            }
            resolved.push(&*decoded);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let path = match self.resolve(url) {
            Ok(path) => path,
            Err(status) => {
                debug!(%url, status, "Refused download URL");
                return Ok(FetchResponse::new(status, Vec::new()));
            }
        };

        debug!(%url, path = %path.display(), "Fetching from site directory");
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(FetchResponse::new(200, body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(FetchResponse::new(404, Vec::new()))
            }
            Err(source) => Err(FetchError::Io {
                url: url.to_string(),
                source,
            }),
        }
    }
}
