use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::book::{Book, BookOverview, BookOverviewList};

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("book id must not be empty")]
    EmptyId,
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status { url: Url, status: StatusCode },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: Url,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to construct http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl LibraryConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LibraryError> {
        let trimmed = base_url.trim();
        // A trailing slash keeps `Url::join` from dropping the last path segment.
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base_url = Url::parse(&normalized).map_err(|err| LibraryError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(LibraryError::InvalidUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) base url".into(),
            });
        }
        Ok(Self { base_url, timeout })
    }

    pub fn books_url(&self) -> Url {
        self.url_with_segments(&["books"])
    }

    pub fn book_url(&self, book_id: &str) -> Url {
        self.url_with_segments(&["books", book_id])
    }

    /// URL of a file below `/static/`; `path` is split on `/` and each segment escaped.
    pub fn static_url(&self, path: &str) -> Url {
        let mut segments = vec!["static"];
        segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        self.url_with_segments(&segments)
    }

    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }
}

#[derive(Debug, Clone)]
pub struct LibraryClient {
    http: Client,
    config: LibraryConfig,
}

impl LibraryClient {
    pub fn new(config: LibraryConfig) -> Result<Self, LibraryError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LibraryError::Client)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Lists the books on the server, ordered by id. Entries without an id are skipped.
    pub fn fetch_books(&self) -> Result<Vec<BookOverview>, LibraryError> {
        let url = self.config.books_url();
        let listing: BookOverviewList = self.get_json(url)?;
        Ok(listing.into_sorted())
    }

    pub fn fetch_book(&self, book_id: &str) -> Result<Book, LibraryError> {
        let book_id = book_id.trim();
        if book_id.is_empty() {
            return Err(LibraryError::EmptyId);
        }
        let url = self.config.book_url(book_id);
        let mut book: Book = self.get_json(url)?;
        if book.id.is_empty() {
            book.id = book_id.to_string();
        }
        tracing::info!(
            book = %book.id,
            title = %book.title,
            scenes = book.scenes.len(),
            "fetched book"
        );
        Ok(book)
    }

    /// Raw bytes of a file below `/static/` (covers, panoramas).
    pub fn fetch_static(&self, path: &str) -> Result<Vec<u8>, LibraryError> {
        let url = self.config.static_url(path);
        debug!(%url, "downloading static asset");
        let response = self.send(url.clone())?;
        let bytes = response
            .bytes()
            .map_err(|source| LibraryError::Request { url, source })?;
        Ok(bytes.to_vec())
    }

    fn get_json<T>(&self, url: Url) -> Result<T, LibraryError>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!(%url, "GET");
        let response = self.send(url.clone())?;
        let body = response.text().map_err(|source| LibraryError::Request {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| LibraryError::Decode { url, source })
    }

    fn send(&self, url: Url) -> Result<reqwest::blocking::Response, LibraryError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| LibraryError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LibraryError::Status { url, status });
        }
        Ok(response)
    }
}
