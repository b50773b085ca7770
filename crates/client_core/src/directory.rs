//! Paginated contacts directory import.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use shared::{
    domain::CandidateContact,
    protocol::{DirectoryContact, DirectoryPage},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_DIRECTORY_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_CONTACTS_PATH: &str = "/me/contacts?$top=50";
/// Upper bound on pages per import, so a collaborator that keeps returning
/// continuation links cannot keep the import running forever.
pub const DEFAULT_PAGE_CAP: usize = 10;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory rejected the access token")]
    Unauthorized,
    #[error("directory API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid directory link {link:?}: {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("malformed directory page: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetches one page of directory contacts. `link` is either the initial
/// relative path or a continuation link taken from the previous page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, link: &str, access_token: &str)
        -> Result<DirectoryPage, DirectoryError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch_page(
        &self,
        link: &str,
        access_token: &str,
    ) -> Result<DirectoryPage, DirectoryError> {
        (**self).fetch_page(link, access_token).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub first_link: String,
    pub page_cap: usize,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            first_link: DEFAULT_CONTACTS_PATH.to_string(),
            page_cap: DEFAULT_PAGE_CAP,
        }
    }
}

/// reqwest-backed fetcher. Relative links are appended to `base_url`;
/// absolute links are requested as-is.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    http: Client,
    base_url: String,
}

impl HttpPageFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|source| DirectoryError::InvalidLink {
            link: base_url.clone(),
            source,
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, link: &str) -> Result<Url, DirectoryError> {
        let raw = if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}/{}", self.base_url, link.trim_start_matches('/'))
        };
        Url::parse(&raw).map_err(|source| DirectoryError::InvalidLink { link: raw, source })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(
        &self,
        link: &str,
        access_token: &str,
    ) -> Result<DirectoryPage, DirectoryError> {
        let url = self.resolve(link)?;
        debug!(%url, "fetching directory page");
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(DirectoryError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Walks the directory from `first_link`, following continuation links until
/// none is returned or `page_cap` pages have been read. Entries without an
/// email address are dropped; any failing page fails the whole fetch.
pub async fn fetch_directory_contacts<F>(
    fetcher: &F,
    access_token: &str,
    first_link: &str,
    page_cap: usize,
) -> Result<Vec<CandidateContact>, DirectoryError>
where
    F: PageFetcher + ?Sized,
{
    let mut results = Vec::new();
    let mut next = Some(first_link.to_string());
    let mut pages = 0usize;

    while let Some(link) = next.take() {
        if pages == page_cap {
            warn!(page_cap, "directory still had more pages; stopping at page cap");
            break;
        }
        let page = fetcher.fetch_page(&link, access_token).await?;
        pages += 1;

        let before = results.len();
        results.extend(page.value.iter().filter_map(candidate_from));
        let dropped = page.value.len() - (results.len() - before);
        if dropped > 0 {
            debug!(page = pages, dropped, "skipped directory entries without email");
        }

        next = page.continuation().map(str::to_string);
    }

    debug!(pages, contacts = results.len(), "directory fetch finished");
    Ok(results)
}

fn candidate_from(contact: &DirectoryContact) -> Option<CandidateContact> {
    let email = contact.primary_email()?;
    let name = contact
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(email);
    Some(CandidateContact::new(name, email))
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
