//! Cross-platform share links via a redirect service (song.link / Odesli).
//!
//! The service answers `GET {base}/{canonical_url}` with a redirect to a
//! platform-agnostic landing page; the final URL is the link we publish.

use std::{fmt, time::Duration};

use async_trait::async_trait;

use crate::{errors::Error, Result};

/// Value published when resolution fails.
pub const RESOLVE_ERROR_SENTINEL: &str = "Error";

pub const DEFAULT_RESOLVER_BASE_URL: &str = "https://odesli.co";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
    pub value: String,
}

impl ResolvedLink {
    pub fn error() -> Self {
        Self {
            value: RESOLVE_ERROR_SENTINEL.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.value == RESOLVE_ERROR_SENTINEL
    }
}

impl fmt::Display for ResolvedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Fail-soft link resolution: implementations log and return
/// `ResolvedLink::error()` instead of an `Err`.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, canonical_url: &str) -> ResolvedLink;
}

#[derive(Clone, Debug)]
pub struct OdesliResolver {
    base_url: String,
    http: reqwest::Client,
}

impl OdesliResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent("npsync/0.1")
            .build()
            .map_err(|e| Error::External(format!("link resolver client build: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn request_url(&self, canonical_url: &str) -> String {
        format!("{}/{}", self.base_url, canonical_url)
    }

    async fn try_resolve(&self, canonical_url: &str) -> Result<String> {
        // Local files have no share link; `GET {base}/` would return the
        // service's home page.
        if canonical_url.trim().is_empty() {
            return Err(Error::External("track has no share link".to_string()));
        }

        let resp = self
            .http
            .get(self.request_url(canonical_url))
            .send()
            .await
            .map_err(|e| Error::External(format!("link resolver request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::External(format!(
                "link resolver returned {} for {}",
                resp.status(),
                resp.url()
            )));
        }

        Ok(resp.url().to_string())
    }
}

#[async_trait]
impl LinkResolver for OdesliResolver {
    async fn resolve(&self, canonical_url: &str) -> ResolvedLink {
        match self.try_resolve(canonical_url).await {
            Ok(value) => ResolvedLink { value },
            Err(e) => {
                tracing::warn!(url = canonical_url, "failed to resolve share link: {e}");
                ResolvedLink::error()
            }
        }
    }
}
