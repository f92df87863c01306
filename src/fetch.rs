use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_cache_reqwest::{CACacheManager, Cache, HttpCache, MokaCache, MokaManager};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use thiserror::Error;
use tokio::time;
use tracing::{debug, warn};

use crate::config::Upstream;

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("`{target}` is not a valid URL: {reason}")]
    InvalidUrl { target: String, reason: String },

    #[error("timed out while fetching `{url}`")]
    Timeout { url: Url },

    #[error("`{url}` responded with {status}")]
    Status { url: Url, status: StatusCode },

    #[error("`{url}` served a block page")]
    Blocked { url: Url },

    #[error("could not fetch `{url}`")]
    Transport {
        url: Url,
        #[source]
        source: reqwest_middleware::Error,
    },
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// The URL that produced the body.
    pub url: Url,
    pub body: Bytes,
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches `target`, which is either an absolute URL or a path relative to the upstream site.
    async fn fetch(&self, target: &str) -> Result<Fetched, FetchError>;
}

/// Whether a page is an anti-bot interstitial rather than content.
fn is_block_page(status: StatusCode, body: &[u8]) -> bool {
    if status == StatusCode::FORBIDDEN {
        return true;
    }

    let text = String::from_utf8_lossy(body).to_lowercase();

    (text.contains("cloudflare") && text.contains("attention required"))
        || text.contains("access denied")
        || text.contains("forbidden")
}

fn is_timeout(e: &reqwest_middleware::Error) -> bool {
    match e {
        reqwest_middleware::Error::Reqwest(e) => e.is_timeout(),

        reqwest_middleware::Error::Middleware(e) => e.chain().any(|cause| {
            cause
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout)
        }),
    }
}

pub struct HttpFetcher {
    client: ClientWithMiddleware,
    bases: Vec<Url>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(upstream: &Upstream, cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&upstream.accept_language)
                .context("the Accept-Language value is not a valid header value")?,
        );

        let builder = ClientBuilder::new(
            reqwest::Client::builder()
                .user_agent(&upstream.user_agent)
                .default_headers(headers)
                .connect_timeout(upstream.connect_timeout.into())
                .redirect(redirect::Policy::limited(upstream.max_redirects))
                .build()
                .context("could not create an HTTP client")?,
        );

        let builder = if let Some(path) = cache_dir {
            debug!("Using a file cache at {}", path.display());
            builder.with(Cache(HttpCache {
                mode: Default::default(),
                manager: CACacheManager { path },
                options: Default::default(),
            }))
        } else {
            debug!("Using an in-memory cache");
            builder.with(Cache(HttpCache {
                mode: Default::default(),
                manager: MokaManager::new(MokaCache::builder().max_capacity(8192).build()),
                options: Default::default(),
            }))
        };

        Ok(Self {
            client: builder.build(),
            bases: upstream.base_urls()?,
            timeout: upstream.timeout.into(),
        })
    }

    /// The URLs to try for `target`, in order.
    fn candidates(&self, target: &str) -> Result<Vec<Url>, FetchError> {
        let target = target.trim();

        if let Ok(url) = Url::parse(target) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(vec![url]);
            }
        }

        self.bases
            .iter()
            .map(|base| {
                base.join(target).map_err(|e| FetchError::InvalidUrl {
                    target: target.into(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn fetch_from(&self, url: Url) -> Result<Fetched, FetchError> {
        let request = async {
            let response = self
                .client
                .get(url.clone())
                .header(header::REFERER, url.as_str())
                .send()
                .await?;
            let status = response.status();
            let body = response.bytes().await?;

            Ok::<_, reqwest_middleware::Error>((status, body))
        };

        let (status, body) = match time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if is_timeout(&e) => return Err(FetchError::Timeout { url }),
            Ok(Err(source)) => return Err(FetchError::Transport { url, source }),
            Err(_) => return Err(FetchError::Timeout { url }),
        };

        if is_block_page(status, &body) {
            return Err(FetchError::Blocked { url });
        }

        if status != StatusCode::OK {
            return Err(FetchError::Status { url, status });
        }

        Ok(Fetched { url, body })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> Result<Fetched, FetchError> {
        let mut last_error = None;

        for url in self.candidates(target)? {
            debug!("Fetching {url}");

            match self.fetch_from(url).await {
                Ok(fetched) => {
                    debug!(bytes = fetched.body.len(), "Fetched {}", fetched.url);

                    return Ok(fetched);
                }

                Err(e) => {
                    warn!("{e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::InvalidUrl {
            target: target.into(),
            reason: "no upstream base is configured".into(),
        }))
    }
}
