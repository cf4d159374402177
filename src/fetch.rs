use std::time::{Duration, Instant};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::FetchError;
use crate::import::Translation;

const USER_AGENT: &str = "scriptura-pipeline/0.1.0";

/// reference inter-call delay, see Config::rate_limit_ms
pub const RATE_LIMIT_MS: u64 = 150;

/// Enforces a minimum interval between consecutive calls to one upstream.
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// wait if necessary to comply with the upstream rate limit
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// One verse as served by a chapter endpoint. The verse number is implicit:
/// payloads are ordered arrays, position N holds verse N+1.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteVerse {
    #[serde(alias = "texto")]
    pub text: String,
}

/// One entry of an upstream book listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteBook {
    pub id: String,
    pub name: String,
    #[serde(rename = "chapterCount", alias = "chapters")]
    pub chapter_count: i64,
}

/// The fetch collaborator. One implementation per upstream; tests use fakes.
#[allow(async_fn_in_trait)]
pub trait VerseSource {
    /// which translation this source serves
    fn translation(&self) -> Translation;
    /// source identifier for reports and logs
    fn label(&self) -> &str;
    async fn list_books(&self) -> Result<Vec<RemoteBook>, FetchError>;
    async fn chapter_verses(
        &self,
        external_id: &str,
        chapter: i64,
    ) -> Result<Vec<RemoteVerse>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScheme {
    /// raw JSON files keyed by Spanish book name, `{base}/{Book}/{n}.json`
    GithubRaw,
    /// REST API keyed by 3-letter book code, `{base}/books/{CODE}/chapters/{n}`
    RestApi,
}

/// HTTP upstream. Each instance targets a single host, so the limiter is
/// per-host by construction.
pub struct HttpSource {
    client: reqwest::Client,
    limiter: RateLimiter,
    base_url: String,
    scheme: SourceScheme,
    translation: Translation,
    label: String,
}

impl HttpSource {
    pub fn new(
        base_url: impl Into<String>,
        scheme: SourceScheme,
        translation: Translation,
        rate_limit_ms: u64,
    ) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network {
                resource: base_url.clone(),
                reason: e.to_string(),
            })?;
        let label = match scheme {
            SourceScheme::GithubRaw => format!("github:{}", translation.code()),
            SourceScheme::RestApi => format!("api:{}", translation.code()),
        };
        Ok(Self {
            client,
            limiter: RateLimiter::new(rate_limit_ms),
            base_url,
            scheme,
            translation,
            label,
        })
    }

    fn books_url(&self) -> String {
        match self.scheme {
            SourceScheme::GithubRaw => format!("{}/books.json", self.base_url),
            SourceScheme::RestApi => format!("{}/books", self.base_url),
        }
    }

    fn chapter_url(&self, external_id: &str, chapter: i64) -> String {
        match self.scheme {
            SourceScheme::GithubRaw => {
                format!("{}/{}/{}.json", self.base_url, external_id, chapter)
            }
            SourceScheme::RestApi => format!(
                "{}/books/{}/chapters/{}?translation={}",
                self.base_url,
                external_id,
                chapter,
                self.translation.code()
            ),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.limiter.wait().await;
        debug!(url = %url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                resource: url.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                resource: url.to_string(),
            });
        }
        response.json().await.map_err(|e| FetchError::Malformed {
            resource: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl VerseSource for HttpSource {
    fn translation(&self) -> Translation {
        self.translation
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn list_books(&self) -> Result<Vec<RemoteBook>, FetchError> {
        self.get_json(&self.books_url()).await
    }

    async fn chapter_verses(
        &self,
        external_id: &str,
        chapter: i64,
    ) -> Result<Vec<RemoteVerse>, FetchError> {
        self.get_json(&self.chapter_url(external_id, chapter)).await
    }
}
