//! Access-token cache
//!
//! Read-through cache of one Baidu OAuth bearer token, persisted as JSON
//! next to the config file. Absence, unreadability, or expiry of the state
//! file all count as a cache miss and trigger a fresh fetch. Writes go
//! through a temp file and an atomic rename so the state file is never
//! observed half-written.
//!
//! Single-process semantics: two concurrent runs may both refresh and the
//! last writer wins. That is acceptable for a single-user desktop tool.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::data::config::AppConfig;
use crate::error::{Error, Result};

pub const ACCESS_TOKEN_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";

/// Token as persisted in the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    /// Absolute expiry time, unix seconds: issuance time plus the
    /// issuer's declared lifetime.
    pub expire_time: u64,
}

/// A freshly issued token with its declared lifetime in seconds.
#[derive(Debug, Clone)]
pub struct FreshToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// Seam between the cache policy and the network.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> Result<FreshToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error_description: Option<String>,
}

/// Fetches tokens from the Baidu OAuth endpoint with client credentials.
pub struct BaiduTokenFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sec_key: String,
}

impl BaiduTokenFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: ACCESS_TOKEN_URL.to_string(),
            api_key: config.api_key.clone(),
            sec_key: config.sec_key.clone(),
        })
    }

    /// Override the token endpoint, e.g. to point at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TokenFetcher for BaiduTokenFetcher {
    async fn fetch(&self) -> Result<FreshToken> {
        debug!("Requesting fresh access token");
        let resp = self
            .http
            .post(&self.base_url)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.sec_key.as_str()),
            ])
            .send()
            .await?;

        let body: TokenResponse = resp.json().await?;
        match (body.access_token, body.expires_in) {
            (Some(access_token), Some(expires_in)) => Ok(FreshToken {
                access_token,
                expires_in,
            }),
            _ => Err(Error::TokenFetch(body.error_description.unwrap_or_else(
                || "response missing access_token/expires_in".to_string(),
            ))),
        }
    }
}

/// Read-through cache of a single access token.
pub struct TokenCache<F: TokenFetcher> {
    state_path: PathBuf,
    fetcher: F,
}

/// Default state file path: `<config dir>/clipocr/state.json`
pub fn default_state_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clipocr")
        .join("state.json")
}

impl<F: TokenFetcher> TokenCache<F> {
    pub fn new(state_path: PathBuf, fetcher: F) -> Self {
        Self { state_path, fetcher }
    }

    /// Return a usable access token, fetching a fresh one only on a
    /// cache miss (no state file, unreadable state, or expiry).
    pub async fn get_token(&self) -> Result<String> {
        match self.read_state() {
            Some(cached) if cached.expire_time > unix_now() => {
                debug!("Using cached access token");
                Ok(cached.access_token)
            }
            Some(_) => {
                info!("Cached access token expired, refreshing");
                self.force_refresh().await
            }
            None => {
                info!("No usable cached token, fetching a fresh one");
                self.force_refresh().await
            }
        }
    }

    /// Fetch a fresh token unconditionally and persist it.
    pub async fn force_refresh(&self) -> Result<String> {
        let fresh = self.fetcher.fetch().await?;
        let cached = CachedToken {
            access_token: fresh.access_token,
            expire_time: unix_now() + fresh.expires_in,
        };
        self.write_state(&cached)?;
        info!("Access token refreshed, valid for {} s", fresh.expires_in);
        Ok(cached.access_token)
    }

    // Any read or parse failure counts as a cache miss so a corrupt
    // state file self-heals on the next run.
    fn read_state(&self) -> Option<CachedToken> {
        let content = fs::read_to_string(&self.state_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.state_path.display(),
                    e
                );
                None
            }
        }
    }

    fn write_state(&self, token: &CachedToken) -> Result<()> {
        let dir = match self.state_path.parent() {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(token)?.as_bytes())?;
        tmp.persist(&self.state_path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakeFetcher {
        calls: AtomicUsize,
        token: String,
        expires_in: u64,
    }

    impl FakeFetcher {
        fn new(token: &str, expires_in: u64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                token: token.to_string(),
                expires_in,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for FakeFetcher {
        async fn fetch(&self) -> Result<FreshToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FreshToken {
                access_token: self.token.clone(),
                expires_in: self.expires_in,
            })
        }
    }

    fn state_with_expiry(dir: &std::path::Path, token: &str, expire_time: u64) -> PathBuf {
        let path = dir.join("state.json");
        let cached = CachedToken {
            access_token: token.to_string(),
            expire_time,
        };
        fs::write(&path, serde_json::to_string_pretty(&cached).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fresh_cache_hits_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_with_expiry(dir.path(), "cached-token", unix_now() + 3600);

        let cache = TokenCache::new(path, FakeFetcher::new("new-token", 2592000));
        let token = cache.get_token().await.unwrap();

        assert_eq!(token, "cached-token");
        assert_eq!(cache.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_with_expiry(dir.path(), "stale-token", unix_now() - 3600);

        let cache = TokenCache::new(path.clone(), FakeFetcher::new("new-token", 2592000));
        let token = cache.get_token().await.unwrap();

        assert_eq!(token, "new-token");
        assert_eq!(cache.fetcher.call_count(), 1);

        let written: CachedToken =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.access_token, "new-token");
        let expected = unix_now() + 2592000;
        assert!(written.expire_time >= expected - 2 && written.expire_time <= expected);
    }

    #[tokio::test]
    async fn test_missing_state_file_fetches_and_creates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clipocr").join("state.json");

        let cache = TokenCache::new(path.clone(), FakeFetcher::new("new-token", 100));
        let token = cache.get_token().await.unwrap();

        assert_eq!(token, "new-token");
        assert_eq!(cache.fetcher.call_count(), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_file_is_a_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = TokenCache::new(path.clone(), FakeFetcher::new("new-token", 100));
        let token = cache.get_token().await.unwrap();

        assert_eq!(token, "new-token");
        assert_eq!(cache.fetcher.call_count(), 1);

        // the broken file was replaced by a valid one
        let written: CachedToken =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.access_token, "new-token");
    }

    fn test_config() -> AppConfig {
        AppConfig {
            app_id: "1".to_string(),
            api_key: "test-api-key".to_string(),
            sec_key: "test-sec-key".to_string(),
            timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_baidu_fetcher_sends_client_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(query_param("grant_type", "client_credentials"))
            .and(query_param("client_id", "test-api-key"))
            .and(query_param("client_secret", "test-sec-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-abc",
                "expires_in": 2592000
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = BaiduTokenFetcher::new(&test_config())
            .unwrap()
            .with_base_url(mock_server.uri());

        let fresh = fetcher.fetch().await.unwrap();
        assert_eq!(fresh.access_token, "tok-abc");
        assert_eq!(fresh.expires_in, 2592000);
    }

    #[tokio::test]
    async fn test_baidu_fetcher_error_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "unknown client id"
            })))
            .mount(&mock_server)
            .await;

        let fetcher = BaiduTokenFetcher::new(&test_config())
            .unwrap()
            .with_base_url(mock_server.uri());

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, Error::TokenFetch(ref msg) if msg.contains("unknown client id")));
    }
}
