use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use upwatch_core::{Credentials, FetchLimits};
use upwatch_logging::{watch_error, watch_info, watch_warn};

use crate::{decode_page, FailureKind, FetchError, PageCache};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub credentials: Credentials,
}

impl FetchSettings {
    pub fn new(limits: &FetchLimits, credentials: &Credentials) -> Self {
        Self {
            connect_timeout: Duration::from_secs(limits.connect_timeout_secs),
            request_timeout: Duration::from_secs(limits.request_timeout_secs),
            max_bytes: limits.max_bytes,
            credentials: credentials.clone(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::new(&FetchLimits::default(), &Credentials::default())
    }
}

/// Retrieves listing html for a url.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// With `use_cache`, a stored body is returned without touching the
    /// network, and a fresh body is stored after a successful download.
    async fn fetch(&self, url: &str, use_cache: bool) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
    cache: PageCache,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings, cache: PageCache) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            cache,
        })
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let credentials = &self.settings.credentials;

        let response = self
            .client
            .get(parsed)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((bytes, content_type))
    }

    fn read_cached(&self, url: &str) -> Option<Vec<u8>> {
        match self.cache.read(url) {
            Ok(Some(bytes)) => {
                watch_info!("Cache hit {:?}", self.cache.path_for(url));
                Some(bytes)
            }
            Ok(None) => {
                watch_info!("Cache miss for {}", url);
                None
            }
            Err(err) => {
                watch_warn!("Cache read failed for {}: {}", url, err);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, use_cache: bool) -> Result<String, FetchError> {
        if use_cache {
            if let Some(bytes) = self.read_cached(url) {
                return Ok(decode_page(&bytes, None)?.html);
            }
        }

        let (bytes, content_type) = match self.download(url).await {
            Ok(downloaded) => downloaded,
            Err(err) => {
                watch_error!("Request {} failed: {}", url, err);
                return Err(err);
            }
        };
        watch_info!("Request {} succeeded ({} bytes)", url, bytes.len());

        if use_cache {
            match self.cache.write(url, &bytes) {
                Ok(path) => watch_info!("Cached {} at {:?}", url, path),
                Err(err) => watch_warn!("Cache write failed for {}: {}", url, err),
            }
        }

        Ok(decode_page(&bytes, content_type.as_deref())?.html)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
