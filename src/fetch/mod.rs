use crate::listing::CallRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Recording {id}: endpoint returned HTTP {status}")]
    Status { id: String, status: StatusCode },

    #[error("Recording {id}: request failed: {source}")]
    Network { id: String, source: reqwest::Error },

    #[error("Recording {id}: could not store audio: {source}")]
    Io { id: String, source: io::Error },
}

impl FetchError {
    fn network(id: &str, source: reqwest::Error) -> Self {
        Self::Network {
            id: id.to_string(),
            source,
        }
    }

    fn io(id: &str, source: io::Error) -> Self {
        Self::Io {
            id: id.to_string(),
            source,
        }
    }
}

/// Capability to turn a call record into a local audio file.
#[async_trait]
pub trait RecordingSource: Send + Sync {
    async fn fetch(&self, record: &CallRecord) -> Result<PathBuf, FetchError>;
}

/// Authenticated HTTP session for the recordings endpoint.
///
/// Built once from externally supplied cookie material and shared read-only
/// across all downloads of a run.
pub struct CallSession {
    client: reqwest::Client,
}

impl CallSession {
    pub fn new(cookie_name: &str, cookie_value: &str, cookie_domain: &str) -> Result<Self> {
        let jar = Jar::default();
        let cookie = format!("{cookie_name}={cookie_value}; Domain={cookie_domain}");
        let cookie_url = format!("https://{}/", cookie_domain.trim_start_matches('.'))
            .parse()
            .with_context(|| format!("Invalid cookie domain '{cookie_domain}'"))?;
        jar.add_cookie_str(&cookie, &cookie_url);

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Deterministic filename-addressed store for downloaded recordings.
pub struct RecordingCache {
    dir: PathBuf,
}

impl RecordingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache path for a record. Existence of a file at this path is the
    /// cache-hit signal; no content check is performed.
    pub fn path_for(&self, record: &CallRecord) -> PathBuf {
        let name = format!(
            "{}_{}_{}_{}_{}.mp3",
            sanitize_filename(&record.date_time),
            sanitize_filename(&record.from_number),
            sanitize_filename(&record.to_number),
            sanitize_filename(&record.owner_tag),
            sanitize_filename(&record.id),
        );
        self.dir.join(name)
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }
}

/// Replace filesystem-hostile characters and spaces with underscores.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// Downloads recording audio through an authenticated session, caching each
/// file under its deterministic name.
pub struct RecordingFetcher {
    session: CallSession,
    base_url: String,
    cache: RecordingCache,
}

impl RecordingFetcher {
    pub fn new(session: CallSession, base_url: impl Into<String>, cache: RecordingCache) -> Self {
        Self {
            session,
            base_url: base_url.into(),
            cache,
        }
    }

    fn recording_url(&self, id: &str) -> String {
        format!("{}?callRecordingsGetFile/{}.mp3", self.base_url, id)
    }

    async fn store_body(
        &self,
        id: &str,
        mut response: reqwest::Response,
        path: &Path,
    ) -> Result<(), FetchError> {
        // Stream into a sibling .part file so a failed download never leaves
        // a file the cache-hit check would mistake for a complete one.
        let part_path = partial_path(path);
        let mut file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| FetchError::io(id, e))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::network(id, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(id, e))?;
        }

        file.flush().await.map_err(|e| FetchError::io(id, e))?;
        drop(file);

        tokio::fs::rename(&part_path, path)
            .await
            .map_err(|e| FetchError::io(id, e))
    }
}

#[async_trait]
impl RecordingSource for RecordingFetcher {
    async fn fetch(&self, record: &CallRecord) -> Result<PathBuf, FetchError> {
        let path = self.cache.path_for(record);
        if path.exists() {
            debug!("Cache hit for recording {}: {:?}", record.id, path);
            return Ok(path);
        }

        self.cache
            .ensure_dir()
            .map_err(|e| FetchError::io(&record.id, e))?;

        let url = self.recording_url(&record.id);
        debug!("Downloading recording {} from {}", record.id, url);

        let response = self
            .session
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::network(&record.id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: record.id.clone(),
                status,
            });
        }

        self.store_body(&record.id, response, &path).await?;

        info!("Downloaded recording {} to {:?}", record.id, path);
        Ok(path)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".part");
    PathBuf::from(os)
}
