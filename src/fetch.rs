//! Fetch-or-load-from-cache with a randomized politeness delay.

use anyhow::{Context, Result, bail};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Status and body of a completed GET request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Issues GET requests. Implemented over `reqwest` for real runs and by
/// canned fakes in tests.
pub trait Transport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse>;
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse> {
        let response = self.client.get(url).headers(headers.clone()).send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        Ok(RawResponse { status, body })
    }
}

fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().build()?)
}

/// Builds the `Referer` and `User-Agent` headers the API insists on.
pub fn request_headers(referer: &str, user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        REFERER,
        HeaderValue::from_str(referer).with_context(|| format!("invalid referer: {referer}"))?,
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .with_context(|| format!("invalid user agent: {user_agent}"))?,
    );
    Ok(headers)
}

/// Bounds of the uniformly drawn pause taken before every network request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolitenessDelay {
    min_secs: f64,
    max_secs: f64,
}

impl PolitenessDelay {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 {
            bail!("delay bounds must be finite and non-negative: {min_secs}..{max_secs}");
        }
        if min_secs > max_secs {
            bail!("minimum delay {min_secs}s exceeds maximum delay {max_secs}s");
        }
        // Every sample lies within the bounds, so checking the maximum suffices.
        Duration::try_from_secs_f64(max_secs)
            .with_context(|| format!("maximum delay {max_secs}s is out of range"))?;
        Ok(Self { min_secs, max_secs })
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    pub fn sample(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

impl Default for PolitenessDelay {
    fn default() -> Self {
        Self {
            min_secs: 4.0,
            max_secs: 10.0,
        }
    }
}

/// Result of a single [`CacheFetcher::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Loaded from an existing cache file; no request was made.
    Cached(Value),
    /// Downloaded and written to the cache.
    Downloaded(Value),
    /// The request failed or returned a non-200 status. Nothing was written.
    Unavailable,
}

impl FetchOutcome {
    /// The `(content, was_freshly_fetched)` pair.
    pub fn into_parts(self) -> (Option<Value>, bool) {
        match self {
            FetchOutcome::Cached(v) => (Some(v), false),
            FetchOutcome::Downloaded(v) => (Some(v), true),
            FetchOutcome::Unavailable => (None, false),
        }
    }

    pub fn content(&self) -> Option<&Value> {
        match self {
            FetchOutcome::Cached(v) | FetchOutcome::Downloaded(v) => Some(v),
            FetchOutcome::Unavailable => None,
        }
    }
}

/// Serves JSON documents from a directory of cache files, downloading the
/// ones that are missing.
pub struct CacheFetcher<T> {
    transport: T,
    cache_dir: PathBuf,
    delay: PolitenessDelay,
}

impl<T: Transport> CacheFetcher<T> {
    /// Creates the fetcher, creating `cache_dir` if needed.
    pub fn new(transport: T, cache_dir: impl Into<PathBuf>, delay: PolitenessDelay) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;
        Ok(Self {
            transport,
            cache_dir,
            delay,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, cache_key: &str) -> PathBuf {
        self.cache_dir.join(cache_key)
    }

    /// Returns the document for `url`, from `cache_key` if it is already on
    /// disk, otherwise from the network after a politeness pause.
    ///
    /// Transport failures, non-200 statuses and non-JSON bodies come back as
    /// [`FetchOutcome::Unavailable`]. A cache file that fails to parse is an
    /// error: it is never silently replaced.
    pub fn fetch(&self, url: &str, cache_key: &str, headers: &HeaderMap) -> Result<FetchOutcome> {
        let path = self.cache_path(cache_key);
        if path.exists() {
            debug!(path = %path.display(), "cache hit");
            return load_cached(&path).map(FetchOutcome::Cached);
        }

        let pause = self.delay.sample();
        info!(
            "{} not found. Sleeping {:.2}s before fetching...",
            cache_key,
            pause.as_secs_f64()
        );
        thread::sleep(pause);

        let response = match self.transport.get(url, headers) {
            Ok(response) => response,
            Err(err) => {
                warn!(url, error = %err, "request failed");
                return Ok(FetchOutcome::Unavailable);
            }
        };

        if response.status != StatusCode::OK {
            warn!("Failed {} ({})", url, response.status.as_u16());
            return Ok(FetchOutcome::Unavailable);
        }

        let data: Value = match serde_json::from_slice(&response.body) {
            Ok(data) => data,
            Err(err) => {
                warn!(url, error = %err, "response body is not JSON");
                return Ok(FetchOutcome::Unavailable);
            }
        };

        self.persist(&path, &data)?;
        info!("Saved data to {}", cache_key);
        Ok(FetchOutcome::Downloaded(data))
    }

    /// Writes `data` next to its final location and renames it into place,
    /// so an interrupted write never leaves a half-written cache file.
    fn persist(&self, path: &Path, data: &Value) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)
            .with_context(|| format!("failed to create temp file in {}", self.cache_dir.display()))?;
        {
            let mut writer = io::BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, data)?;
            writer.flush()?;
        }
        tmp.persist(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn load_cached(path: &Path) -> Result<Value> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = io::BufReader::new(file);
    let data: Value = serde_json::from_reader(reader)
        .with_context(|| format!("corrupt cache file {}", path.display()))?;
    Ok(data)
}
