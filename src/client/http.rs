/*!
http.rs - `CalibrationService` over HTTP.

Synchronous facade over async reqwest:
  - `HttpService` owns a Tokio runtime and a configured `reqwest::Client`
  - each trait method builds an endpoint URL and `block_on`s one request
  - JSON lookups treat HTTP 404 as "nothing there"
  - archive downloads stream to `<target>.part`, then rename into place

Routes (relative to the configured server):
  GET results/best
  GET calibrations/latest
  GET calibrations/{hashID}/download
  GET results/{hashID}
  GET results/{hashID}/{runID}/download
*/

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};
use url::Url;

use super::server::endpoint;
use super::{BestRun, CalibrationMeta, CalibrationService, ResultRow};
use crate::config::Settings;

/// Blocking HTTP client for the calibration database.
#[derive(Debug)]
pub struct HttpService {
    base: Url,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpService {
    /// Build the client from resolved settings.
    ///
    /// The bearer token and any extra headers become default headers on
    /// every request.
    pub fn new(settings: &Settings) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("API token contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &settings.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name: '{name}'"))?;
            let header_value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header '{name}'"))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("calib-fetch/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base: settings.server.clone(),
            client,
            runtime,
        })
    }

    /// Base URL every route is resolved against.
    pub fn server(&self) -> &Url {
        &self.base
    }

    /// GET a JSON document. `Ok(None)` on HTTP 404.
    async fn get_optional_json(&self, url: Url) -> Result<Option<serde_json::Value>> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request failed: GET {url}"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            trace!(%url, "404, treating as absent");
            return Ok(None);
        }
        let resp = resp
            .error_for_status()
            .with_context(|| format!("server rejected GET {url}"))?;
        let value = resp
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("invalid JSON from GET {url}"))?;
        Ok(Some(value))
    }

    /// Stream `url` into `target`, creating parent folders as needed.
    async fn download_to(&self, url: Url, target: PathBuf) -> Result<PathBuf> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create folder {}", parent.display()))?;
        }

        debug!(%url, path = %target.display(), "downloading archive");
        let mut resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request failed: GET {url}"))?
            .error_for_status()
            .with_context(|| format!("server rejected GET {url}"))?;

        let part = part_path(&target);
        let mut file = tokio::fs::File::create(&part)
            .await
            .with_context(|| format!("failed to create {}", part.display()))?;

        let mut bytes: u64 = 0;
        let written = async {
            while let Some(chunk) = resp.chunk().await? {
                file.write_all(&chunk).await?;
                bytes += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.context(format!("download interrupted: GET {url}")));
        }

        tokio::fs::rename(&part, &target)
            .await
            .with_context(|| format!("failed to move archive into {}", target.display()))?;
        debug!(path = %target.display(), bytes, "archive staged");
        Ok(target)
    }
}

impl CalibrationService for HttpService {
    fn best_run(&self) -> Result<Option<BestRun>> {
        let url = endpoint(&self.base, &["results", "best"])?;
        match self.runtime.block_on(self.get_optional_json(url))? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => {
                let best = serde_json::from_value(value).context("malformed best-run response")?;
                Ok(Some(best))
            }
        }
    }

    fn latest_calibration(&self) -> Result<Option<CalibrationMeta>> {
        let url = endpoint(&self.base, &["calibrations", "latest"])?;
        match self.runtime.block_on(self.get_optional_json(url))? {
            None => Ok(None),
            Some(value) => CalibrationMeta::from_payload(value),
        }
    }

    fn download_calibration(&self, hash_id: &str, output_folder: &Path) -> Result<PathBuf> {
        let url = endpoint(&self.base, &["calibrations", hash_id, "download"])?;
        let target = archive_path(output_folder, &[hash_id]);
        self.runtime
            .block_on(self.download_to(url, target))
            .with_context(|| format!("calibration download failed for {hash_id}"))
    }

    fn list_results(&self, hash_id: &str) -> Result<Vec<ResultRow>> {
        let url = endpoint(&self.base, &["results", hash_id])?;
        match self.runtime.block_on(self.get_optional_json(url))? {
            None => Ok(Vec::new()),
            Some(value) => decode_result_rows(value)
                .with_context(|| format!("malformed result list for {hash_id}")),
        }
    }

    fn download_results(
        &self,
        hash_id: &str,
        run_id: &str,
        output_folder: &Path,
    ) -> Result<PathBuf> {
        let url = endpoint(&self.base, &["results", hash_id, run_id, "download"])?;
        let target = archive_path(output_folder, &[hash_id, run_id]);
        self.runtime
            .block_on(self.download_to(url, target))
            .with_context(|| format!("results download failed for {hash_id} {run_id}"))
    }
}

/* ---- Payload / path helpers ---- */

/// Accept a bare array, an object envelope `{"results": [...]}`, or `null`.
/// Elements are decoded one by one; an odd row never sinks the whole list.
fn decode_result_rows(value: serde_json::Value) -> Result<Vec<ResultRow>> {
    let items = match value {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("results") {
            Some(serde_json::Value::Array(items)) => items,
            Some(serde_json::Value::Null) | None if obj.is_empty() => return Ok(Vec::new()),
            _ => bail!("expected a 'results' array"),
        },
        other => bail!("expected a JSON array, got {other}"),
    };
    Ok(items.into_iter().map(ResultRow::from_value).collect())
}

/// `<folder>/<id1>_<id2>.zip`. Each identifier is escaped so that `_` never
/// appears inside a component, which keeps distinct id tuples on distinct
/// file names.
fn archive_path(folder: &Path, ids: &[&str]) -> PathBuf {
    let stem: Vec<String> = ids.iter().map(|id| file_component(id)).collect();
    folder.join(format!("{}.zip", stem.join("_")))
}

/// Keep `[A-Za-z0-9.-]`, percent-encode every other byte (including `_`).
fn file_component(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
