/*!
config.rs - connection settings for the calibration database.

Each field resolves independently, first match wins:
  1. CLI flag            (--server / --token / --timeout / -H)
  2. Environment         (CALIBDB_URL / CALIBDB_TOKEN / CALIBDB_TIMEOUT)
  3. Config file         (--config or CALIBDB_CONFIG; .yaml/.yml = YAML, else JSON)
  4. Built-in default    (server = http://127.0.0.1:8000/)

Headers from the file and from -H are merged; -H wins on a name clash
(case-insensitive).
*/

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::client::server::{DEFAULT_SERVER, parse_server};

pub const ENV_SERVER: &str = "CALIBDB_URL";
pub const ENV_TOKEN: &str = "CALIBDB_TOKEN";
pub const ENV_TIMEOUT: &str = "CALIBDB_TIMEOUT";
pub const ENV_CONFIG: &str = "CALIBDB_CONFIG";

/// Raw, unvalidated values as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsInput {
    pub server: Option<String>,
    pub token: Option<String>,
    pub headers: Vec<String>,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
}

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: Url,
    pub token: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

/// On-disk config file shape. All keys optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn resolve(input: SettingsInput) -> Result<Self> {
        Self::resolve_with(input, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with(
        input: SettingsInput,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config_path = input
            .config
            .clone()
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        let file = match &config_path {
            Some(path) => load_config_file(path)?,
            None => FileConfig::default(),
        };

        let server_raw = input
            .server
            .or_else(|| env(ENV_SERVER))
            .or(file.server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let server = parse_server(&server_raw)?;

        let token = input.token.or_else(|| env(ENV_TOKEN)).or(file.token);

        let timeout_secs = match input.timeout_secs {
            Some(secs) => Some(secs),
            None => match env(ENV_TIMEOUT) {
                Some(raw) => Some(raw.trim().parse::<u64>().with_context(|| {
                    format!("{ENV_TIMEOUT} must be whole seconds, got '{raw}'")
                })?),
                None => file.timeout_secs,
            },
        };
        let timeout = timeout_secs.filter(|s| *s > 0).map(Duration::from_secs);

        let mut headers: Vec<(String, String)> = file.headers.into_iter().collect();
        for raw in &input.headers {
            let (name, value) = parse_header(raw)?;
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        Ok(Settings {
            server,
            token,
            headers,
            timeout,
        })
    }
}

/// Split a `KEY=VALUE` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("header must be KEY=VALUE, got '{raw}'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in '{raw}'");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn load_config_file(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();

    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml::from_str(&raw).context("failed to parse YAML config file")
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON config file")
    }
}
