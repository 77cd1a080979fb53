//! Server URL parsing and endpoint construction.
//!
//! parse_server -> Url (http/https only, path normalized to end in '/')
//! endpoint     -> base + percent-encoded path segments
//!
use anyhow::{Context, Result, bail};
use url::Url;

/// Base URL used when nothing else is configured.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000/";

/// Parse a user-supplied server string into a base URL.
///
/// Parsing Strategy:
/// 1. Reject empty input.
/// 2. Parse as URL; only `http` and `https` are accepted.
/// 3. Ensure the path ends in `/` so relative endpoints nest under it.
///
/// Examples:
/// - "https://calib.example.org/api" -> https://calib.example.org/api/
/// - "http://10.0.0.5:8000"          -> http://10.0.0.5:8000/
pub fn parse_server(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Server URL is empty");
    }

    let mut url =
        Url::parse(trimmed).with_context(|| format!("Invalid server URL: '{trimmed}'"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported server scheme '{other}' (expected http or https)"),
    }
    if url.cannot_be_a_base() {
        bail!("Server URL cannot be used as a base: '{trimmed}'");
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Join path segments onto `base`, percent-encoding each segment.
///
/// Identifiers are passed as whole segments, so a `/` inside an id cannot
/// escape into another route.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Server URL cannot be used as a base: {base}"))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
