/*!
`latest.rs`

Mode `latest`: resolve the newest calibration, pick its newest run that has
an id, stage both archives, report `"<hash_id> <run_id>"`.

Handled failures (empty stdout line, exit 1):
  - the service has no calibration
  - the calibration has no result rows
  - no row carries a non-empty `run_id`

The calibration archive is staged before the result list is consulted, so
a calibration without usable runs is still downloaded.
*/

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use super::mode::Mode;
use super::shared::{Outcome, StageFolders, select_run};
use crate::client::CalibrationService;

const TAG: &str = Mode::Latest.tag();

/// Entry point for `calib-fetch latest`.
pub fn execute_latest(
    service: &dyn CalibrationService,
    folders: &StageFolders,
) -> Result<Outcome> {
    let Some(meta) = service
        .latest_calibration()
        .context("latest-calibration lookup failed")?
    else {
        info!("{TAG} No calibrations found on the server.");
        return Ok(Outcome::failure());
    };
    let hash_id = meta.hash_id.as_str();
    info!("{TAG} Latest calibration is {hash_id}");
    if let Some(created_at) = &meta.created_at {
        debug!("{TAG} calibration created at {created_at}");
    }
    trace!("{TAG} metadata fields: {:?}", meta.extra.keys().collect::<Vec<_>>());

    info!("{TAG} Downloading calibration for {hash_id}");
    let calib = service.download_calibration(hash_id, &folders.calibrations)?;
    debug!("{TAG} calibration staged at {}", calib.display());

    let rows = service
        .list_results(hash_id)
        .with_context(|| format!("result listing failed for {hash_id}"))?;
    if rows.is_empty() {
        info!("{TAG} No results found for {hash_id}");
        return Ok(Outcome::failure());
    }
    debug!("{TAG} {} result rows for {hash_id}", rows.len());

    let Some(run_id) = select_run(&rows) else {
        info!("{TAG} No valid runID found for {hash_id}");
        return Ok(Outcome::failure());
    };
    info!("{TAG} Latest run is runID={run_id}");

    info!("{TAG} Downloading results for {hash_id} {run_id}");
    let results = service.download_results(hash_id, run_id, &folders.data)?;
    debug!("{TAG} results staged at {}", results.display());

    Ok(Outcome::selected(hash_id, run_id))
}
