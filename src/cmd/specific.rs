/*!
`specific.rs`

Mode `specific`: the caller names both identifiers. No lookup or selection
happens; both archives are staged and the pair is echoed back.
*/

use anyhow::Result;
use tracing::error;

use super::mode::Mode;
use super::shared::{Outcome, StageFolders, stage_pair};
use crate::client::CalibrationService;

const TAG: &str = Mode::Specific.tag();

/// Both identifiers, or `None` after logging when either is missing or empty.
pub fn required_identifiers<'a>(
    hash_id: Option<&'a str>,
    run_id: Option<&'a str>,
) -> Option<(&'a str, &'a str)> {
    match (hash_id.filter(|s| !s.is_empty()), run_id.filter(|s| !s.is_empty())) {
        (Some(hash_id), Some(run_id)) => Some((hash_id, run_id)),
        _ => {
            error!("{TAG} specific mode requires HASH_ID and RUN_ID");
            None
        }
    }
}

/// Entry point for `calib-fetch specific HASH_ID RUN_ID`.
///
/// A missing or empty identifier is reported before any remote call.
pub fn execute_specific(
    service: &dyn CalibrationService,
    folders: &StageFolders,
    hash_id: Option<&str>,
    run_id: Option<&str>,
) -> Result<Outcome> {
    let Some((hash_id, run_id)) = required_identifiers(hash_id, run_id) else {
        return Ok(Outcome::failure());
    };

    stage_pair(service, folders, TAG, hash_id, run_id)?;
    Ok(Outcome::selected(hash_id, run_id))
}
