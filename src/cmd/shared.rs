/*!
shared.rs - types and helpers shared by the three mode handlers.

Focus:
  - Outcome: status + the single stdout line
  - StageFolders: where calibration and result archives land
  - select_run: first usable run id in a newest-first list
  - stage_pair: the calibration-then-results download pair
*/

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use crate::client::{CalibrationService, ResultRow};

/* ---- Outcome ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

/// Result of one invocation: exit status plus the line written to stdout.
///
/// Success lines are exactly `"<hash_id> <run_id>"`. Every handled failure
/// produces an empty line so that `read HASH RUN` in a shell still consumes
/// exactly one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub stdout_line: String,
}

impl Outcome {
    pub fn selected(hash_id: &str, run_id: &str) -> Self {
        Self {
            status: Status::Success,
            stdout_line: format!("{hash_id} {run_id}"),
        }
    }

    pub fn failure() -> Self {
        Self {
            status: Status::Failure,
            stdout_line: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::from(1),
        }
    }
}

/* ---- Destination folders ---- */

/// Download destinations. Created on demand by the client, never cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFolders {
    pub data: PathBuf,
    pub calibrations: PathBuf,
}

/* ---- Selection ---- */

/// First row, in list order, that carries a non-empty run id.
///
/// The list is trusted to be newest first. Rows without an id (runs still in
/// progress, half-written entries) are skipped rather than treated as fatal.
pub fn select_run(rows: &[ResultRow]) -> Option<&str> {
    rows.iter().find_map(ResultRow::run_id)
}

/// Download the calibration archive, then the result archive.
///
/// Any client error stops the sequence; results are never fetched for a
/// calibration that failed to stage.
pub fn stage_pair(
    service: &dyn CalibrationService,
    folders: &StageFolders,
    tag: &str,
    hash_id: &str,
    run_id: &str,
) -> Result<()> {
    info!("{tag} Downloading calibration for {hash_id}");
    let calib = service.download_calibration(hash_id, &folders.calibrations)?;
    debug!("{tag} calibration staged at {}", calib.display());

    info!("{tag} Downloading results: hashID={hash_id}, runID={run_id}");
    let results = service.download_results(hash_id, run_id, &folders.data)?;
    debug!("{tag} results staged at {}", results.display());
    Ok(())
}
