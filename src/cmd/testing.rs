//! In-memory `CalibrationService` that records every call, for handler tests.

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::shared::StageFolders;
use crate::client::{BestRun, CalibrationMeta, CalibrationService, ResultRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BestRun,
    LatestCalibration,
    DownloadCalibration(String, PathBuf),
    ListResults(String),
    DownloadResults(String, String, PathBuf),
}

#[derive(Default)]
pub struct FakeService {
    pub best: Option<BestRun>,
    pub latest: Option<CalibrationMeta>,
    pub rows: Vec<ResultRow>,
    pub fail_calibration_download: bool,
    pub fail_results_download: bool,
    pub fail_listing: bool,
    pub log: RefCell<Vec<Call>>,
}

impl FakeService {
    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn download_count(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::DownloadCalibration(..) | Call::DownloadResults(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl CalibrationService for FakeService {
    fn best_run(&self) -> Result<Option<BestRun>> {
        self.record(Call::BestRun);
        Ok(self.best.clone())
    }

    fn latest_calibration(&self) -> Result<Option<CalibrationMeta>> {
        self.record(Call::LatestCalibration);
        Ok(self.latest.clone())
    }

    fn download_calibration(&self, hash_id: &str, output_folder: &Path) -> Result<PathBuf> {
        self.record(Call::DownloadCalibration(
            hash_id.to_string(),
            output_folder.to_path_buf(),
        ));
        if self.fail_calibration_download {
            bail!("calibration download refused for {hash_id}");
        }
        Ok(output_folder.join(format!("{hash_id}.zip")))
    }

    fn list_results(&self, hash_id: &str) -> Result<Vec<ResultRow>> {
        self.record(Call::ListResults(hash_id.to_string()));
        if self.fail_listing {
            bail!("listing unavailable");
        }
        Ok(self.rows.clone())
    }

    fn download_results(
        &self,
        hash_id: &str,
        run_id: &str,
        output_folder: &Path,
    ) -> Result<PathBuf> {
        self.record(Call::DownloadResults(
            hash_id.to_string(),
            run_id.to_string(),
            output_folder.to_path_buf(),
        ));
        if self.fail_results_download {
            bail!("results download refused for {hash_id} {run_id}");
        }
        Ok(output_folder.join(format!("{hash_id}_{run_id}.zip")))
    }
}

/// Folders with short relative names so call assertions stay readable.
pub fn folders() -> StageFolders {
    StageFolders {
        data: PathBuf::from("data"),
        calibrations: PathBuf::from("cal"),
    }
}
