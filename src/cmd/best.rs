/*!
`best.rs`

Mode `best`: ask the service for its globally best run, stage the
calibration and result archives for it, report `"<hash_id> <run_id>"`.

A service that has no best run (404 / `null`) or returns an empty
identifier yields a handled failure before any download.
*/

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::mode::Mode;
use super::shared::{Outcome, StageFolders, stage_pair};
use crate::client::CalibrationService;

const TAG: &str = Mode::Best.tag();

/// Entry point for `calib-fetch best`.
pub fn execute_best(service: &dyn CalibrationService, folders: &StageFolders) -> Result<Outcome> {
    let best = service.best_run().context("best-run lookup failed")?;

    let Some(best) = best.filter(|b| b.is_usable()) else {
        info!("{TAG} No best run available on the server.");
        return Ok(Outcome::failure());
    };

    info!("{TAG} Best run: hashID={}, runID={}", best.hash_id, best.run_id);
    if let Some(created_at) = &best.created_at {
        debug!("{TAG} best run created at {created_at}");
    }

    stage_pair(service, folders, TAG, &best.hash_id, &best.run_id)?;
    Ok(Outcome::selected(&best.hash_id, &best.run_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BestRun;
    use crate::cmd::testing::{Call, FakeService, folders};

    fn best(hash: &str, run: &str) -> BestRun {
        BestRun {
            hash_id: hash.into(),
            run_id: run.into(),
            created_at: Some("2024-06-01T12:00:00Z".into()),
        }
    }

    #[test]
    fn downloads_calibration_then_results() {
        let svc = FakeService {
            best: Some(best("H", "R")),
            ..Default::default()
        };
        let out = execute_best(&svc, &folders()).unwrap();
        assert_eq!(out, Outcome::selected("H", "R"));
        assert_eq!(out.stdout_line, "H R");
        assert_eq!(
            svc.calls(),
            vec![
                Call::BestRun,
                Call::DownloadCalibration("H".into(), "cal".into()),
                Call::DownloadResults("H".into(), "R".into(), "data".into()),
            ]
        );
    }

    #[test]
    fn no_best_run_is_handled_failure() {
        let svc = FakeService::default();
        let out = execute_best(&svc, &folders()).unwrap();
        assert_eq!(out, Outcome::failure());
        assert_eq!(svc.calls(), vec![Call::BestRun]);
    }

    #[test]
    fn empty_run_id_is_handled_failure() {
        let svc = FakeService {
            best: Some(best("H", "")),
            ..Default::default()
        };
        let out = execute_best(&svc, &folders()).unwrap();
        assert_eq!(out.stdout_line, "");
        assert_eq!(svc.download_count(), 0);
    }

    #[test]
    fn calibration_failure_stops_before_results() {
        let svc = FakeService {
            best: Some(best("H", "R")),
            fail_calibration_download: true,
            ..Default::default()
        };
        let err = execute_best(&svc, &folders()).unwrap_err();
        assert!(err.to_string().contains("calibration download refused"));
        assert_eq!(
            svc.calls(),
            vec![Call::BestRun, Call::DownloadCalibration("H".into(), "cal".into())]
        );
    }

    #[test]
    fn repeated_invocations_print_same_line() {
        let svc = FakeService {
            best: Some(best("H", "R")),
            ..Default::default()
        };
        let first = execute_best(&svc, &folders()).unwrap();
        let second = execute_best(&svc, &folders()).unwrap();
        assert_eq!(first.stdout_line, second.stdout_line);
    }
}
