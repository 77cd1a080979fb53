/*!
Mode dispatcher.

Layout:
  src/cmd/
    mod.rs       (this file: Command + dispatch)
    mode.rs      (Mode value enum + diagnostic tag)
    shared.rs    (Outcome, StageFolders, select_run, stage_pair)
    best.rs      (execute_best)
    latest.rs    (execute_latest)
    specific.rs  (execute_specific)

Conventions:
  - Each mode module exposes exactly one public `execute_*` function that
    returns `anyhow::Result<Outcome>`.
  - `Ok(Outcome)` covers every designed outcome, including "nothing
    available". `Err` is reserved for client failures.
  - Handlers never write to stdout; `main` prints `Outcome::stdout_line`.
*/

pub mod best;
pub mod latest;
pub mod mode;
pub mod shared;
pub mod specific;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;

pub use best::execute_best;
pub use latest::execute_latest;
pub use mode::Mode;
pub use shared::{Outcome, StageFolders};
pub use specific::execute_specific;

use crate::client::CalibrationService;

/// A fully parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Best,
    Latest,
    Specific {
        hash_id: Option<String>,
        run_id: Option<String>,
    },
}

impl Command {
    /// Build from the positional arguments. Identifiers are dropped for modes
    /// that do not read them.
    pub fn from_args(mode: Mode, hash_id: Option<String>, run_id: Option<String>) -> Self {
        match mode {
            Mode::Best => Command::Best,
            Mode::Latest => Command::Latest,
            Mode::Specific => Command::Specific { hash_id, run_id },
        }
    }

    /// Outcome that follows from the arguments alone, before settings are
    /// resolved or any service exists. `None` means the mode has to run.
    pub fn preflight(&self) -> Option<Outcome> {
        match self {
            Command::Specific { hash_id, run_id }
                if specific::required_identifiers(hash_id.as_deref(), run_id.as_deref())
                    .is_none() =>
            {
                Some(Outcome::failure())
            }
            _ => None,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Command::Best => Mode::Best,
            Command::Latest => Mode::Latest,
            Command::Specific { .. } => Mode::Specific,
        }
    }
}

/// Route a command to its handler.
pub fn dispatch(
    command: &Command,
    service: &dyn CalibrationService,
    folders: &StageFolders,
) -> Result<Outcome> {
    match command {
        Command::Best => execute_best(service, folders),
        Command::Latest => execute_latest(service, folders),
        Command::Specific { hash_id, run_id } => {
            execute_specific(service, folders, hash_id.as_deref(), run_id.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{Call, FakeService, folders};

    #[test]
    fn best_and_latest_drop_identifiers() {
        let cmd = Command::from_args(Mode::Latest, Some("h".into()), Some("r".into()));
        assert_eq!(cmd, Command::Latest);
        assert_eq!(cmd.mode(), Mode::Latest);
        assert_eq!(Command::from_args(Mode::Best, Some("h".into()), None), Command::Best);
    }

    #[test]
    fn preflight_rejects_incomplete_specific_only() {
        let partial = Command::from_args(Mode::Specific, Some("abc".into()), None);
        assert_eq!(partial.preflight(), Some(Outcome::failure()));
        let empty = Command::from_args(Mode::Specific, Some("".into()), Some("1".into()));
        assert_eq!(empty.preflight(), Some(Outcome::failure()));

        let full = Command::from_args(Mode::Specific, Some("abc".into()), Some("1".into()));
        assert_eq!(full.preflight(), None);
        assert_eq!(Command::Best.preflight(), None);
        assert_eq!(Command::Latest.preflight(), None);
    }

    #[test]
    fn dispatch_routes_specific() {
        let svc = FakeService::default();
        let cmd = Command::from_args(Mode::Specific, Some("abc".into()), Some("123".into()));
        let out = dispatch(&cmd, &svc, &folders()).unwrap();
        assert_eq!(out.stdout_line, "abc 123");
        assert_eq!(svc.calls().len(), 2);
    }

    #[test]
    fn dispatch_routes_latest() {
        let svc = FakeService::default();
        let out = dispatch(&Command::Latest, &svc, &folders()).unwrap();
        assert_eq!(out, Outcome::failure());
        assert_eq!(svc.calls(), vec![Call::LatestCalibration]);
    }
}
