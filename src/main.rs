use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod client;
mod cmd;
mod config;
mod utils;

use client::HttpService;
use cmd::{Command, Mode, StageFolders};
use config::{Settings, SettingsInput};

/// Calib Fetch - stage calibration and result archives from the calibration database.
///
/// Modes:
///   calib-fetch best                      globally best run
///   calib-fetch latest                    newest calibration, newest run with an id
///   calib-fetch specific HASH_ID RUN_ID   explicit pair
///
/// stdout carries exactly one line: "HASH_ID RUN_ID" on success, an empty line
/// when nothing could be selected. Progress goes to stderr.
///
/// Exit codes:
///   0  archives staged
///   1  nothing selected, missing identifiers, or a server/transfer error
///   2  invalid configuration
///
/// Server settings (flag > env > config file > default):
///   -s/--server   CALIBDB_URL      (default http://127.0.0.1:8000/)
///   --token       CALIBDB_TOKEN    (Bearer auth)
///   --timeout     CALIBDB_TIMEOUT  (seconds, 0 = none)
///   -c/--config   CALIBDB_CONFIG   (YAML or JSON)
///
/// Examples:
///   read -r HASH RUN < <(calib-fetch latest)
///   calib-fetch specific 3f9a0c 1187 --data-folder /scratch/data
///   calib-fetch best -s https://calib.example.org/api -H X-Site=lab-a
#[derive(Parser, Debug)]
#[command(
    name = "calib-fetch",
    version,
    author,
    about = "Calib Fetch - stage calibration and result archives from the calibration database"
)]
pub struct Cli {
    /// Selection mode
    #[arg(value_enum, value_name = "MODE")]
    mode: Mode,

    /// Calibration hash id (specific mode only)
    #[arg(value_name = "HASH_ID")]
    hash_id: Option<String>,

    /// Run id (specific mode only)
    #[arg(value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Destination for result archives
    #[arg(long, value_name = "PATH", default_value = "./data")]
    data_folder: PathBuf,

    /// Destination for calibration archives
    #[arg(long, value_name = "PATH", default_value = "./data/calibrations")]
    calib_folder: PathBuf,

    /// Calibration database base URL (or CALIBDB_URL env)
    #[arg(short = 's', long, value_name = "URL")]
    server: Option<String>,

    /// Bearer token (or CALIBDB_TOKEN env)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Extra request header(s) (repeatable KEY=VALUE)
    #[arg(short = 'H', long = "header", value_name = "KEY=VALUE")]
    headers: Vec<String>,

    /// Request timeout in seconds (or CALIBDB_TIMEOUT env)
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Config file, YAML or JSON (or CALIBDB_CONFIG env)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn settings_input(&self) -> SettingsInput {
        SettingsInput {
            server: self.server.clone(),
            token: self.token.clone(),
            headers: self.headers.clone(),
            timeout_secs: self.timeout,
            config: self.config.clone(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    if !cli.mode.takes_identifiers() && (cli.hash_id.is_some() || cli.run_id.is_some()) {
        debug!("{} ignoring positional identifiers", cli.mode.tag());
    }

    let command = Command::from_args(cli.mode, cli.hash_id.clone(), cli.run_id.clone());
    if let Some(outcome) = command.preflight() {
        println!("{}", outcome.stdout_line);
        return Ok(outcome.exit_code());
    }

    // Configuration problems are reported before any mode runs.
    let service = match Settings::resolve(cli.settings_input())
        .and_then(|settings| HttpService::new(&settings))
    {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{}", invalid_config_message(cli.mode, &e));
            return Ok(ExitCode::from(2));
        }
    };
    debug!("{} using calibration database {}", cli.mode.tag(), service.server());

    let folders = StageFolders {
        data: cli.data_folder,
        calibrations: cli.calib_folder,
    };

    let outcome = cmd::dispatch(&command, &service, &folders)?;
    debug!("{} done, success={}", command.mode().tag(), outcome.is_success());

    // The result line.
    println!("{}", outcome.stdout_line);
    Ok(outcome.exit_code())
}

fn invalid_config_message(mode: Mode, err: &anyhow::Error) -> String {
    format!("{} Invalid configuration: {err:#}", mode.tag())
}
