//! Utilities: logging (dynamic level) on top of `tracing`.
//!
//! Key items:
//!   init_logging / derive_level
//!
//! All diagnostics go to stderr. stdout is reserved for the single result line.

/// Logging helpers.
pub mod logging {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    /// Map `-v` / `-q` flags onto a level filter.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Install the global stderr subscriber.
    ///
    /// At INFO (or quieter) each line is the bare message so diagnostics read
    /// `[latest] Downloading calibration for ...`. More verbose levels add
    /// level and target. `RUST_LOG` takes precedence over the derived level.
    pub fn init_logging(level: LevelFilter) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("calib_fetch={level},warn")));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false);

        // A second init (e.g. in tests) is harmless; keep the first subscriber.
        let _ = if level > LevelFilter::INFO {
            builder.with_target(true).try_init()
        } else {
            builder
                .without_time()
                .with_level(false)
                .with_target(false)
                .try_init()
        };
    }

}

pub use logging::{derive_level, init_logging};

// End of utils module.
