/*!
Mode enum for the positional MODE argument.

Variants:
  best     (service-wide best run)
  latest   (newest calibration, newest valid run)
  specific (caller-supplied HASH_ID + RUN_ID)

Helpers:
  - tag()
  - takes_identifiers()
*/

use std::fmt;

/// Selection strategy for the calibration / run pair.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Globally best run as ranked by the service
    Best,
    /// Most recent calibration and its newest run with an id
    Latest,
    /// Explicit HASH_ID and RUN_ID
    Specific,
}

impl Mode {
    /// Bracketed prefix used on every diagnostic line of this mode.
    pub const fn tag(&self) -> &'static str {
        match self {
            Mode::Best => "[best]",
            Mode::Latest => "[latest]",
            Mode::Specific => "[specific]",
        }
    }

    /// Whether positional HASH_ID / RUN_ID are read in this mode.
    pub fn takes_identifiers(&self) -> bool {
        matches!(self, Mode::Specific)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Best => "best",
            Mode::Latest => "latest",
            Mode::Specific => "specific",
        };
        f.write_str(s)
    }
}

/* --------------------------------- Tests ---------------------------------- */
