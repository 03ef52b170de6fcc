//! Command-line flags for the test runner.
//!
//! This module uses the `clap` crate with its "derive" feature; the flags map
//! one-to-one onto [`Config`].

use clap::Parser;

use crate::config::Config;

/// The runner's argument structure.
#[derive(Debug, Parser)]
#[command(name = "yatf", version, about = "Runs the registered yatf test cases.")]
pub struct RunnerArgs {
    /// Disable ANSI colours in the report.
    #[arg(long)]
    pub no_color: bool,

    /// Overwrite each RUN line with its result instead of appending a new line.
    #[arg(long)]
    pub oneliners: bool,

    /// Only report failing tests.
    #[arg(long)]
    pub fails_only: bool,

    /// Run a single test, given as `suite.case`.
    #[arg(value_name = "TEST")]
    pub test: Option<String>,
}

impl RunnerArgs {
    pub fn config(&self) -> Config {
        Config::new(!self.no_color, self.oneliners, self.fails_only)
    }
}
