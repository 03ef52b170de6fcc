//! Run configuration.

/// Effective configuration for one session run.
///
/// Parsed once from the command line (see [`crate::cli::args::RunnerArgs`])
/// or built directly by embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Wrap status tags in ANSI colours.
    pub color: bool,
    /// Overwrite a test's RUN line with its PASS line.
    pub oneliners: bool,
    /// Only report failing tests.
    pub fails_only: bool,
}

impl Config {
    pub const fn new(color: bool, oneliners: bool, fails_only: bool) -> Self {
        Self {
            color,
            oneliners,
            fails_only,
        }
    }

    /// Default configuration with colours switched off.
    pub const fn plain() -> Self {
        Self::new(false, false, false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(true, false, false)
    }
}
