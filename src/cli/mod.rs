//! The yatf command-line runner.
//!
//! A test binary calls [`run`] from `main`; the flags are parsed into a
//! [`Config`](crate::config::Config) and the per-thread session (holding every
//! [`yatf_test!`](crate::yatf_test) declaration) is run with it.

use std::ffi::OsString;
use std::process;

use clap::Parser;

use crate::cli::args::RunnerArgs;
use crate::session;

pub mod args;
pub mod output;

/// Parses `args` and runs the registered tests.
///
/// Returns the session result: the number of failures, or `-1` for a test
/// name that does not resolve.
pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = RunnerArgs::parse_from(args);
    let config = args.config();
    log::debug!("runner configuration: {config:?}");
    session::with(|session| session.run(config, args.test.as_deref()))
}

/// The main entry point for a test binary. Exits with the session result.
pub fn run() -> ! {
    let code = run_with_args(std::env::args_os());
    process::exit(code)
}
