//! Assertion recording.
//!
//! Assertions are non-fatal checks: a failed `require!` bumps the failure
//! counter of the test that is currently recording, writes a diagnostic line
//! through that test's printer and lets the body carry on. The "current test"
//! is a per-thread slot installed by [`Recording::start`] and cleared by
//! [`Recording::finish`]; the session wraps every test body in one.
//!
//! A failing check made while nothing is recording has no test to be
//! attributed to, so it panics with the diagnostic instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cli::output::SharedPrinter;

// ============================================================================
// SOURCE LOCATIONS AND COUNTERS
// ============================================================================

/// Logical source position of an assertion or expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the caller of a `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        std::panic::Location::caller().into()
    }
}

impl From<&'static std::panic::Location<'static>> for Location {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Expands to the [`Location`] of the macro call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::assert::Location::new(file!(), line!())
    };
}

/// Per-test counters. `failed <= assertions` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestStats {
    pub assertions: usize,
    pub failed: usize,
}

impl TestStats {
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// RECORDING SCOPE
// ============================================================================

struct ActiveTest {
    stats: TestStats,
    printer: SharedPrinter,
}

thread_local! {
    static ACTIVE: RefCell<Option<ActiveTest>> = const { RefCell::new(None) };
}

/// Guard that makes assertions on this thread count towards one test.
///
/// Recordings nest: starting one while another is active suspends the outer
/// one until the inner is finished or dropped.
#[must_use = "assertions are only recorded while the guard is alive"]
pub struct Recording {
    outer: Option<ActiveTest>,
    finished: bool,
}

impl Recording {
    pub fn start(printer: SharedPrinter) -> Self {
        let test = ActiveTest {
            stats: TestStats::default(),
            printer,
        };
        let outer = ACTIVE.with(|active| active.borrow_mut().replace(test));
        Self {
            outer,
            finished: false,
        }
    }

    /// Ends the recording and returns what it counted.
    pub fn finish(mut self) -> TestStats {
        self.finished = true;
        let outer = self.outer.take();
        let ended = ACTIVE.with(|active| std::mem::replace(&mut *active.borrow_mut(), outer));
        ended.map(|test| test.stats).unwrap_or_default()
    }

    /// Counters of the recording currently active on this thread.
    pub fn current() -> Option<TestStats> {
        ACTIVE.with(|active| active.borrow().as_ref().map(|test| test.stats))
    }
}

impl Drop for Recording {
    fn drop(&mut self) {
        if !self.finished {
            let outer = self.outer.take();
            ACTIVE.with(|active| *active.borrow_mut() = outer);
        }
    }
}

fn record(passed: bool, diagnostic: impl FnOnce() -> String) {
    let printer = ACTIVE.with(|active| {
        let mut active = active.borrow_mut();
        let test = active.as_mut()?;
        test.stats.assertions += 1;
        if passed {
            return None;
        }
        test.stats.failed += 1;
        Some(Rc::clone(&test.printer))
    });

    match printer {
        Some(printer) => {
            printer.borrow_mut().write(&diagnostic());
        }
        None if passed => {}
        None => unattributed(diagnostic()),
    }
}

fn unattributed(diagnostic: String) {
    if std::thread::panicking() {
        log::error!("{}", diagnostic.trim_end());
    } else {
        panic!("{}", diagnostic.trim_end());
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub fn require_true(condition: bool, expr: &str, at: Location) {
    record(condition, || {
        format!("assertion failed: {at} '{expr}' is false\n")
    });
}

pub fn require_false(condition: bool, expr: &str, at: Location) {
    record(!condition, || format!("assertion failed: {at} '{expr}' is true\n"));
}

/// Checks `lhs == rhs`, rendering both values with `Debug` on failure.
pub fn require_eq<L, R>(lhs: &L, rhs: &R, lhs_expr: &str, rhs_expr: &str, at: Location)
where
    L: PartialEq<R> + fmt::Debug + ?Sized,
    R: fmt::Debug + ?Sized,
{
    record(lhs == rhs, || {
        format!("assertion failed: {at} '{lhs_expr}' isn't '{rhs_expr}': {lhs:?} != {rhs:?}\n")
    });
}

/// Checks a mock expectation's call count.
pub fn require_call(mock: &str, expected: usize, actual: usize, at: Location) {
    record(expected == actual, || {
        format!("assertion failed: {at} {mock}: expected to be called: {expected}; actual: {actual}\n")
    });
}

/// Records a failed call-count check whose counts could not be read.
pub fn require_call_unverified(mock: &str, at: Location) {
    record(false, || {
        format!("assertion failed: {at} {mock}: expectation dropped while the mock was in use\n")
    });
}

/// `require!(cond)` records a check that `cond` holds.
#[macro_export]
macro_rules! require {
    ($cond:expr $(,)?) => {
        $crate::assert::require_true($cond, stringify!($cond), $crate::location!())
    };
}

/// `require_false!(cond)` records a check that `cond` does not hold.
#[macro_export]
macro_rules! require_false {
    ($cond:expr $(,)?) => {
        $crate::assert::require_false($cond, stringify!($cond), $crate::location!())
    };
}

/// `require_eq!(actual, expected)` records an equality check.
#[macro_export]
macro_rules! require_eq {
    ($lhs:expr, $rhs:expr $(,)?) => {
        match (&$lhs, &$rhs) {
            (lhs, rhs) => $crate::assert::require_eq(
                lhs,
                rhs,
                stringify!($lhs),
                stringify!($rhs),
                $crate::location!(),
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::{Printer, SharedOutput};

    fn recording() -> (Recording, SharedOutput) {
        let output = SharedOutput::new();
        (Recording::start(Printer::capture(&output).shared()), output)
    }

    #[test]
    fn counts_every_check() {
        let (recording, output) = recording();
        crate::require_eq!(1, 1);
        crate::require!(false);
        crate::require_false!(true);
        let stats = recording.finish();

        assert_eq!(stats, TestStats { assertions: 3, failed: 2 });
        let text = output.contents();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("'false' is false"));
        assert!(text.contains("'true' is true"));
    }

    #[test]
    fn passing_checks_print_nothing() {
        let (recording, output) = recording();
        crate::require!(2 > 1);
        crate::require_false!(1 > 2);
        crate::require_eq!("abc", "abc");
        assert_eq!(recording.finish().failed, 0);
        assert!(output.contents().is_empty());
    }

    #[test]
    fn equality_diagnostic_shows_source_and_values() {
        let (recording, output) = recording();
        let owned = String::from("yatf");
        crate::require_eq!(owned, "yatf");
        crate::require_eq!(owned.len(), 5);
        let stats = recording.finish();

        assert_eq!(stats, TestStats { assertions: 2, failed: 1 });
        let text = output.contents();
        assert!(text.starts_with("assertion failed: src/assert.rs:"));
        assert!(text.ends_with("'owned.len()' isn't '5': 4 != 5\n"));
    }

    #[test]
    fn call_count_diagnostic() {
        let (recording, output) = recording();
        require_call("fetch", 2, 1, Location::new("lib.rs", 7));
        require_call("fetch", 1, 1, Location::new("lib.rs", 8));
        assert_eq!(recording.finish(), TestStats { assertions: 2, failed: 1 });
        assert_eq!(
            output.contents(),
            "assertion failed: lib.rs:7 fetch: expected to be called: 2; actual: 1\n"
        );
    }

    #[test]
    fn unverified_call_check_always_fails() {
        let (recording, output) = recording();
        require_call_unverified("fetch", Location::new("lib.rs", 9));
        assert_eq!(recording.finish(), TestStats { assertions: 1, failed: 1 });
        assert_eq!(
            output.contents(),
            "assertion failed: lib.rs:9 fetch: expectation dropped while the mock was in use\n"
        );
    }

    #[test]
    fn recordings_nest() {
        let (outer, _) = recording();
        crate::require!(true);
        {
            let (inner, _) = recording();
            crate::require!(false);
            assert_eq!(inner.finish(), TestStats { assertions: 1, failed: 1 });
        }
        crate::require!(true);
        assert_eq!(outer.finish(), TestStats { assertions: 2, failed: 0 });
        assert_eq!(Recording::current(), None);
    }

    #[test]
    fn dropped_recording_restores_outer() {
        let (outer, _) = recording();
        drop(recording());
        crate::require!(true);
        assert_eq!(outer.finish().assertions, 1);
    }

    #[test]
    #[should_panic(expected = "'1 == 2' is false")]
    fn failure_outside_recording_panics() {
        crate::require!(1 == 2);
    }

    #[test]
    fn success_outside_recording_is_silent() {
        crate::require!(true);
        assert_eq!(Recording::current(), None);
    }
}
