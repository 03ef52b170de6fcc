//! Test registration and execution.
//!
//! A [`Session`] keeps every registered [`TestCase`] in an intrusive list, in
//! registration order, and runs them one at a time. Each body runs inside an
//! assertion [`Recording`], so `require!` and friends count towards the test
//! being executed.
//!
//! Tests declared with [`yatf_test!`](crate::yatf_test) are collected at link
//! time (through `inventory`) and appended to the per-thread session that
//! [`with`] hands out, the first time it is used.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::arena::{Arena, ArenaIndex};
use crate::assert::{Location, Recording, TestStats};
use crate::cli::output::{Printer, SharedPrinter};
use crate::config::Config;
use crate::errors::{Result, YatfError};
use crate::list::{IntrusiveList, Link};

pub mod messages;

use messages::Message;

// ============================================================================
// TEST CASES
// ============================================================================

/// One registered test.
pub struct TestCase {
    suite: String,
    name: String,
    body: Rc<dyn Fn()>,
    location: Option<Location>,
    stats: TestStats,
    link: Link,
}

impl TestCase {
    pub fn new(suite: impl Into<String>, name: impl Into<String>, body: impl Fn() + 'static) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            body: Rc::new(body),
            location: None,
            stats: TestStats::default(),
            link: Link::new(),
        }
    }

    /// Records where the test was declared.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Counters from the most recent run of this test.
    pub fn stats(&self) -> TestStats {
        self.stats
    }

    /// `suite.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("location", &self.location)
            .field("stats", &self.stats)
            .finish()
    }
}

// ============================================================================
// STATIC REGISTRATION
// ============================================================================

/// A test declared with [`yatf_test!`](crate::yatf_test), collected at link
/// time.
#[derive(Debug)]
pub struct TestRegistration {
    pub suite: &'static str,
    pub name: &'static str,
    pub body: fn(),
    pub file: &'static str,
    pub line: u32,
}

impl TestRegistration {
    pub const fn new(
        suite: &'static str,
        name: &'static str,
        body: fn(),
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            suite,
            name,
            body,
            file,
            line,
        }
    }
}

inventory::collect!(TestRegistration);

static REGISTRY: Lazy<Vec<&'static TestRegistration>> = Lazy::new(|| {
    let mut tests: Vec<_> = inventory::iter::<TestRegistration>.into_iter().collect();
    // inventory yields the newest submission first; flip it so that tests
    // sharing a line (declared by one macro call) keep declaration order.
    tests.reverse();
    tests.sort_by_key(|test| (test.file, test.line));
    tests
});

/// Every statically declared test, ordered by file and then by line. Tests
/// declared on the same line keep their declaration order.
pub fn registered_tests() -> &'static [&'static TestRegistration] {
    &REGISTRY
}

impl From<&'static TestRegistration> for TestCase {
    fn from(test: &'static TestRegistration) -> Self {
        TestCase::new(test.suite, test.name, test.body).at(Location::new(test.file, test.line))
    }
}

/// Runs `body` with a freshly built fixture, dropping it afterwards.
pub fn with_fixture<F, B>(body: B)
where
    F: Default,
    B: FnOnce(&mut F),
{
    let mut fixture = F::default();
    body(&mut fixture);
}

/// Declares a test case.
///
/// ```ignore
/// yatf_test!(math, addition, {
///     require_eq!(2 + 2, 4);
/// });
///
/// yatf_test!(stack, push, StackFixture, |fixture| {
///     fixture.stack.push(1);
///     require_eq!(fixture.stack.len(), 1);
/// });
/// ```
#[macro_export]
macro_rules! yatf_test {
    ($suite:ident, $name:ident, $body:block) => {
        const _: () = {
            fn body() $body

            $crate::__private::inventory::submit! {
                $crate::session::TestRegistration::new(
                    stringify!($suite),
                    stringify!($name),
                    body,
                    file!(),
                    line!(),
                )
            }
        };
    };
    ($suite:ident, $name:ident, $fixture:ty, |$f:ident| $body:block) => {
        const _: () = {
            fn body() {
                $crate::session::with_fixture::<$fixture, _>(|$f: &mut $fixture| $body);
            }

            $crate::__private::inventory::submit! {
                $crate::session::TestRegistration::new(
                    stringify!($suite),
                    stringify!($name),
                    body,
                    file!(),
                    line!(),
                )
            }
        };
    };
}

// ============================================================================
// SESSION
// ============================================================================

/// The set of registered tests plus the output they report to.
pub struct Session {
    tests: Arena<TestCase>,
    order: IntrusiveList<TestCase>,
    config: Config,
    printer: SharedPrinter,
}

impl Session {
    /// An empty session.
    pub fn new(printer: Printer) -> Self {
        Self {
            tests: Arena::new(),
            order: IntrusiveList::new(crate::link_field!(TestCase, link)),
            config: Config::default(),
            printer: printer.shared(),
        }
    }

    /// A session holding every test declared with
    /// [`yatf_test!`](crate::yatf_test).
    pub fn with_registered_tests(printer: Printer) -> Self {
        let mut session = Self::new(printer);
        for test in registered_tests() {
            session.register(TestCase::from(*test));
        }
        session
    }

    /// Appends `test`; it runs after everything registered before it.
    pub fn register(&mut self, test: TestCase) -> ArenaIndex {
        log::debug!("registering {}.{}", test.suite, test.name);
        let index = self.tests.insert(test);
        self.order.push_back(&mut self.tests, index);
        index
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered tests in run order.
    pub fn tests(&self) -> impl Iterator<Item = &TestCase> {
        self.order.iter(&self.tests)
    }

    /// Configuration of the most recent run.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Replaces the output printer, returning the previous one.
    pub fn set_printer(&mut self, printer: Printer) -> Printer {
        std::mem::replace(&mut *self.printer.borrow_mut(), printer)
    }

    /// Counters from the most recent run of `suite.name`.
    pub fn stats(&self, suite: &str, name: &str) -> Option<TestStats> {
        self.tests()
            .find(|test| test.suite == suite && test.name == name)
            .map(TestCase::stats)
    }

    /// Resolves `suite.name` (split at the first `.`) to a registered test.
    pub fn find(&self, qualified_name: &str) -> Result<ArenaIndex> {
        let (suite, name) =
            qualified_name
                .split_once('.')
                .ok_or_else(|| YatfError::MalformedTestName {
                    name: qualified_name.to_owned(),
                })?;
        self.order
            .entries(&self.tests)
            .find(|(_, test)| test.suite == suite && test.name == name)
            .map(|(index, _)| index)
            .ok_or_else(|| YatfError::UnknownTestName {
                suite: suite.to_owned(),
                case: name.to_owned(),
            })
    }

    /// Runs every test, or only `test_name` when given.
    ///
    /// Returns the number of failed tests for a full run, the number of failed
    /// assertions for a single test, and `-1` when `test_name` does not name a
    /// registered test.
    pub fn run(&mut self, config: Config, test_name: Option<&str>) -> i32 {
        self.config = config;
        self.printer.borrow_mut().set_color_enabled(config.color);

        let Some(test_name) = test_name else {
            return self.run_all();
        };
        match self.find(test_name) {
            Ok(index) => saturate(self.run_test(index).failed),
            Err(err) => {
                log::debug!("cannot run {test_name}: {err}");
                self.report_bad_name(&err);
                -1
            }
        }
    }

    fn run_all(&mut self) -> i32 {
        let total = self.len();
        log::debug!("running {total} test cases");
        self.start_message(total);

        let mut failed = 0;
        let mut cursor = self.order.first();
        while let Some(index) = cursor {
            if !self.run_test(index).passed() {
                failed += 1;
            }
            cursor = self.order.next_after(&self.tests, index);
        }

        self.end_message(total, failed);
        saturate(failed)
    }

    fn run_test(&mut self, index: ArenaIndex) -> TestStats {
        let Some(test) = self.tests.get(index) else {
            return TestStats::default();
        };
        let body = Rc::clone(&test.body);
        let title = test.qualified_name();

        self.test_start_message(&title);
        let recording = Recording::start(Rc::clone(&self.printer));
        body();
        let stats = recording.finish();

        if let Some(test) = self.tests.get_mut(index) {
            test.stats = stats;
        }
        self.test_result_message(&title, stats);
        stats
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    fn tag(&self, message: Message) {
        self.printer
            .borrow_mut()
            .print_in_color(message.tag(), message.color());
    }

    fn start_message(&self, total: usize) {
        self.tag(Message::StartEnd);
        self.printer
            .borrow_mut()
            .write(&format!(" Running {total} test cases\n"));
    }

    fn end_message(&self, total: usize, failed: usize) {
        if !self.config.fails_only {
            self.tag(Message::StartEnd);
            self.printer
                .borrow_mut()
                .write(&format!(" Passed {} test cases\n", total - failed));
        }
        if failed > 0 {
            self.printer
                .borrow_mut()
                .print_in_color(Message::StartEnd.tag(), Message::Fail.color());
            self.printer
                .borrow_mut()
                .write(&format!(" Failed {failed} test cases\n"));
        }
    }

    fn test_start_message(&self, title: &str) {
        if self.config.fails_only {
            return;
        }
        self.tag(Message::Run);
        self.printer.borrow_mut().write(&format!(" {title}\n"));
    }

    fn test_result_message(&self, title: &str, stats: TestStats) {
        if stats.passed() {
            if self.config.fails_only {
                return;
            }
            if self.config.oneliners {
                self.printer.borrow_mut().cursor_up();
            }
            self.tag(Message::Pass);
        } else {
            self.tag(Message::Fail);
        }
        self.printer
            .borrow_mut()
            .write(&format!(" {title} ({} assertions)\n", stats.assertions));
    }

    fn report_bad_name(&self, err: &YatfError) {
        use miette::Diagnostic;

        self.tag(Message::Fail);
        let mut printer = self.printer.borrow_mut();
        printer.write(&format!(" error because of bad test name: {err}\n"));
        if let Some(help) = err.help() {
            printer.write(&format!("           help: {help}\n"));
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tests", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn saturate(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

// ============================================================================
// PER-THREAD SESSION
// ============================================================================

thread_local! {
    static SESSION: RefCell<Session> =
        RefCell::new(Session::with_registered_tests(Printer::stdout()));
}

/// Runs `f` against this thread's session, creating it (with every
/// [`yatf_test!`](crate::yatf_test) declaration registered) on first use.
///
/// The session is per thread, not per process. Execution is single-threaded,
/// so a runner that stays on its main thread sees exactly one session. Code
/// running on another thread gets a second session of its own, with the same
/// registered tests and fresh counters.
///
/// # Panics
///
/// Panics when called again from inside `f`, e.g. from a running test body.
pub fn with<T>(f: impl FnOnce(&mut Session) -> T) -> T {
    SESSION.with(|session| {
        let mut session = session
            .try_borrow_mut()
            .expect("the test session is already in use on this thread");
        f(&mut session)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::SharedOutput;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::cell::Cell;

    fn session() -> (Session, SharedOutput) {
        let output = SharedOutput::new();
        (Session::new(Printer::capture(&output)), output)
    }

    fn round_trip_body() {
        crate::require_eq!(1, 1);
        crate::require!(false);
        crate::require_false!(true);
    }

    #[test]
    fn single_test_returns_its_failed_assertions() {
        let (mut session, _) = session();
        session.register(TestCase::new("suite", "case_a", round_trip_body));

        assert_eq!(session.run(Config::plain(), Some("suite.case_a")), 2);
        assert_eq!(
            session.stats("suite", "case_a"),
            Some(TestStats { assertions: 3, failed: 2 })
        );
    }

    #[test]
    fn unknown_name_runs_nothing() {
        let (mut session, output) = session();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        session.register(TestCase::new("suite", "case_a", move || flag.set(true)));

        assert_eq!(session.run(Config::plain(), Some("suite.nonexistent")), -1);
        assert!(!ran.get());
        let text = output.contents();
        assert_eq!(text.matches("bad test name").count(), 1);
        assert!(text.starts_with("[  FAIL  ] error because of bad test name: "));
    }

    #[test]
    fn malformed_name_is_rejected() {
        let (mut session, output) = session();
        session.register(TestCase::new("suite", "case_a", || {}));

        assert_eq!(
            session.find("suite_case_a"),
            Err(YatfError::MalformedTestName {
                name: "suite_case_a".into()
            })
        );
        assert_eq!(session.run(Config::plain(), Some("suite_case_a")), -1);
        assert!(output.contents().contains("help: separate the suite"));
    }

    #[test]
    fn lookup_is_exact_and_splits_at_first_dot() {
        let (mut session, _) = session();
        session.register(TestCase::new("a", "b.c", || {}));
        session.register(TestCase::new("Suite", "case", || {}));

        assert!(session.find("a.b.c").is_ok());
        assert!(session.find("a.b").is_err());
        assert!(session.find("suite.case").is_err());
        assert!(session.find("Suite.case").is_ok());
    }

    #[test]
    fn runs_in_registration_order() {
        let (mut session, _) = session();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            session.register(TestCase::new("order", name, move || order.borrow_mut().push(name)));
        }

        assert_eq!(session.run(Config::plain(), None), 0);
        assert_eq!(*order.borrow(), ["first", "second", "third"]);
    }

    #[test]
    fn full_run_output() {
        let (mut session, output) = session();
        session.register(TestCase::new("suite", "ok", || crate::require!(true)));
        session.register(TestCase::new("suite", "broken", || crate::require!(1 > 2)));

        assert_eq!(session.run(Config::plain(), None), 1);
        let lines: Vec<String> = output.contents().lines().map(str::to_owned).collect();
        assert_eq!(lines[0], "[========] Running 2 test cases");
        assert_eq!(lines[1], "[  RUN   ] suite.ok");
        assert_eq!(lines[2], "[  PASS  ] suite.ok (1 assertions)");
        assert_eq!(lines[3], "[  RUN   ] suite.broken");
        assert!(lines[4].starts_with("assertion failed: src/session.rs:"));
        assert!(lines[4].ends_with("'1 > 2' is false"));
        assert_eq!(lines[5], "[  FAIL  ] suite.broken (1 assertions)");
        assert_eq!(lines[6], "[========] Passed 1 test cases");
        assert_eq!(lines[7], "[========] Failed 1 test cases");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn fails_only_hides_passing_tests() {
        let (mut session, output) = session();
        session.register(TestCase::new("suite", "ok", || crate::require!(true)));
        session.register(TestCase::new("suite", "broken", || crate::require!(false)));

        session.run(Config::new(false, false, true), None);
        let text = output.contents();
        assert!(!text.contains("suite.ok"));
        assert!(!text.contains("RUN"));
        assert!(!text.contains("Passed"));
        assert!(text.contains("[  FAIL  ] suite.broken (1 assertions)\n"));
        assert!(text.ends_with("[========] Failed 1 test cases\n"));
    }

    #[test]
    fn oneliners_overwrite_run_line() {
        let (mut session, output) = session();
        session.register(TestCase::new("suite", "ok", || {}));

        assert_eq!(session.config(), Config::default());
        session.run(Config::new(false, true, false), Some("suite.ok"));
        assert_eq!(session.config(), Config::new(false, true, false));
        assert_eq!(
            output.contents(),
            "[  RUN   ] suite.ok\n\x1b[1A[  PASS  ] suite.ok (0 assertions)\n"
        );
    }

    #[test]
    fn colored_tags() {
        let (mut session, output) = session();
        session.register(TestCase::new("suite", "broken", || crate::require!(false)));

        session.run(Config::default(), None);
        let text = output.contents();
        assert!(text.starts_with("\x1b[32m[========]\x1b[0m Running 1 test cases\n"));
        assert!(text.contains("\x1b[31m[  FAIL  ]\x1b[0m suite.broken"));
        assert!(text.ends_with("\x1b[31m[========]\x1b[0m Failed 1 test cases\n"));
    }

    #[test]
    fn counters_reset_between_runs() {
        let (mut session, _) = session();
        session.register(TestCase::new("suite", "case_a", round_trip_body));

        for _ in 0..3 {
            assert_eq!(session.run(Config::plain(), None), 1);
            assert_eq!(
                session.stats("suite", "case_a"),
                Some(TestStats { assertions: 3, failed: 2 })
            );
        }
    }

    #[test]
    fn fixture_lives_for_the_body() {
        #[derive(Default)]
        struct Counter {
            hits: u32,
        }

        let mut seen = 0;
        with_fixture::<Counter, _>(|counter| {
            counter.hits += 2;
            seen = counter.hits;
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn random_registrations_are_tallied() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5eed);
        let (mut session, _) = session();
        let mut expected_failures = 0;

        for i in 0..256 {
            let pass = rng.gen_bool(0.5);
            let checks = rng.gen_range(1..4);
            if !pass {
                expected_failures += 1;
            }
            session.register(TestCase::new("random", format!("case_{i}"), move || {
                for _ in 0..checks {
                    crate::require!(true);
                }
                crate::require!(pass);
            }));

            assert_eq!(session.len(), i + 1);
            assert_eq!(session.run(Config::plain(), None), expected_failures);
            let stats = session.stats("random", &format!("case_{i}")).unwrap_or_default();
            assert_eq!(stats.assertions, checks + 1);
            assert!(stats.failed <= stats.assertions);
        }
    }

    #[test]
    fn global_session_is_reachable() {
        let registered = with(|session| session.len());
        assert_eq!(registered, registered_tests().len());
    }
}
