//! Call expectations for mocked collaborators.
//!
//! A [`Mock`] stands in for one callable. Test code registers expectations on
//! it, each one a scoped [`Expectation`] guard that can restrict the calls it
//! accepts, stub a return value and state how many calls it expects. When the
//! guard goes out of scope it checks the call count and reports a mismatch as
//! a failed assertion of the running test.
//!
//! Calls are dispatched to the first matching expectation in registration
//! order. A call that matches none goes to the mock's default handler, which
//! returns its stub (or `R::default()`) without failing anything.
//!
//! ```
//! use yatf::mock::Mock;
//! use yatf::matcher::ANY;
//! use yatf::assert::Recording;
//! use yatf::cli::output::Printer;
//!
//! let recording = Recording::start(Printer::null().shared());
//! let area: Mock<(i32, i32), i32> = Mock::new("area");
//! {
//!     let _square = yatf::require_call!(area).for_arguments((ANY, 4)).will_return(16).times(2);
//!     assert_eq!(area.call((2, 4)), 16);
//!     assert_eq!(area.call((3, 4)), 16);
//!     assert_eq!(area.call((2, 5)), 0);
//! }
//! assert_eq!(recording.finish().failed, 0);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::arena::{Arena, ArenaIndex};
use crate::assert::{self, Location};
use crate::list::{IntrusiveList, Link};
use crate::matcher::{Arguments, IntoMatchers};

// ============================================================================
// HANDLERS
// ============================================================================

enum CallMatcher<Args: Arguments> {
    Always,
    Predicate(Box<dyn Fn(&Args) -> bool>),
    Arguments(Args::Matchers),
}

impl<Args: Arguments> CallMatcher<Args> {
    fn matches(&self, args: &Args) -> bool {
        match self {
            CallMatcher::Always => true,
            CallMatcher::Predicate(pred) => pred(args),
            CallMatcher::Arguments(matchers) => Args::compare(matchers, args),
        }
    }
}

struct Handler<Args: Arguments, R> {
    matcher: CallMatcher<Args>,
    stub: Option<R>,
    expected_calls: usize,
    actual_calls: usize,
    link: Link,
}

impl<Args: Arguments, R> Handler<Args, R> {
    fn new() -> Self {
        Self {
            matcher: CallMatcher::Always,
            stub: None,
            expected_calls: 1,
            actual_calls: 0,
            link: Link::new(),
        }
    }
}

struct MockState<Args: Arguments, R> {
    fallback: Handler<Args, R>,
    handlers: Arena<Handler<Args, R>>,
    order: IntrusiveList<Handler<Args, R>>,
}

// ============================================================================
// MOCK
// ============================================================================

/// A mocked callable taking `Args` (a tuple) and returning `R`.
pub struct Mock<Args: Arguments, R = ()> {
    name: &'static str,
    state: RefCell<MockState<Args, R>>,
}

impl<Args: Arguments, R> Mock<Args, R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RefCell::new(MockState {
                fallback: Handler::new(),
                handlers: Arena::new(),
                order: IntrusiveList::new(crate::link_field!(Handler<Args, R>, link)),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a new expectation, attributed to the caller's location.
    #[track_caller]
    pub fn expect(&self) -> Expectation<'_, Args, R> {
        self.expect_at(Location::caller())
    }

    /// Registers a new expectation reported against `location`.
    pub fn expect_at(&self, location: Location) -> Expectation<'_, Args, R> {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let index = state.handlers.insert(Handler::new());
        state.order.push_back(&mut state.handlers, index);
        log::trace!("{}: expectation registered at {location}", self.name);
        Expectation {
            mock: self,
            index,
            verify: Verify::Report(location),
        }
    }

    /// Stub returned by calls that match no expectation.
    pub fn will_return_by_default(&self, value: R) {
        self.state.borrow_mut().fallback.stub = Some(value);
    }

    /// Number of calls that fell through to the default handler.
    pub fn unmatched_calls(&self) -> usize {
        self.state.borrow().fallback.actual_calls
    }

    /// Number of live expectations.
    pub fn pending(&self) -> usize {
        self.state.borrow().order.len()
    }

    /// Invokes the mock.
    ///
    /// # Panics
    ///
    /// Matchers run while the mock is borrowed. A matcher that calls back
    /// into the same mock, or registers a new expectation on it, panics with
    /// a `RefCell` borrow error.
    pub fn call(&self, args: Args) -> R
    where
        R: Clone + Default,
    {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let hit = state
            .order
            .entries(&state.handlers)
            .find(|(_, handler)| handler.matcher.matches(&args))
            .map(|(index, _)| index);

        let handler = match hit.and_then(|index| state.handlers.get_mut(index)) {
            Some(handler) => handler,
            None => {
                log::trace!("{}: call matched no expectation", self.name);
                &mut state.fallback
            }
        };
        handler.actual_calls += 1;
        handler.stub.clone().unwrap_or_default()
    }

    fn update(&self, index: ArenaIndex, edit: impl FnOnce(&mut Handler<Args, R>)) {
        if let Some(handler) = self.state.borrow_mut().handlers.get_mut(index) {
            edit(handler);
        }
    }
}

impl<Args: Arguments, R> fmt::Debug for Mock<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .field("unmatched_calls", &self.unmatched_calls())
            .finish()
    }
}

/// Declares a local mock named after the binding.
///
/// `mock!(fetch: fn(u32, char) -> i32)` is
/// `let fetch = Mock::<(u32, char), i32>::new("fetch");`.
#[macro_export]
macro_rules! mock {
    ($name:ident : fn($($arg:ty),* $(,)?) -> $ret:ty) => {
        let $name = $crate::mock::Mock::<($($arg,)*), $ret>::new(stringify!($name));
    };
    ($name:ident : fn($($arg:ty),* $(,)?)) => {
        let $name = $crate::mock::Mock::<($($arg,)*), ()>::new(stringify!($name));
    };
}

/// `require_call!(mock)` registers an expectation on `mock` at the call site.
#[macro_export]
macro_rules! require_call {
    ($mock:expr) => {
        $mock.expect_at($crate::location!())
    };
}

// ============================================================================
// EXPECTATION GUARD
// ============================================================================

enum Verify {
    Report(Location),
    Custom(Box<dyn FnOnce(usize, usize)>),
    Done,
}

/// One registered behaviour of a [`Mock`].
///
/// Fresh expectations accept any call, expect exactly one and return
/// `R::default()`. Dropping the guard checks the call count and unlinks the
/// expectation from its mock. A guard dropped while its mock is busy
/// dispatching (from inside a matcher) cannot read its counts; it records a
/// failed check instead and stays linked.
#[must_use = "an expectation is verified and removed when dropped; bind it to a named variable"]
pub struct Expectation<'m, Args: Arguments, R = ()> {
    mock: &'m Mock<Args, R>,
    index: ArenaIndex,
    verify: Verify,
}

impl<'m, Args: Arguments, R> Expectation<'m, Args, R> {
    /// Expects exactly `n` calls.
    pub fn times(self, n: usize) -> Self {
        self.mock.update(self.index, |handler| handler.expected_calls = n);
        self
    }

    /// Returns `value` from every matching call.
    pub fn will_return(self, value: R) -> Self {
        self.mock.update(self.index, |handler| handler.stub = Some(value));
        self
    }

    /// Accepts only calls for which `pred` holds. Replaces any argument
    /// matchers set with [`for_arguments`](Self::for_arguments).
    pub fn match_args<F>(self, pred: F) -> Self
    where
        F: Fn(&Args) -> bool + 'static,
    {
        let matcher = CallMatcher::Predicate(Box::new(pred));
        self.mock.update(self.index, |handler| handler.matcher = matcher);
        self
    }

    /// Accepts only calls matching one matcher per argument position.
    /// Replaces any predicate set with [`match_args`](Self::match_args).
    pub fn for_arguments<M>(self, matchers: M) -> Self
    where
        M: IntoMatchers<Args>,
    {
        let matcher = CallMatcher::Arguments(matchers.into_matchers());
        self.mock.update(self.index, |handler| handler.matcher = matcher);
        self
    }

    /// Hands `(expected, actual)` to `check` on drop instead of recording a
    /// call-count assertion.
    pub fn on_verify<F>(mut self, check: F) -> Self
    where
        F: FnOnce(usize, usize) + 'static,
    {
        self.verify = Verify::Custom(Box::new(check));
        self
    }

    /// Calls accepted so far.
    pub fn calls(&self) -> usize {
        self.mock
            .state
            .borrow()
            .handlers
            .get(self.index)
            .map_or(0, |handler| handler.actual_calls)
    }
}

impl<Args: Arguments, R> Drop for Expectation<'_, Args, R> {
    fn drop(&mut self) {
        let closed = match self.mock.state.try_borrow_mut() {
            Ok(mut state) => {
                let state = &mut *state;
                state.order.remove(&mut state.handlers, self.index)
            }
            Err(_) => {
                // The handler stays linked; only the failure can be recorded.
                log::error!("{}: expectation dropped while the mock is in use", self.mock.name);
                if let Verify::Report(at) = std::mem::replace(&mut self.verify, Verify::Done) {
                    assert::require_call_unverified(self.mock.name, at);
                }
                return;
            }
        };
        let Some(handler) = closed else {
            return;
        };

        match std::mem::replace(&mut self.verify, Verify::Done) {
            Verify::Report(at) => {
                assert::require_call(self.mock.name, handler.expected_calls, handler.actual_calls, at)
            }
            Verify::Custom(check) => check(handler.expected_calls, handler.actual_calls),
            Verify::Done => {}
        }
    }
}

impl<Args: Arguments, R> fmt::Debug for Expectation<'_, Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("mock", &self.mock.name)
            .field("index", &self.index)
            .field("calls", &self.calls())
            .finish()
    }
}
