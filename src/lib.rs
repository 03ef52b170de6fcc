//! yatf: a small unit-testing and mocking library.
//!
//! Tests are declared with [`yatf_test!`], check their expectations with the
//! non-fatal [`require!`], [`require_false!`] and [`require_eq!`] macros, and
//! are run by [`cli::run`] (or by a [`session::Session`] directly). Mocked
//! collaborators are [`mock::Mock`] values; [`require_call!`] registers a
//! scoped call expectation on one.
//!
//! Registered tests and mock expectations are kept in an intrusive list
//! ([`list`]) over an arena ([`arena`]).

pub mod arena;
pub mod assert;
pub mod cli;
pub mod config;
pub mod errors;
pub mod list;
pub mod matcher;
pub mod mock;
pub mod session;

pub use crate::assert::{Location, Recording, TestStats};
pub use crate::config::Config;
pub use crate::errors::YatfError;
pub use crate::matcher::{any, Arg, ANY};
pub use crate::mock::{Expectation, Mock};
pub use crate::session::{Session, TestCase};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
