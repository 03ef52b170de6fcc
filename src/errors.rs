//! Errors raised while resolving a test by name.
//!
//! These never escape [`Session::run`](crate::session::Session::run): the
//! session reports them through the output sink and returns `-1`. They are
//! public so that embedders using the lookup helpers directly can render them
//! with `miette`.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum YatfError {
    #[error("`{name}` is not of the form `suite.case`")]
    #[diagnostic(
        code(yatf::malformed_test_name),
        help("separate the suite and the case with a dot, e.g. `math.addition`")
    )]
    MalformedTestName { name: String },

    #[error("no test named `{suite}.{case}` is registered")]
    #[diagnostic(
        code(yatf::unknown_test_name),
        help("suite and case names are matched exactly and case-sensitively")
    )]
    UnknownTestName { suite: String, case: String },
}

pub type Result<T> = std::result::Result<T, YatfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_codes() {
        let err = YatfError::MalformedTestName {
            name: "nodot".into(),
        };
        assert_eq!(err.to_string(), "`nodot` is not of the form `suite.case`");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("yatf::malformed_test_name")
        );

        let err = YatfError::UnknownTestName {
            suite: "suite".into(),
            case: "missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "no test named `suite.missing` is registered"
        );
        assert!(err.help().is_some());
    }
}
