//! Argument matching engine.
//!
//! A mock expectation can restrict which calls it accepts by giving one
//! matcher per argument position. Each position is an [`Arg`]: an exact value,
//! a wildcard, a predicate, or an equality check on one field of the
//! argument. The per-position matchers form a tuple with the same arity as
//! the mocked call, and [`Arguments::compare`] checks them left to right,
//! stopping at the first position that does not match.
//!
//! ```
//! use yatf::matcher::{Arguments, IntoMatchers, ANY};
//!
//! let matchers = IntoMatchers::<(i32, i32)>::into_matchers((ANY, 4));
//! assert!(<(i32, i32)>::compare(&matchers, &(2, 4)));
//! assert!(!<(i32, i32)>::compare(&matchers, &(2, 5)));
//! ```

use std::fmt;

// ============================================================================
// PER-POSITION MATCHERS
// ============================================================================

/// Equality check on one projected field of an argument.
pub trait FieldCheck<T> {
    fn check(&self, actual: &T) -> bool;
}

struct FieldEq<T, U> {
    project: fn(&T) -> &U,
    expected: U,
}

impl<T, U: PartialEq> FieldCheck<T> for FieldEq<T, U> {
    fn check(&self, actual: &T) -> bool {
        (self.project)(actual) == &self.expected
    }
}

/// How a single argument position is matched.
pub enum Arg<T> {
    /// Matches values equal to the wrapped one.
    Exact(T),
    /// Matches anything of type `T`.
    Any,
    /// Matches when the predicate returns `true`.
    Predicate(Box<dyn Fn(&T) -> bool>),
    /// Matches when a projected field equals an expected value.
    Field(Box<dyn FieldCheck<T>>),
}

impl<T: PartialEq> Arg<T> {
    pub fn matches(&self, actual: &T) -> bool {
        match self {
            Arg::Exact(expected) => expected == actual,
            Arg::Any => true,
            Arg::Predicate(pred) => pred(actual),
            Arg::Field(check) => check.check(actual),
        }
    }
}

impl<T> Arg<T> {
    /// A per-position predicate.
    pub fn matching<F>(pred: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Arg::Predicate(Box::new(pred))
    }
}

impl<T: fmt::Debug> fmt::Debug for Arg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Arg::Any => f.write_str("Any"),
            Arg::Predicate(_) => f.write_str("Predicate(..)"),
            Arg::Field(_) => f.write_str("Field(..)"),
        }
    }
}

/// Wildcard marker accepted in any argument position.
#[derive(Debug, Clone, Copy)]
pub struct Wildcard;

/// Matches any value in its position.
pub const ANY: Wildcard = Wildcard;

/// Typed wildcard, for places where a plain [`ANY`] cannot be inferred.
pub fn any<T>() -> Arg<T> {
    Arg::Any
}

/// Conversion into a per-position matcher.
///
/// Plain values become [`Arg::Exact`], [`ANY`] becomes [`Arg::Any`], and an
/// [`Arg`] passes through unchanged.
pub trait IntoArg<T> {
    fn into_arg(self) -> Arg<T>;
}

impl<T: PartialEq> IntoArg<T> for T {
    fn into_arg(self) -> Arg<T> {
        Arg::Exact(self)
    }
}

impl<T> IntoArg<T> for Arg<T> {
    fn into_arg(self) -> Arg<T> {
        self
    }
}

impl<T> IntoArg<T> for Wildcard {
    fn into_arg(self) -> Arg<T> {
        Arg::Any
    }
}

// ============================================================================
// COMPARATORS
// ============================================================================

pub fn eq<T: PartialEq>(expected: T) -> Arg<T> {
    Arg::Exact(expected)
}

pub fn ne<T: PartialEq + 'static>(unexpected: T) -> Arg<T> {
    Arg::matching(move |actual| *actual != unexpected)
}

/// Matches actuals strictly below `bound`.
pub fn lt<T: PartialOrd + 'static>(bound: T) -> Arg<T> {
    Arg::matching(move |actual| *actual < bound)
}

pub fn le<T: PartialOrd + 'static>(bound: T) -> Arg<T> {
    Arg::matching(move |actual| *actual <= bound)
}

/// Matches actuals strictly above `bound`.
pub fn gt<T: PartialOrd + 'static>(bound: T) -> Arg<T> {
    Arg::matching(move |actual| *actual > bound)
}

pub fn ge<T: PartialOrd + 'static>(bound: T) -> Arg<T> {
    Arg::matching(move |actual| *actual >= bound)
}

/// Matches arguments whose projected field equals `expected`.
///
/// The projection is fixed when the matcher is built; other fields of the
/// argument are ignored. [`field!`](crate::field) builds the projection from a
/// member name.
pub fn field<T, U>(project: fn(&T) -> &U, expected: U) -> Arg<T>
where
    T: 'static,
    U: PartialEq + 'static,
{
    Arg::Field(Box::new(FieldEq { project, expected }))
}

/// `field!(Record, x, 439)` matches any `Record` whose `x == 439`.
#[macro_export]
macro_rules! field {
    ($owner:ty, $member:ident, $value:expr) => {
        $crate::matcher::field::<$owner, _>(|owner| &owner.$member, $value)
    };
}

// ============================================================================
// ARGUMENT TUPLES
// ============================================================================

/// An argument list of fixed arity that can be checked against a tuple of
/// per-position matchers.
pub trait Arguments {
    type Matchers;

    /// True iff every position matches. Evaluation runs left to right and
    /// stops at the first mismatch.
    fn compare(matchers: &Self::Matchers, actual: &Self) -> bool;
}

impl Arguments for () {
    type Matchers = ();

    fn compare(_matchers: &(), _actual: &()) -> bool {
        true
    }
}

/// Conversion of a tuple of [`IntoArg`] values into `Args::Matchers`.
pub trait IntoMatchers<Args: Arguments> {
    fn into_matchers(self) -> Args::Matchers;
}

macro_rules! tuple_arguments {
    ($(($T:ident, $M:ident, $idx:tt)),+) => {
        impl<$($T: PartialEq),+> Arguments for ($($T,)+) {
            type Matchers = ($(Arg<$T>,)+);

            fn compare(matchers: &Self::Matchers, actual: &Self) -> bool {
                $(matchers.$idx.matches(&actual.$idx))&&+
            }
        }

        impl<$($T: PartialEq,)+ $($M: IntoArg<$T>),+> IntoMatchers<($($T,)+)> for ($($M,)+) {
            fn into_matchers(self) -> ($(Arg<$T>,)+) {
                ($(self.$idx.into_arg(),)+)
            }
        }
    };
}

tuple_arguments!((A, MA, 0));
tuple_arguments!((A, MA, 0), (B, MB, 1));
tuple_arguments!((A, MA, 0), (B, MB, 1), (C, MC, 2));
tuple_arguments!((A, MA, 0), (B, MB, 1), (C, MC, 2), (D, MD, 3));
tuple_arguments!((A, MA, 0), (B, MB, 1), (C, MC, 2), (D, MD, 3), (E, ME, 4));
tuple_arguments!(
    (A, MA, 0),
    (B, MB, 1),
    (C, MC, 2),
    (D, MD, 3),
    (E, ME, 4),
    (F, MF, 5)
);
tuple_arguments!(
    (A, MA, 0),
    (B, MB, 1),
    (C, MC, 2),
    (D, MD, 3),
    (E, ME, 4),
    (F, MF, 5),
    (G, MG, 6)
);
tuple_arguments!(
    (A, MA, 0),
    (B, MB, 1),
    (C, MC, 2),
    (D, MD, 3),
    (E, ME, 4),
    (F, MF, 5),
    (G, MG, 6),
    (H, MH, 7)
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        x: i32,
        label: &'static str,
    }

    fn build<Args: Arguments, M: IntoMatchers<Args>>(m: M) -> Args::Matchers {
        m.into_matchers()
    }

    #[test]
    fn zero_arity_always_matches() {
        assert!(<()>::compare(&(), &()));
    }

    #[test]
    fn exact_values() {
        let m = build::<(i32, char), _>((9932, 'd'));
        assert!(<(i32, char)>::compare(&m, &(9932, 'd')));
        assert!(!<(i32, char)>::compare(&m, &(34, 'd')));
        assert!(!<(i32, char)>::compare(&m, &(9932, 'c')));
    }

    #[test]
    fn wildcard_position() {
        let m = build::<(i32, i32), _>((ANY, 4));
        assert!(<(i32, i32)>::compare(&m, &(2, 4)));
        assert!(<(i32, i32)>::compare(&m, &(3, 4)));
        assert!(!<(i32, i32)>::compare(&m, &(2, 5)));
    }

    #[test]
    fn strings_compare_by_content() {
        let m = build::<(String,), _>((String::from("abc"),));
        let owned = ["a", "bc"].concat();
        assert!(<(String,)>::compare(&m, &(owned,)));
    }

    #[test]
    fn comparison_stops_at_first_mismatch() {
        let evaluated = Rc::new(Cell::new(0));
        let seen = Rc::clone(&evaluated);
        let m = build::<(i32, i32), _>((
            1,
            Arg::matching(move |_: &i32| {
                seen.set(seen.get() + 1);
                true
            }),
        ));
        assert!(!<(i32, i32)>::compare(&m, &(2, 0)));
        assert_eq!(evaluated.get(), 0);
        assert!(<(i32, i32)>::compare(&m, &(1, 0)));
        assert_eq!(evaluated.get(), 1);
    }

    #[test]
    fn field_projection() {
        let m = build::<(Record,), _>((crate::field!(Record, x, 439),));
        let hit = Record { x: 439, label: "a" };
        let other_label = Record { x: 439, label: "b" };
        let miss = Record { x: 440, label: "a" };
        assert!(<(Record,)>::compare(&m, &(hit,)));
        assert!(!<(Record,)>::compare(&m, &(miss,)));
        assert!(<(Record,)>::compare(&m, &(other_label,)));
    }

    #[test]
    fn comparators() {
        assert!(ge(5).matches(&5));
        assert!(ge(5).matches(&6));
        assert!(!ge(5).matches(&4));
        assert!(gt(5).matches(&6));
        assert!(!gt(5).matches(&5));
        assert!(le(5).matches(&5));
        assert!(!le(5).matches(&6));
        assert!(lt(5).matches(&4));
        assert!(!lt(5).matches(&5));
        assert!(ne(5).matches(&4));
        assert!(!ne(5).matches(&5));
        assert!(eq(5).matches(&5));
    }

    #[test]
    fn mixed_matchers_in_wide_tuple() {
        let m = build::<(u8, i64, char, bool), _>((any(), gt(10_i64), 'x', ANY));
        assert!(<(u8, i64, char, bool)>::compare(&m, &(0, 11, 'x', false)));
        assert!(!<(u8, i64, char, bool)>::compare(&m, &(0, 10, 'x', true)));
    }

    #[test]
    fn debug_rendering() {
        assert_eq!(format!("{:?}", Arg::Exact(3)), "Exact(3)");
        assert_eq!(format!("{:?}", any::<i32>()), "Any");
        assert_eq!(format!("{:?}", ge(1)), "Predicate(..)");
    }
}
