use std::fmt;

use crate::{IntoMatcher, Matcher, Result, Value};

/// Positional argument matchers for one member.
///
/// Matchers combine with logical AND across the argument list. Positions
/// without a matcher accept any value, so an empty list matches every call.
#[derive(Clone, Default)]
pub struct Matchers(Vec<Matcher>);

impl fmt::Debug for Matchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Matchers {
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self(matchers)
    }

    /// Accepts any arguments.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Matcher> {
        self.0.get(index)
    }

    pub fn matches(&self, args: &[Value]) -> bool {
        self.0.len() <= args.len()
            && args
                .iter()
                .enumerate()
                .all(|(i, arg)| self.0.get(i).is_none_or(|m| m.matches(arg)))
    }

    /// Runs capturing and invoking side effects, left to right.
    pub(crate) fn fire(&self, args: &[Value]) -> Result {
        for (matcher, arg) in self.0.iter().zip(args) {
            if matcher.has_side_effects() {
                matcher.fire(arg)?;
            }
        }
        Ok(())
    }

    /// Describes each of `arity` positions; unspecified positions read `_`.
    pub fn describe(&self, arity: usize) -> Vec<String> {
        (0..arity.max(self.0.len()))
            .map(|i| self.0.get(i).map_or_else(|| "_".to_string(), Matcher::description))
            .collect()
    }
}

/// Conversion into [`Matchers`].
///
/// Implemented for `()`, tuples of up to six [`IntoMatcher`] values, arrays
/// and `Vec<Matcher>`:
///
/// ```rust
/// use stunt::{IntoMatchers, Matcher, Value};
///
/// let m = (1, Matcher::any(), "x").into_matchers();
/// assert!(m.matches(&[Value::from(1), Value::from(true), Value::from("x")]));
/// assert!(!m.matches(&[Value::from(2), Value::from(true), Value::from("x")]));
/// ```
pub trait IntoMatchers {
    fn into_matchers(self) -> Matchers;
}

impl IntoMatchers for Matchers {
    fn into_matchers(self) -> Matchers {
        self
    }
}

impl IntoMatchers for () {
    fn into_matchers(self) -> Matchers {
        Matchers::any()
    }
}

impl IntoMatchers for Vec<Matcher> {
    fn into_matchers(self) -> Matchers {
        Matchers(self)
    }
}

impl<M: IntoMatcher, const N: usize> IntoMatchers for [M; N] {
    fn into_matchers(self) -> Matchers {
        Matchers(self.into_iter().map(IntoMatcher::into_matcher).collect())
    }
}

macro_rules! tuple_matchers {
    ($($name:ident),+) => {
        impl<$($name: IntoMatcher),+> IntoMatchers for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_matchers(self) -> Matchers {
                let ($($name,)+) = self;
                Matchers(vec![$($name.into_matcher()),+])
            }
        }
    };
}

tuple_matchers!(A);
tuple_matchers!(A, B);
tuple_matchers!(A, B, C);
tuple_matchers!(A, B, C, D);
tuple_matchers!(A, B, C, D, E);
tuple_matchers!(A, B, C, D, E, F);
