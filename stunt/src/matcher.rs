//! Argument matching for stub selection and call verification.

use std::{any, cell::RefCell, fmt, ops, rc::Rc};

use crate::{Callback, Error, FromValue, Result, Substitute, Value};

type Predicate = Rc<dyn Fn(&Value) -> bool>;
type Recorder = Rc<dyn Fn(&Value)>;

#[derive(Clone)]
enum Kind {
    Any,
    Exact(Value),
    Predicate(Predicate),
    Invoking(Rc<[Value]>),
    Capturing(Recorder),
    And(Box<Matcher>, Box<Matcher>),
    Or(Box<Matcher>, Box<Matcher>),
    Not(Box<Matcher>),
}

/// A predicate over one argument.
///
/// Most matchers only decide whether an argument is accepted. Two variants
/// also carry a side effect that runs when the stub they belong to is
/// selected for a call:
///
/// - [`Matcher::invoking`] calls the callback passed as the argument.
/// - [`Matcher::capture`] hands the actual argument to a recorder.
///
/// Both accept every value. Verification queries only evaluate matchers and
/// never run their side effects.
///
/// # Example
///
/// ```rust
/// use stunt::{Matcher, Value};
///
/// let positive = Matcher::is(|n: &i64| *n > 0);
/// assert!(positive.matches(&Value::from(3)));
/// assert!(!positive.matches(&Value::from(-3)));
/// assert!(!positive.matches(&Value::from("3")));
///
/// let small_or_zero = Matcher::eq(0).or(Matcher::is(|n: &i64| *n < 10));
/// assert!(small_or_zero.matches(&Value::from(5)));
/// ```
#[derive(Clone)]
pub struct Matcher {
    kind: Kind,
    description: Option<Rc<str>>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Matcher").field(&self.description()).finish()
    }
}

impl Matcher {
    fn from_kind(kind: Kind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    /// Accepts every value.
    pub fn any() -> Self {
        Self::from_kind(Kind::Any)
    }

    /// Accepts values equal to `expected`.
    pub fn eq(expected: impl Into<Value>) -> Self {
        Self::from_kind(Kind::Exact(expected.into()))
    }

    /// Accepts values for which `predicate` returns true.
    pub fn predicate<F>(description: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self::from_kind(Kind::Predicate(Rc::new(predicate))).named(description)
    }

    /// Accepts values that convert to `T` and satisfy `predicate`.
    pub fn is<T, F>(predicate: F) -> Self
    where
        T: FromValue,
        F: Fn(&T) -> bool + 'static,
    {
        let description = format!("is::<{}>(..)", short_type_name::<T>());
        Self::predicate(&description, move |v| {
            T::from_value(v.clone()).is_ok_and(|typed| predicate(&typed))
        })
    }

    /// Accepts any value that converts to `T`.
    pub fn any_of<T: FromValue>() -> Self {
        let description = format!("any::<{}>", short_type_name::<T>());
        Self::predicate(&description, |v| T::from_value(v.clone()).is_ok())
    }

    /// Accepts any value. When the owning stub is selected, the argument
    /// (which must be a [`Callback`]) is called with `args`.
    pub fn invoking(args: Vec<Value>) -> Self {
        Self::from_kind(Kind::Invoking(args.into()))
    }

    /// Accepts any value. When the owning stub is selected, the argument is
    /// passed to `recorder`.
    pub fn capture<F>(recorder: F) -> Self
    where
        F: Fn(&Value) + 'static,
    {
        Self::from_kind(Kind::Capturing(Rc::new(recorder)))
    }

    /// Both matchers must accept.
    pub fn and(self, other: impl IntoMatcher) -> Self {
        Self::from_kind(Kind::And(Box::new(self), Box::new(other.into_matcher())))
    }

    /// Either matcher must accept.
    pub fn or(self, other: impl IntoMatcher) -> Self {
        Self::from_kind(Kind::Or(Box::new(self), Box::new(other.into_matcher())))
    }

    /// Replace the description used in failure reports.
    pub fn named(mut self, description: &str) -> Self {
        self.description = Some(Rc::from(description));
        self
    }

    pub fn matches(&self, value: &Value) -> bool {
        match &self.kind {
            Kind::Any | Kind::Invoking(_) | Kind::Capturing(_) => true,
            Kind::Exact(expected) => expected == value,
            Kind::Predicate(p) => p(value),
            Kind::And(a, b) => a.matches(value) && b.matches(value),
            Kind::Or(a, b) => a.matches(value) || b.matches(value),
            Kind::Not(m) => !m.matches(value),
        }
    }

    /// Returns true if [`fire`](Self::fire) can do anything.
    pub fn has_side_effects(&self) -> bool {
        match &self.kind {
            Kind::Invoking(_) | Kind::Capturing(_) => true,
            Kind::And(a, b) | Kind::Or(a, b) => a.has_side_effects() || b.has_side_effects(),
            Kind::Any | Kind::Exact(_) | Kind::Predicate(_) | Kind::Not(_) => false,
        }
    }

    /// Runs the side effects for the selected stub.
    ///
    /// For `or`, only the first accepting branch fires. Negated matchers
    /// never fire.
    pub(crate) fn fire(&self, value: &Value) -> Result {
        match &self.kind {
            Kind::Invoking(args) => match value {
                Value::Callback(cb) => cb.call(args).map(|_| ()),
                other => Err(Error::TypeMismatch {
                    expected: "callback",
                    found: other.type_name(),
                }),
            },
            Kind::Capturing(recorder) => {
                recorder(value);
                Ok(())
            }
            Kind::And(a, b) => {
                a.fire(value)?;
                b.fire(value)
            }
            Kind::Or(a, b) => {
                if a.matches(value) {
                    a.fire(value)
                } else {
                    b.fire(value)
                }
            }
            Kind::Any | Kind::Exact(_) | Kind::Predicate(_) | Kind::Not(_) => Ok(()),
        }
    }

    pub fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.to_string();
        }
        match &self.kind {
            Kind::Any => "_".into(),
            Kind::Exact(v) => v.to_string(),
            Kind::Predicate(_) => "<predicate>".into(),
            Kind::Invoking(args) => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                format!("invoke({})", args.join(", "))
            }
            Kind::Capturing(_) => "_ (captured)".into(),
            Kind::And(a, b) => format!("({} && {})", a.description(), b.description()),
            Kind::Or(a, b) => format!("({} || {})", a.description(), b.description()),
            Kind::Not(m) => format!("!{}", m.description()),
        }
    }
}

impl ops::Not for Matcher {
    type Output = Matcher;

    fn not(self) -> Matcher {
        Matcher::from_kind(Kind::Not(Box::new(self)))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

fn short_type_name<T>() -> &'static str {
    let full = any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Collects every argument a capturing matcher sees.
///
/// ```rust
/// use stunt::{Captor, Value};
///
/// let captor = Captor::new();
/// let matcher = captor.matcher();
/// assert!(matcher.matches(&Value::from(1)));
/// assert!(captor.is_empty()); // matching alone records nothing
/// ```
#[derive(Debug, Clone, Default)]
pub struct Captor {
    values: Rc<RefCell<Vec<Value>>>,
}

impl Captor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capturing matcher feeding this captor.
    pub fn matcher(&self) -> Matcher {
        let values = self.values.clone();
        Matcher::capture(move |v| values.borrow_mut().push(v.clone()))
    }

    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }

    pub fn last(&self) -> Option<Value> {
        self.values.borrow().last().cloned()
    }

    /// Returns the most recent captured value converted to `T`.
    pub fn last_as<T: FromValue>(&self) -> Option<Result<T>> {
        self.last().map(T::from_value)
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

/// Conversion into a [`Matcher`]. Plain values become exact matchers.
pub trait IntoMatcher {
    fn into_matcher(self) -> Matcher;
}

impl IntoMatcher for Matcher {
    fn into_matcher(self) -> Matcher {
        self
    }
}

impl IntoMatcher for &Captor {
    fn into_matcher(self) -> Matcher {
        self.matcher()
    }
}

macro_rules! exact_matcher {
    ($($t:ty),*) => {
        $(
            impl IntoMatcher for $t {
                fn into_matcher(self) -> Matcher {
                    Matcher::eq(self)
                }
            }
        )*
    };
}

exact_matcher!(
    Value, (), bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, &str, String, Callback,
    Substitute, &Substitute
);
