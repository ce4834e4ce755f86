use std::rc::Rc;

use crate::{Capability, Substitute};

/// A hand-written typed adapter over a [`Substitute`].
///
/// Implement it for a struct that wraps a substitute and forwards each
/// method of your trait through [`Substitute::dispatch`] (or the
/// [`call`](Substitute::call)/[`get`](Substitute::get)/[`set`](Substitute::set)
/// shorthands). Code under test receives the adapter through the trait; the
/// test configures and verifies the substitute behind it.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use stunt::{Capability, Double, Substitute, ValueKind, args};
///
/// trait Calculator {
///     fn add(&self, a: i64, b: i64) -> i64;
/// }
///
/// struct CalculatorDouble(Substitute);
///
/// impl Double for CalculatorDouble {
///     fn capability() -> Rc<Capability> {
///         Capability::builder("Calculator")
///             .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///             .build()
///             .expect("valid capability")
///     }
///
///     fn from_substitute(substitute: Substitute) -> Self {
///         Self(substitute)
///     }
///
///     fn substitute(&self) -> &Substitute {
///         &self.0
///     }
/// }
///
/// impl Calculator for CalculatorDouble {
///     fn add(&self, a: i64, b: i64) -> i64 {
///         self.0.call_as("add", args![a, b]).expect("add")
///     }
/// }
///
/// let calc: CalculatorDouble = stunt::substitute_for();
/// calc.substitute().when_called("add", (1, 2)).unwrap().then_return(3).unwrap();
/// assert_eq!(calc.add(1, 2), 3);
/// calc.substitute().received().call("add", (1, 2)).unwrap();
/// ```
pub trait Double: Sized {
    /// The capability every substitute behind this adapter implements.
    fn capability() -> Rc<Capability>;

    fn from_substitute(substitute: Substitute) -> Self;

    fn substitute(&self) -> &Substitute;
}

/// Create a fresh substitute and wrap it in the adapter `D`.
pub fn substitute_for<D: Double>() -> D {
    D::from_substitute(Substitute::new(D::capability()))
}
