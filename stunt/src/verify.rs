use std::fmt;

use crate::{
    Error, IntoMatcher, IntoMatchers, Invocation, Matchers, MemberId, Result, Substitute,
};

/// How many matching calls a verification expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Times {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    /// Inclusive on both ends.
    Between(usize, usize),
}

impl Times {
    pub fn once() -> Self {
        Times::Exactly(1)
    }

    pub fn never() -> Self {
        Times::Exactly(0)
    }

    pub fn exactly(n: usize) -> Self {
        Times::Exactly(n)
    }

    pub fn at_least(n: usize) -> Self {
        Times::AtLeast(n)
    }

    pub fn at_most(n: usize) -> Self {
        Times::AtMost(n)
    }

    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
            Times::Between(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::AtLeast(1)
    }
}

fn calls(n: usize) -> &'static str {
    if n == 1 { "call" } else { "calls" }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Times::Exactly(0) => f.write_str("no calls"),
            Times::Exactly(n) => write!(f, "exactly {n} {}", calls(n)),
            Times::AtLeast(n) => write!(f, "at least {n} {}", calls(n)),
            Times::AtMost(n) => write!(f, "at most {n} {}", calls(n)),
            Times::Between(lo, hi) => write!(f, "between {lo} and {hi} calls"),
        }
    }
}

/// A verification that did not hold.
///
/// The message lists the calls that matched and the calls to the same
/// member that did not, the way they were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    substitute: String,
    expected: String,
    times: Times,
    matching: Vec<String>,
    non_matching: Vec<String>,
}

impl VerificationFailure {
    /// Rendering of the expected call, e.g. `add(1, _)`.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn times(&self) -> Times {
        self.times
    }

    /// Number of recorded calls that satisfied the matchers.
    pub fn actual(&self) -> usize {
        self.matching.len()
    }

    pub fn matching(&self) -> &[String] {
        &self.matching
    }

    pub fn non_matching(&self) -> &[String] {
        &self.non_matching
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Expected {} to receive {} matching:",
            self.substitute, self.times
        )?;
        write!(f, "\t{}", self.expected)?;
        let n = self.matching.len();
        match n {
            0 => write!(f, "\nActually received no matching calls.")?,
            _ => write!(f, "\nActually received {n} matching {}:", calls(n))?,
        }
        for call in &self.matching {
            write!(f, "\n\t{call}")?;
        }
        if !self.non_matching.is_empty() {
            let n = self.non_matching.len();
            write!(f, "\nReceived {n} non-matching {} to the same member:", calls(n))?;
            for call in &self.non_matching {
                write!(f, "\n\t{call}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}

/// Assertions about the calls one substitute received.
///
/// Created by [`Substitute::received`], [`Substitute::received_times`] and
/// [`Substitute::did_not_receive`]. Each method counts the recorded calls to
/// one member that satisfy the matchers and fails with
/// [`Error::Verification`] if the count is not accepted. Matcher side
/// effects never fire during verification.
///
/// ```rust
/// use stunt::{Capability, Matcher, Substitute, Times, ValueKind, args};
///
/// let cap = Capability::builder("Calculator")
///     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///     .build()
///     .unwrap();
/// let calc = Substitute::new(cap);
/// calc.call("add", args![1, 2]).unwrap();
///
/// calc.received().call("add", (1, 2)).unwrap();
/// calc.received_times(Times::once()).call("add", (Matcher::any(), 2)).unwrap();
/// calc.did_not_receive().call("add", (5, 7)).unwrap();
/// assert!(calc.received_times(Times::exactly(2)).call("add", ()).is_err());
/// ```
#[derive(Debug)]
pub struct Received<'a> {
    substitute: &'a Substitute,
    times: Times,
}

impl Received<'_> {
    /// Verify calls to `member` whose arguments satisfy `matchers`.
    pub fn call(&self, member: impl Into<MemberId>, matchers: impl IntoMatchers) -> Result {
        let member = member.into();
        let matchers = matchers.into_matchers();
        let arity = checked_arity(self.substitute, &member, &matchers)?;
        self.check(&member, &matchers, arity)
    }

    /// Verify calls to `member` regardless of arguments.
    pub fn with_any_args(&self, member: impl Into<MemberId>) -> Result {
        self.call(member, ())
    }

    /// Verify reads of `property`.
    pub fn get(&self, property: &str) -> Result {
        self.call(MemberId::get(property), ())
    }

    /// Verify assignments of `property` with a value accepted by `value`.
    pub fn set(&self, property: &str, value: impl IntoMatcher) -> Result {
        self.call(MemberId::set(property), (value,))
    }

    /// Verify that a handler was subscribed to `event`.
    pub fn subscribed(&self, event: &str) -> Result {
        self.call(MemberId::add(event), ())
    }

    /// Verify that a handler was unsubscribed from `event`.
    pub fn unsubscribed(&self, event: &str) -> Result {
        self.call(MemberId::remove(event), ())
    }

    fn check(&self, member: &MemberId, matchers: &Matchers, arity: usize) -> Result {
        let (matching, non_matching): (Vec<_>, Vec<_>) = self
            .substitute
            .received_calls()
            .into_iter()
            .filter(|c| c.member() == member)
            .partition(|c| matchers.matches(c.args()));

        if self.times.accepts(matching.len()) {
            return Ok(());
        }
        let failure = VerificationFailure {
            substitute: self.substitute.to_string(),
            expected: member.render(&matchers.describe(arity)),
            times: self.times,
            matching: matching.iter().map(|c| c.describe()).collect(),
            non_matching: non_matching.iter().map(|c| c.describe()).collect(),
        };
        tracing::debug!(substitute = %self.substitute, expected = %failure.expected, "verification failed");
        Err(Error::Verification(failure))
    }
}

impl Substitute {
    /// Expect at least one matching call.
    pub fn received(&self) -> Received<'_> {
        self.received_times(Times::default())
    }

    /// Expect a number of matching calls.
    pub fn received_times(&self, times: Times) -> Received<'_> {
        Received {
            substitute: self,
            times,
        }
    }

    /// Expect no matching call.
    pub fn did_not_receive(&self) -> Received<'_> {
        self.received_times(Times::never())
    }

    /// Count recorded calls to `member` whose arguments satisfy `matchers`.
    ///
    /// Fails like [`Received::call`] if `member` is not declared or more
    /// matchers than parameters are given.
    pub fn received_count(
        &self,
        member: impl Into<MemberId>,
        matchers: impl IntoMatchers,
    ) -> Result<usize> {
        let member = member.into();
        let matchers = matchers.into_matchers();
        checked_arity(self, &member, &matchers)?;
        Ok(self
            .received_calls()
            .iter()
            .filter(|c| c.member() == &member && matchers.matches(c.args()))
            .count())
    }
}

fn checked_arity(substitute: &Substitute, member: &MemberId, matchers: &Matchers) -> Result<usize> {
    let arity = substitute.capability().declared(member)?.arity();
    if matchers.len() > arity {
        return Err(Error::ArityMismatch {
            member: member.clone(),
            expected: arity,
            actual: matchers.len(),
        });
    }
    Ok(arity)
}

/// Renders a call for failure messages: `calc.add(1, 2)`.
pub(crate) fn render_on(substitute: &Substitute, call: &Invocation) -> String {
    format!("{substitute}.{}", call.describe())
}
