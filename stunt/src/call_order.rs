use std::fmt;
use std::rc::Rc;

use crate::{
    Error, IntoMatcher, IntoMatchers, Invocation, Matchers, MemberId, Result, Substitute,
    verify::render_on,
};

struct Step {
    substitute: Substitute,
    member: MemberId,
    matchers: Matchers,
}

impl Step {
    fn accepts(&self, call: &Invocation) -> bool {
        call.target() == self.substitute.id()
            && *call.member() == self.member
            && self.matchers.matches(call.args())
    }

    fn describe(&self) -> String {
        let arity = self
            .substitute
            .capability()
            .member(&self.member)
            .map_or(self.matchers.len(), |sig| sig.arity());
        format!(
            "{}.{}",
            self.substitute,
            self.member.render(&self.matchers.describe(arity))
        )
    }
}

/// Expected calls in order, possibly across several substitutes.
///
/// [`verify`](CallOrder::verify) succeeds if the steps match a subsequence
/// of the merged history in sequence-number order. Unrelated calls in
/// between are allowed.
///
/// ```rust
/// use stunt::{Callback, CallOrder, Capability, Matcher, Substitute, ValueKind};
///
/// let queue = Capability::builder("Queue")
///     .method("dequeue", [], ValueKind::Str)
///     .event("item_added", [])
///     .build()
///     .unwrap();
/// let q = Substitute::named(queue, "queue");
///
/// q.subscribe("item_added", Callback::noop()).unwrap();
/// q.call("dequeue", vec![]).unwrap();
/// q.subscribe("item_added", Callback::noop()).unwrap();
///
/// CallOrder::new()
///     .subscribed(&q, "item_added")
///     .call(&q, "dequeue", ())
///     .subscribed(&q, "item_added")
///     .verify()
///     .unwrap();
/// ```
#[derive(Default)]
#[must_use = "call verify() to check the order"]
pub struct CallOrder {
    steps: Vec<Step>,
}

impl fmt::Debug for CallOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(Step::describe))
            .finish()
    }
}

impl CallOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(
        mut self,
        substitute: &Substitute,
        member: impl Into<MemberId>,
        matchers: impl IntoMatchers,
    ) -> Self {
        self.steps.push(Step {
            substitute: substitute.clone(),
            member: member.into(),
            matchers: matchers.into_matchers(),
        });
        self
    }

    pub fn get(self, substitute: &Substitute, property: &str) -> Self {
        self.call(substitute, MemberId::get(property), ())
    }

    pub fn set(self, substitute: &Substitute, property: &str, value: impl IntoMatcher) -> Self {
        self.call(substitute, MemberId::set(property), (value,))
    }

    pub fn subscribed(self, substitute: &Substitute, event: &str) -> Self {
        self.call(substitute, MemberId::add(event), ())
    }

    pub fn unsubscribed(self, substitute: &Substitute, event: &str) -> Self {
        self.call(substitute, MemberId::remove(event), ())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check the steps against the recorded history.
    ///
    /// Fails with a configuration error if a step names an undeclared member
    /// or has more matchers than parameters, and with
    /// [`Error::Ordering`] if the calls did not happen in this order.
    pub fn verify(&self) -> Result {
        for step in &self.steps {
            let sig = step.substitute.capability().declared(&step.member)?;
            if step.matchers.len() > sig.arity() {
                return Err(Error::ArityMismatch {
                    member: step.member.clone(),
                    expected: sig.arity(),
                    actual: step.matchers.len(),
                });
            }
        }

        let history = self.history();
        let mut matched = 0;
        for call in &history {
            if matched >= self.steps.len() {
                break;
            }
            if self.steps[matched].accepts(call) {
                matched += 1;
            }
        }
        if matched == self.steps.len() {
            return Ok(());
        }

        let substitutes = self.substitutes();
        let actual = history
            .iter()
            .filter_map(|call| {
                substitutes
                    .iter()
                    .find(|s| s.id() == call.target())
                    .map(|s| render_on(s, call))
            })
            .collect();
        Err(Error::Ordering(OrderingFailure {
            expected: self.steps.iter().map(Step::describe).collect(),
            matched,
            actual,
        }))
    }

    fn substitutes(&self) -> Vec<Substitute> {
        let mut subs: Vec<Substitute> = Vec::new();
        for step in &self.steps {
            if !subs.iter().any(|s| s.ptr_eq(&step.substitute)) {
                subs.push(step.substitute.clone());
            }
        }
        subs
    }

    /// Calls of every involved substitute, in sequence-number order.
    fn history(&self) -> Vec<Rc<Invocation>> {
        let mut calls: Vec<Rc<Invocation>> = self
            .substitutes()
            .iter()
            .flat_map(Substitute::received_calls)
            .collect();
        calls.sort_by_key(|c| c.seq());
        calls
    }
}

/// Calls that did not happen in the expected order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingFailure {
    expected: Vec<String>,
    matched: usize,
    actual: Vec<String>,
}

impl OrderingFailure {
    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Number of leading steps that were found in order.
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn actual(&self) -> &[String] {
        &self.actual
    }
}

impl fmt::Display for OrderingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expected calls in order:")?;
        for (i, step) in self.expected.iter().enumerate() {
            let mark = if i == self.matched { "  <- not found" } else { "" };
            write!(f, "\n\t{step}{mark}")?;
        }
        f.write_str("\nActual calls:")?;
        if self.actual.is_empty() {
            f.write_str(" none")?;
        }
        for call in &self.actual {
            write!(f, "\n\t{call}")?;
        }
        Ok(())
    }
}

impl std::error::Error for OrderingFailure {}
