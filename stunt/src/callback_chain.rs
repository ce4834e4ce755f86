//! Ordered per-call actions: `first`, `then`..., a repeating tail and an
//! always-action.

use std::{cell::Cell, fmt, rc::Rc};

use crate::{Failure, Invocation, Result};

type StepFn = Rc<dyn Fn(&Invocation)>;

#[derive(Clone)]
enum Step {
    Do(StepFn),
    Throw(Failure),
}

impl Step {
    fn run(&self, call: &Invocation) -> Result {
        match self {
            Step::Do(f) => {
                f(call);
                Ok(())
            }
            Step::Throw(failure) => Err(failure.clone().into()),
        }
    }
}

/// A sequence of actions, one per dispatched call.
///
/// The cursor starts at the first step and advances by one per call. Once
/// the steps are used up, every further call runs the tail action (if any).
/// The always-action runs on every call after the step or tail action, even
/// when that action failed; the step's failure is then returned.
///
/// Clones share the cursor.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
/// use stunt::{Capability, CallbackChain, Substitute, ValueKind};
///
/// let cap = Capability::builder("Processor")
///     .method("process", [], ValueKind::Unit)
///     .build()
///     .unwrap();
/// let sub = Substitute::new(cap);
///
/// let log = Rc::new(RefCell::new(String::new()));
/// let (a, b, tail) = (log.clone(), log.clone(), log.clone());
/// sub.when("process", ())
///     .unwrap()
///     .do_chain(
///         CallbackChain::first(move |_| a.borrow_mut().push('A'))
///             .then(move |_| b.borrow_mut().push('B'))
///             .then_keep_doing(move |_| tail.borrow_mut().push('+')),
///     );
///
/// for _ in 0..4 {
///     sub.call("process", vec![]).unwrap();
/// }
/// assert_eq!(*log.borrow(), "AB++");
/// ```
#[derive(Clone, Default)]
pub struct CallbackChain {
    steps: Vec<Step>,
    tail: Option<Step>,
    always: Option<StepFn>,
    cursor: Rc<Cell<usize>>,
}

impl CallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a chain with its first step.
    pub fn first<F>(action: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        Self::new().then(action)
    }

    /// Append a step.
    pub fn then<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.steps.push(Step::Do(Rc::new(action)));
        self
    }

    /// Append a step that fails with `failure`.
    pub fn then_throw(mut self, failure: impl Into<Failure>) -> Self {
        self.steps.push(Step::Throw(failure.into()));
        self
    }

    /// Run `action` on every call after the steps are used up.
    pub fn then_keep_doing<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.tail = Some(Step::Do(Rc::new(action)));
        self
    }

    /// Fail with `failure` on every call after the steps are used up.
    pub fn then_keep_throwing(mut self, failure: impl Into<Failure>) -> Self {
        self.tail = Some(Step::Throw(failure.into()));
        self
    }

    /// Run `action` on every call, in addition to the step or tail action.
    pub fn and_always<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.always = Some(Rc::new(action));
        self
    }

    /// Number of steps taken so far, capped at the step count.
    pub fn position(&self) -> usize {
        self.cursor.get()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn run(&self, call: &Invocation) -> Result {
        let pos = self.cursor.get();
        let step = if pos < self.steps.len() {
            self.cursor.set(pos + 1);
            Some(&self.steps[pos])
        } else {
            self.tail.as_ref()
        };

        let stepped = step.map_or(Ok(()), |s| s.run(call));
        if let Some(always) = &self.always {
            always(call);
        }
        stepped
    }
}

impl fmt::Debug for CallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("steps", &self.steps.len())
            .field("tail", &self.tail.is_some())
            .field("always", &self.always.is_some())
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;

    use super::*;
    use crate::{Error, MemberId, SubstituteId, args};

    fn call() -> Invocation {
        Invocation::new(
            SubstituteId::new(),
            Arc::from("Processor"),
            MemberId::method("process"),
            args![],
        )
    }

    fn push(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl Fn(&Invocation) + 'static {
        let log = log.clone();
        move |_: &Invocation| log.borrow_mut().push(tag)
    }

    #[test]
    fn steps_then_tail() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = CallbackChain::first(push(&log, "A"))
            .then(push(&log, "B"))
            .then(push(&log, "C"))
            .then_keep_doing(push(&log, "+"));

        let c = call();
        for _ in 0..5 {
            chain.run(&c).unwrap();
        }
        assert_eq!(*log.borrow(), ["A", "B", "C", "+", "+"]);
        assert_eq!(chain.position(), 3);
    }

    #[test]
    fn without_tail_only_always_continues() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = CallbackChain::first(push(&log, "A")).and_always(push(&log, "*"));

        let c = call();
        for _ in 0..3 {
            chain.run(&c).unwrap();
        }
        assert_eq!(*log.borrow(), ["A", "*", "*", "*"]);
    }

    #[test]
    fn always_runs_even_when_step_throws() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let failure = Failure::new("second call fails");
        let chain = CallbackChain::first(push(&log, "A"))
            .then_throw(failure.clone())
            .and_always(push(&log, "*"));

        let c = call();
        assert!(chain.run(&c).is_ok());
        assert_eq!(chain.run(&c), Err(Error::Configured(failure)));
        assert_eq!(*log.borrow(), ["A", "*", "*"]);
    }

    #[test]
    fn keep_throwing_repeats_failure() {
        let failure = Failure::new("exhausted");
        let chain = CallbackChain::new().then_keep_throwing(failure.clone());
        let c = call();
        for _ in 0..3 {
            assert_eq!(chain.run(&c), Err(Error::Configured(failure.clone())));
        }
    }

    #[test]
    fn clones_share_the_cursor() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = CallbackChain::first(push(&log, "A")).then(push(&log, "B"));
        let other = chain.clone();

        let c = call();
        chain.run(&c).unwrap();
        other.run(&c).unwrap();
        assert_eq!(*log.borrow(), ["A", "B"]);
    }
}
