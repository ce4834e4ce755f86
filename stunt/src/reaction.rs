use std::{cell::Cell, fmt, rc::Rc, sync::Arc};

use crate::{CallbackChain, Invocation, Result, Value};

pub(crate) type Compute = Rc<dyn Fn(&Invocation) -> Result<Value>>;
pub(crate) type Action = Rc<dyn Fn(&Invocation) -> Result>;

/// A failure a stub is configured to raise.
///
/// Dispatching a `Throw` reaction returns
/// [`Error::Configured`](crate::Error::Configured) carrying this failure to
/// the caller of the substituted member. Failures compare by identity, so a
/// test can assert that exactly the configured failure came back.
#[derive(Clone)]
pub struct Failure {
    message: Arc<str>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Failure {
    pub fn new(message: &str) -> Self {
        Self {
            message: Arc::from(message),
            source: None,
        }
    }

    /// Wrap an existing error; its message becomes the failure message.
    pub fn from_error(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: Arc::from(e.to_string()),
            source: Some(Arc::new(e)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.message, &other.message)
    }
}

impl Eq for Failure {}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::new(message)
    }
}

/// Values returned one per matching call.
///
/// The cursor advances on each call until it reaches the last entry, which
/// is then repeated forever. It never moves backward and never wraps.
/// Clones share the cursor.
#[derive(Clone)]
pub struct ValueSequence {
    values: Rc<[Value]>,
    cursor: Rc<Cell<usize>>,
}

impl ValueSequence {
    /// Returns `None` for an empty sequence.
    pub fn new(values: Vec<Value>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            values: values.into(),
            cursor: Rc::new(Cell::new(0)),
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of calls answered so far, capped at the sequence length.
    pub fn position(&self) -> usize {
        self.cursor.get()
    }

    pub(crate) fn next_value(&self) -> Value {
        let pos = self.cursor.get();
        let last = self.values.len() - 1;
        if pos <= last {
            self.cursor.set(pos + 1);
        }
        self.values[pos.min(last)].clone()
    }
}

impl fmt::Debug for ValueSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSequence")
            .field("values", &self.values)
            .field("position", &self.position())
            .finish()
    }
}

/// What a stub does when it is selected for a call.
///
/// A stub holds one or more reactions and runs them in attachment order.
/// The last value produced becomes the call's result; if no reaction
/// produces a value the member's declared default is returned. A `Throw`
/// stops the remaining reactions.
#[derive(Clone)]
pub enum Reaction {
    Value(Value),
    Sequence(ValueSequence),
    Computed(Compute),
    Effect(Action),
    Throw(Failure),
    Chain(CallbackChain),
}

impl Reaction {
    pub fn produces_value(&self) -> bool {
        matches!(
            self,
            Reaction::Value(_) | Reaction::Sequence(_) | Reaction::Computed(_)
        )
    }

    pub(crate) fn run(&self, call: &Invocation) -> Result<Option<Value>> {
        match self {
            Reaction::Value(v) => Ok(Some(v.clone())),
            Reaction::Sequence(seq) => Ok(Some(seq.next_value())),
            Reaction::Computed(f) => f(call).map(Some),
            Reaction::Effect(f) => f(call).map(|()| None),
            Reaction::Throw(failure) => Err(failure.clone().into()),
            Reaction::Chain(chain) => chain.run(call).map(|()| None),
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Reaction::Sequence(seq) => f.debug_tuple("Sequence").field(seq).finish(),
            Reaction::Computed(_) => f.write_str("Computed(..)"),
            Reaction::Effect(_) => f.write_str("Effect(..)"),
            Reaction::Throw(failure) => f.debug_tuple("Throw").field(failure).finish(),
            Reaction::Chain(chain) => f.debug_tuple("Chain").field(chain).finish(),
        }
    }
}
