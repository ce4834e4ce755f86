use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    CallOrder, CallQuery, Capability, Config, Double, Invocation, Substitute,
};

/// Fixture context for one test.
///
/// The harness creates substitutes with a shared [`Config`] and keeps track
/// of them, so their histories can be queried, ordered and cleared together.
/// Build a fresh one per test; nothing is shared between harnesses.
///
/// Recursive substitutes returned by unstubbed calls are not tracked.
///
/// # Example
///
/// ```rust
/// use stunt::{Capability, Harness, ValueKind, args};
///
/// let calculator = Capability::builder("Calculator")
///     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///     .build()
///     .unwrap();
/// let queue = Capability::builder("Queue")
///     .method("dequeue", [], ValueKind::Str)
///     .build()
///     .unwrap();
///
/// let test = Harness::new();
/// let calc = test.substitute_named(&calculator, "calc");
/// let q = test.substitute_named(&queue, "queue");
///
/// calc.call("add", args![1, 2]).unwrap();
/// q.call("dequeue", vec![]).unwrap();
///
/// assert_eq!(test.calls().count(), 2);
/// test.in_order()
///     .call(&calc, "add", ())
///     .call(&q, "dequeue", ())
///     .verify()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct Harness {
    config: Config,
    substitutes: RefCell<Vec<Substitute>>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("substitutes", &self.substitutes.borrow().len())
            .finish()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// A harness whose substitutes all use `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            substitutes: RefCell::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn substitute(&self, capability: &Rc<Capability>) -> Substitute {
        self.track(Substitute::build(
            capability.clone(),
            self.config.clone(),
            None,
        ))
    }

    pub fn substitute_named(&self, capability: &Rc<Capability>, label: &str) -> Substitute {
        self.track(Substitute::build(
            capability.clone(),
            self.config.clone(),
            Some(label.into()),
        ))
    }

    /// Create a substitute for `D`'s capability and wrap it in the adapter.
    pub fn double<D: Double>(&self) -> D {
        D::from_substitute(self.substitute(&D::capability()))
    }

    /// Substitutes created by this harness, in creation order.
    pub fn substitutes(&self) -> Vec<Substitute> {
        self.substitutes.borrow().clone()
    }

    /// Query the interleaved history of every tracked substitute.
    pub fn calls(&self) -> CallQuery {
        CallQuery::new(self.history())
    }

    /// Start an order expectation.
    pub fn in_order(&self) -> CallOrder {
        CallOrder::new()
    }

    /// Clear the recorded calls of every tracked substitute.
    pub fn clear_all(&self) {
        for sub in self.substitutes.borrow().iter() {
            sub.clear_received_calls();
        }
    }

    /// Render the interleaved history as a Mermaid sequence diagram.
    ///
    /// Semicolons end a Mermaid statement, so they are written as the
    /// entity `#59;` and render unchanged.
    ///
    /// # Example output
    ///
    /// ```text
    /// sequenceDiagram
    ///     participant s0 as calc
    ///     participant s1 as queue
    ///     test->>s0: add(1, 2)
    ///     test->>s1: dequeue()
    /// ```
    pub fn to_mermaid(&self) -> String {
        let subs = self.substitutes();
        let mut lines = vec!["sequenceDiagram".to_string()];
        for (i, sub) in subs.iter().enumerate() {
            lines.push(format!("    participant s{i} as {sub}"));
        }
        for call in self.history() {
            if let Some(i) = subs.iter().position(|s| s.id() == call.target()) {
                lines.push(format!("    test->>s{i}: {}", call.describe().replace(';', "#59;")));
            }
        }
        lines.join("\n")
    }

    /// Export the interleaved history as JSON.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> serde_json::Result<String> {
        crate::call_query::history_json(&self.history())
    }

    fn track(&self, substitute: Substitute) -> Substitute {
        self.substitutes.borrow_mut().push(substitute.clone());
        substitute
    }

    fn history(&self) -> Vec<Rc<Invocation>> {
        let mut calls: Vec<Rc<Invocation>> = self
            .substitutes
            .borrow()
            .iter()
            .flat_map(Substitute::received_calls)
            .collect();
        calls.sort_by_key(|c| c.seq());
        calls
    }
}
