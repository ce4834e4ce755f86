use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::{CallSeq, IntoMatchers, Invocation, MemberId, Substitute, SubstituteId};

type Filter = Rc<dyn Fn(&Invocation) -> bool>;

/// A composable query over recorded calls.
///
/// `CallQuery` works on a snapshot of the history taken when it was
/// created; calls dispatched afterwards are not seen. Filters combine with
/// logical AND, terminals inspect what passes.
///
/// # Example
///
/// ```rust
/// use stunt::{Capability, Matcher, Substitute, ValueKind, args};
///
/// let cap = Capability::builder("Calculator")
///     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///     .method("reset", [], ValueKind::Unit)
///     .build()
///     .unwrap();
/// let calc = Substitute::new(cap);
/// calc.call("add", args![1, 2]).unwrap();
/// calc.call("reset", vec![]).unwrap();
/// calc.call("add", args![3, 4]).unwrap();
///
/// let big = calc
///     .calls()
///     .to("add")
///     .with_args((Matcher::is::<i64, _>(|x| *x > 2),))
///     .count();
/// assert_eq!(big, 1);
/// ```
#[derive(Clone)]
pub struct CallQuery {
    calls: Rc<[Rc<Invocation>]>,
    filters: Vec<Filter>,
}

impl fmt::Debug for CallQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallQuery")
            .field("calls", &self.calls.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl CallQuery {
    pub(crate) fn new(calls: Vec<Rc<Invocation>>) -> Self {
        Self {
            calls: calls.into(),
            filters: Vec::new(),
        }
    }

    fn add_filter<F>(&mut self, filter: F)
    where
        F: Fn(&Invocation) -> bool + 'static,
    {
        self.filters.push(Rc::new(filter));
    }

    fn apply_filters(&self) -> impl Iterator<Item = &Rc<Invocation>> {
        self.calls.iter().filter(|c| {
            let call: &Invocation = c;
            self.filters.iter().all(|f| f(call))
        })
    }

    // ==================== Terminal Operations ====================

    /// Returns the number of calls matching all filters.
    pub fn count(&self) -> usize {
        self.apply_filters().count()
    }

    pub fn is_empty(&self) -> bool {
        self.apply_filters().next().is_none()
    }

    pub fn exists(&self) -> bool {
        !self.is_empty()
    }

    pub fn first(&self) -> Option<Rc<Invocation>> {
        self.apply_filters().next().cloned()
    }

    pub fn last(&self) -> Option<Rc<Invocation>> {
        self.apply_filters().last().cloned()
    }

    /// Returns the nth matching call (0-indexed), if any.
    pub fn nth(&self, index: usize) -> Option<Rc<Invocation>> {
        self.apply_filters().nth(index).cloned()
    }

    pub fn collect(&self) -> Vec<Rc<Invocation>> {
        self.apply_filters().cloned().collect()
    }

    /// Distinct members called, in order of first call.
    pub fn members(&self) -> Vec<MemberId> {
        let mut seen = HashSet::new();
        self.apply_filters()
            .filter(|c| seen.insert(c.member().clone()))
            .map(|c| c.member().clone())
            .collect()
    }

    /// Returns true if all matching calls satisfy the predicate.
    pub fn all(&self, predicate: impl Fn(&Invocation) -> bool) -> bool {
        self.apply_filters().all(|c| predicate(&**c))
    }

    pub fn any(&self, predicate: impl Fn(&Invocation) -> bool) -> bool {
        self.apply_filters().any(|c| predicate(&**c))
    }

    // ==================== Filter Operations ====================

    /// Filter to calls received by `substitute`.
    pub fn on(mut self, substitute: &Substitute) -> Self {
        let id: SubstituteId = substitute.id();
        self.add_filter(move |c| c.target() == id);
        self
    }

    /// Filter to calls of `member`.
    pub fn to(mut self, member: impl Into<MemberId>) -> Self {
        let member = member.into();
        self.add_filter(move |c| *c.member() == member);
        self
    }

    /// Filter to calls whose arguments satisfy `matchers`.
    ///
    /// Capturing and invoking matchers do not fire here.
    pub fn with_args(mut self, matchers: impl IntoMatchers) -> Self {
        let matchers = matchers.into_matchers();
        self.add_filter(move |c| matchers.matches(c.args()));
        self
    }

    /// Filter using a custom predicate on the call.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Invocation) -> bool + 'static,
    {
        self.add_filter(predicate);
        self
    }

    /// Filter to calls dispatched after `seq`.
    pub fn after(mut self, seq: impl Into<CallSeq>) -> Self {
        let seq = seq.into();
        self.add_filter(move |c| c.seq() > seq);
        self
    }

    /// Filter to calls dispatched before `seq`.
    pub fn before(mut self, seq: impl Into<CallSeq>) -> Self {
        let seq = seq.into();
        self.add_filter(move |c| c.seq() < seq);
        self
    }
}

/// Renders calls as a JSON array, oldest first.
#[cfg(feature = "serde")]
pub(crate) fn history_json(calls: &[Rc<Invocation>]) -> serde_json::Result<String> {
    use serde::Serialize;

    #[derive(Serialize)]
    struct CallExport<'a> {
        seq: CallSeq,
        target: SubstituteId,
        capability: &'a str,
        member: &'a str,
        kind: &'static str,
        args: Vec<String>,
        call: String,
    }

    let exports: Vec<CallExport<'_>> = calls
        .iter()
        .map(|c| CallExport {
            seq: c.seq(),
            target: c.target(),
            capability: c.capability(),
            member: c.member().name(),
            kind: c.member().kind().as_str(),
            args: c.args().iter().map(ToString::to_string).collect(),
            call: c.describe(),
        })
        .collect();
    serde_json::to_string_pretty(&exports)
}
