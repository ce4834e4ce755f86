use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
    sync::Arc,
};

use crate::{
    CallQuery, CallRecorder, Capability, Config, Error, FromValue, IntoMatchers, Invocation,
    MemberId, MemberKind, MemberSig, Result, StubBuilder, SubstituteId, Value, ValueKind,
    WhenBuilder, event_bridge::Subscription, stub_rule::StubRule, stub_table::StubTable,
};

/// A runtime stand-in implementing a [`Capability`].
///
/// Every dispatched call is validated against the capability, recorded,
/// and answered by the most recently configured stub whose matchers accept
/// the arguments. Calls no stub answers return the declared default; members
/// returning another capability return a recursive substitute, the same one
/// for equal arguments.
///
/// `Substitute` is a cheap handle: clones share the same recorder and stubs.
/// It is single-threaded (`!Send`), like the rest of the crate.
///
/// Stubs, chains and event handlers are owned by the substitute. A closure
/// that captures a clone of its own substitute forms an `Rc` cycle and keeps
/// the substitute alive forever. Capture a [`WeakSubstitute`] from
/// [`downgrade`](Substitute::downgrade) instead when a stub needs to call
/// back into its substitute.
///
/// # Example
///
/// ```rust
/// use stunt::{Capability, Substitute, Value, ValueKind, args};
///
/// let cap = Capability::builder("Calculator")
///     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///     .build()
///     .unwrap();
/// let calc = Substitute::new(cap);
///
/// calc.when_called("add", (1, 2)).unwrap().then_return(3).unwrap();
///
/// assert_eq!(calc.call("add", args![1, 2]).unwrap(), Value::Int(3));
/// assert_eq!(calc.call("add", args![5, 5]).unwrap(), Value::Int(0));
/// assert_eq!(calc.received_calls().len(), 2);
/// ```
#[derive(Clone)]
pub struct Substitute {
    inner: Rc<Inner>,
}

struct Inner {
    id: SubstituteId,
    label: Option<Arc<str>>,
    capability: Rc<Capability>,
    config: Config,
    recorder: RefCell<CallRecorder>,
    stubs: RefCell<StubTable>,
    subscriptions: RefCell<Vec<Subscription>>,
    nested: RefCell<HashMap<(MemberId, Vec<Value>), Substitute>>,
}

impl Substitute {
    pub fn new(capability: Rc<Capability>) -> Self {
        Self::build(capability, Config::default(), None)
    }

    pub fn with_config(capability: Rc<Capability>, config: Config) -> Self {
        Self::build(capability, config, None)
    }

    /// A substitute that renders as `label` in messages and diagrams.
    pub fn named(capability: Rc<Capability>, label: &str) -> Self {
        Self::build(capability, Config::default(), Some(Arc::from(label)))
    }

    pub(crate) fn build(
        capability: Rc<Capability>,
        config: Config,
        label: Option<Arc<str>>,
    ) -> Self {
        let sub = Self {
            inner: Rc::new(Inner {
                id: SubstituteId::new(),
                label,
                capability,
                config,
                recorder: RefCell::new(CallRecorder::new()),
                stubs: RefCell::new(StubTable::default()),
                subscriptions: RefCell::new(Vec::new()),
                nested: RefCell::new(HashMap::new()),
            }),
        };
        tracing::debug!(substitute = %sub, id = %sub.id(), "substitute created");
        sub
    }

    #[inline]
    pub fn id(&self) -> SubstituteId {
        self.inner.id
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    #[inline]
    pub fn capability(&self) -> &Rc<Capability> {
        &self.inner.capability
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns true if both handles refer to the same substitute.
    pub fn ptr_eq(&self, other: &Substitute) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the substitute alive.
    ///
    /// ```rust
    /// use stunt::{Capability, Failure, Substitute, Value, ValueKind, args};
    ///
    /// let cap = Capability::builder("Counter")
    ///     .method("next", [ValueKind::Int], ValueKind::Int)
    ///     .build()
    ///     .unwrap();
    /// let counter = Substitute::new(cap);
    /// let weak = counter.downgrade();
    /// counter
    ///     .when_called("next", (0,))
    ///     .unwrap()
    ///     .then_compute(move |_| {
    ///         let counter = weak.upgrade().ok_or_else(|| Failure::new("counter dropped"))?;
    ///         counter.call("next", args![1])
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(counter.call("next", args![0]).unwrap(), Value::Int(0));
    /// assert_eq!(counter.received_calls().len(), 2);
    /// ```
    pub fn downgrade(&self) -> WeakSubstitute {
        WeakSubstitute {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ==================== Calling ====================

    /// Dispatch a call to `member` and return its result.
    ///
    /// This is what typed adapters forward to. The call is recorded before
    /// any stub runs, so it appears in the history even when the stub fails.
    pub fn dispatch(&self, member: &MemberId, args: Vec<Value>) -> Result<Value> {
        let sig = self.inner.capability.signature(member, args.len())?.clone();
        self.check_args(&sig, &args)?;

        let call = Rc::new(Invocation::new(
            self.id(),
            self.inner.capability.name_arc(),
            member.clone(),
            args,
        ));
        self.inner.recorder.borrow_mut().record(call.clone());
        tracing::trace!(substitute = %self, seq = %call.seq(), call = %call.describe(), "call recorded");

        let rules = self.inner.stubs.borrow().rules_for(member);
        let produced = match StubTable::resolve(&rules, call.args()) {
            Some(rule) => {
                rule.matchers().fire(call.args())?;
                let mut produced = None;
                for reaction in rule.reactions() {
                    if let Some(value) = reaction.run(&call)? {
                        produced = Some(value);
                    }
                }
                produced
            }
            None if self.inner.config.strict() && !matches!(sig.returns(), ValueKind::Unit) => {
                tracing::warn!(substitute = %self, call = %call.describe(), "no stub matches call");
                return Err(Error::Unconfigured(call.to_string()));
            }
            None => None,
        };

        let value = match produced {
            Some(value) if sig.returns().admits(&value, &self.inner.capability) => value,
            Some(value) => {
                return Err(Error::TypeMismatch {
                    expected: sig.returns().type_name(),
                    found: value.type_name(),
                });
            }
            None => self.default_for(&sig, &call),
        };

        if member.kind() == MemberKind::Set && self.inner.config.auto_property_values() {
            self.remember_property(member.name(), &call);
        }
        Ok(value)
    }

    /// Call a method by name.
    pub fn call(&self, method: impl Into<MemberId>, args: Vec<Value>) -> Result<Value> {
        self.dispatch(&method.into(), args)
    }

    /// Call a method and convert the result.
    pub fn call_as<T: FromValue>(&self, method: impl Into<MemberId>, args: Vec<Value>) -> Result<T> {
        self.call(method, args)?.into_typed()
    }

    /// Read a property.
    pub fn get(&self, property: &str) -> Result<Value> {
        self.dispatch(&MemberId::get(property), Vec::new())
    }

    pub fn get_as<T: FromValue>(&self, property: &str) -> Result<T> {
        self.get(property)?.into_typed()
    }

    /// Assign a property.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result {
        self.dispatch(&MemberId::set(property), vec![value.into()])
            .map(|_| ())
    }

    fn check_args(&self, sig: &MemberSig, args: &[Value]) -> Result {
        for (kind, arg) in sig.params().iter().zip(args) {
            if !kind.admits(arg, &self.inner.capability) {
                return Err(Error::TypeMismatch {
                    expected: kind.type_name(),
                    found: arg.type_name(),
                });
            }
        }
        Ok(())
    }

    fn default_for(&self, sig: &MemberSig, call: &Invocation) -> Value {
        let capability = match sig.returns() {
            ValueKind::Capability(cap) => cap.clone(),
            ValueKind::This => self.inner.capability.clone(),
            kind => return kind.default_value().unwrap_or_default(),
        };
        let key = (call.member().clone(), call.args().to_vec());
        let nested = self
            .inner
            .nested
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(substitute = %self, call = %call.describe(), "creating recursive substitute");
                Substitute::build(capability, self.inner.config.clone(), None)
            })
            .clone();
        Value::Substitute(nested)
    }

    fn remember_property(&self, name: &str, call: &Invocation) {
        let getter = MemberId::get(name);
        if self.inner.capability.member(&getter).is_none() {
            return;
        }
        let value = call.arg(0).cloned().unwrap_or_default();
        let rule = Rc::new(StubRule::auto_property(getter, value));
        self.inner.stubs.borrow_mut().register_auto(rule);
    }

    // ==================== Configuring ====================

    /// Start configuring the result of calls to `member` whose arguments
    /// satisfy `matchers`.
    ///
    /// Fails if the member is not declared or more matchers than parameters
    /// are given. Missing trailing matchers accept anything.
    pub fn when_called(
        &self,
        member: impl Into<MemberId>,
        matchers: impl IntoMatchers,
    ) -> Result<StubBuilder> {
        let member = member.into();
        let sig = self.inner.capability.declared(&member)?.clone();
        let matchers = matchers.into_matchers();
        if matchers.len() > sig.arity() {
            return Err(Error::ArityMismatch {
                member,
                expected: sig.arity(),
                actual: matchers.len(),
            });
        }
        Ok(StubBuilder::new(
            self.clone(),
            sig,
            StubRule::new(member, matchers),
        ))
    }

    /// Start configuring a property getter.
    pub fn when_get(&self, property: &str) -> Result<StubBuilder> {
        self.when_called(MemberId::get(property), ())
    }

    /// Start configuring side effects of a member that returns unit.
    pub fn when(
        &self,
        member: impl Into<MemberId>,
        matchers: impl IntoMatchers,
    ) -> Result<WhenBuilder> {
        let member = member.into();
        let sig = self.inner.capability.declared(&member)?;
        if !matches!(sig.returns(), ValueKind::Unit) {
            return Err(Error::UnsupportedReaction {
                member,
                reason: "when(..) configures members returning unit, use when_called(..)",
            });
        }
        self.when_called(member, matchers).map(WhenBuilder::new)
    }

    /// Number of registered stub rules, including disabled ones.
    pub fn stub_count(&self) -> usize {
        self.inner.stubs.borrow().len()
    }

    pub(crate) fn register(&self, rule: Rc<StubRule>) {
        tracing::debug!(substitute = %self, member = %rule.member(), matchers = ?rule.matchers(), "stub registered");
        self.inner.stubs.borrow_mut().register(rule);
    }

    // ==================== History ====================

    /// Snapshot of the recorded calls, oldest first.
    pub fn received_calls(&self) -> Vec<Rc<Invocation>> {
        self.inner.recorder.borrow().history().to_vec()
    }

    /// Forget recorded calls. Stubs and subscriptions stay in place.
    pub fn clear_received_calls(&self) {
        self.inner.recorder.borrow_mut().clear();
    }

    /// Query the recorded calls.
    pub fn calls(&self) -> CallQuery {
        CallQuery::new(self.received_calls())
    }

    pub(crate) fn subscriptions(&self) -> &RefCell<Vec<Subscription>> {
        &self.inner.subscriptions
    }

    /// Export the recorded calls as JSON.
    ///
    /// Each entry carries the sequence number, target id, capability,
    /// member name and kind, and the rendered arguments.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> serde_json::Result<String> {
        crate::call_query::history_json(&self.received_calls())
    }
}

impl fmt::Display for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.label {
            Some(label) => f.write_str(label),
            None => write!(
                f,
                "{}#{}",
                self.inner.capability.name(),
                self.inner.id.short()
            ),
        }
    }
}

impl fmt::Debug for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Substitute")
            .field("id", &self.inner.id)
            .field("capability", &self.inner.capability.name())
            .field("calls", &self.inner.recorder.borrow().len())
            .field("stubs", &self.inner.stubs.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`Substitute`], created by [`Substitute::downgrade`].
#[derive(Clone)]
pub struct WeakSubstitute {
    inner: Weak<Inner>,
}

impl WeakSubstitute {
    /// The substitute, if it is still alive.
    pub fn upgrade(&self) -> Option<Substitute> {
        self.inner.upgrade().map(|inner| Substitute { inner })
    }
}

impl fmt::Debug for WeakSubstitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSubstitute")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{Callback, Failure, Matcher, args};

    fn calculator() -> Rc<Capability> {
        Capability::builder("Calculator")
            .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
            .method("reset", [], ValueKind::Unit)
            .property("mode", ValueKind::Str)
            .build()
            .unwrap()
    }

    fn url() -> Rc<Capability> {
        Capability::builder("Url")
            .method("clone", [], ValueKind::This)
            .method("join", [ValueKind::Str], ValueKind::This)
            .method("path", [], ValueKind::Str)
            .build()
            .unwrap()
    }

    #[test]
    fn undeclared_member_fails_and_is_not_recorded() {
        let sub = Substitute::new(calculator());
        let err = sub.call("divide", args![1, 2]).unwrap_err();
        assert!(matches!(err, Error::UndeclaredMember { .. }));
        assert!(sub.received_calls().is_empty());
    }

    #[test]
    fn wrong_arity_fails() {
        let sub = Substitute::new(calculator());
        let err = sub.call("add", args![1]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn argument_kinds_are_checked() {
        let sub = Substitute::new(calculator());
        let err = sub.call("add", args![1, "two"]).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: "int",
                found: "string"
            }
        );
    }

    #[test]
    fn unstubbed_calls_return_defaults() {
        let sub = Substitute::new(calculator());
        assert_eq!(sub.call("add", args![1, 2]).unwrap(), Value::Int(0));
        assert_eq!(sub.call("reset", vec![]).unwrap(), Value::Unit);
        assert_eq!(sub.get("mode").unwrap(), Value::from(""));
    }

    #[test]
    fn computed_value_of_wrong_kind_fails() {
        let sub = Substitute::new(calculator());
        sub.when_called("add", ())
            .unwrap()
            .then_compute(|_| Ok(Value::from("oops")))
            .unwrap();
        let err = sub.call("add", args![1, 2]).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: "int",
                found: "string"
            }
        );
        assert_eq!(sub.received_calls().len(), 1);
    }

    #[test]
    fn effects_only_rule_returns_default() {
        let sub = Substitute::new(calculator());
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        sub.when_called("add", ())
            .unwrap()
            .then_do(move |_| counter.set(counter.get() + 1));
        assert_eq!(sub.call("add", args![1, 2]).unwrap(), Value::Int(0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn setter_feeds_getter_until_newer_stub() {
        let sub = Substitute::new(calculator());
        sub.when_get("mode").unwrap().then_return("DEC").unwrap();
        sub.set("mode", "HEX").unwrap();
        assert_eq!(sub.get("mode").unwrap(), Value::from("HEX"));

        sub.when_get("mode").unwrap().then_return("BIN").unwrap();
        assert_eq!(sub.get("mode").unwrap(), Value::from("BIN"));

        sub.set("mode", "OCT").unwrap();
        assert_eq!(sub.get_as::<String>("mode").unwrap(), "OCT");
    }

    #[test]
    fn auto_property_values_can_be_switched_off() {
        let sub = Substitute::with_config(
            calculator(),
            Config::default().with_auto_property_values(false),
        );
        sub.set("mode", "HEX").unwrap();
        assert_eq!(sub.get("mode").unwrap(), Value::from(""));
    }

    #[test]
    fn strict_mode_fails_unmatched_value_calls_only() {
        let sub = Substitute::with_config(calculator(), Config::default().with_strict(true));
        sub.when_called("add", (1, 2)).unwrap().then_return(3).unwrap();

        assert_eq!(sub.call("add", args![1, 2]).unwrap(), Value::Int(3));
        let err = sub.call("add", args![2, 2]).unwrap_err();
        assert!(matches!(err, Error::Unconfigured(_)));
        assert_eq!(sub.call("reset", vec![]).unwrap(), Value::Unit);
    }

    #[test]
    fn recursive_defaults_are_memoized_per_arguments() {
        let sub = Substitute::new(url());
        let a = sub.call_as::<Substitute>("clone", vec![]).unwrap();
        let b = sub.call_as::<Substitute>("clone", vec![]).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&sub));

        let x = sub.call_as::<Substitute>("join", args!["a"]).unwrap();
        let y = sub.call_as::<Substitute>("join", args!["b"]).unwrap();
        let x2 = sub.call_as::<Substitute>("join", args!["a"]).unwrap();
        assert!(x.ptr_eq(&x2));
        assert!(!x.ptr_eq(&y));
    }

    #[test]
    fn recursive_substitutes_can_be_configured() {
        let sub = Substitute::new(url());
        let clone = sub.call_as::<Substitute>("clone", vec![]).unwrap();
        clone.when_called("path", ()).unwrap().then_return("/a").unwrap();

        let again = sub.call_as::<Substitute>("clone", vec![]).unwrap();
        assert_eq!(again.call_as::<String>("path", vec![]).unwrap(), "/a");
    }

    #[test]
    fn stubs_may_reenter_the_substitute() {
        let sub = Substitute::new(calculator());
        let weak = sub.downgrade();
        sub.when_called("add", (Matcher::any(), 0))
            .unwrap()
            .then_compute(move |call| {
                let x = call.arg_as::<i64>(0)?;
                let sub = weak.upgrade().ok_or_else(|| Failure::new("dropped"))?;
                sub.call("add", args![x, 1])
            })
            .unwrap();
        sub.when_called("add", (Matcher::any(), 1))
            .unwrap()
            .then_compute(|call| Ok(Value::Int(call.arg_as::<i64>(0)? + 1)))
            .unwrap();

        assert_eq!(sub.call("add", args![41, 0]).unwrap(), Value::Int(42));
        assert_eq!(sub.received_calls().len(), 2);
    }

    #[test]
    fn weak_handles_do_not_keep_the_substitute_alive() {
        let state = Rc::new(());
        let sub = Substitute::new(calculator());
        let weak = sub.downgrade();
        let held = state.clone();
        let handle = weak.clone();
        sub.when_called("add", ())
            .unwrap()
            .then_compute(move |_| {
                let _held = &held;
                let sub = handle.upgrade().ok_or_else(|| Failure::new("dropped"))?;
                Ok(Value::from(sub.received_calls().len()))
            })
            .unwrap();

        assert_eq!(sub.call("add", args![1, 2]).unwrap(), Value::Int(1));
        assert_eq!(Rc::strong_count(&state), 2);

        drop(sub);
        assert!(weak.upgrade().is_none());
        assert_eq!(Rc::strong_count(&state), 1);
    }

    #[test]
    fn matcher_side_effects_fire_once_for_selected_rule() {
        let cap = Capability::builder("Runner")
            .method("run", [ValueKind::Callback], ValueKind::Unit)
            .build()
            .unwrap();
        let sub = Substitute::new(cap);
        sub.when("run", (Matcher::invoking(args![7]),))
            .unwrap()
            .do_action(|_| {});

        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        let callback = Callback::action(move |args| {
            sink.set(sink.get() + args[0].as_int().unwrap_or_default())
        });
        sub.call("run", vec![Value::Callback(callback)]).unwrap();
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn display_uses_label_or_short_id() {
        let named = Substitute::named(calculator(), "calc");
        assert_eq!(named.to_string(), "calc");

        let anon = Substitute::new(calculator());
        assert_eq!(anon.to_string(), format!("Calculator#{}", anon.id().short()));
    }
}
