//! Fluent configuration of stubs.
//!
//! [`Substitute::when_called`] starts a [`StubBuilder`] for a value-returning
//! member, [`Substitute::when`] starts a [`WhenBuilder`] for a unit member.
//! Both finish into a [`Stub`] handle that can attach more reactions or
//! switch the rule off.

use std::rc::Rc;

use crate::{
    CallbackChain, Error, Failure, Invocation, MemberId, MemberSig, Reaction, Result,
    Substitute, Value, ValueKind, ValueSequence, stub_rule::StubRule,
};

/// Builder returned by [`Substitute::when_called`].
///
/// Nothing is registered until a `then_*` method is called.
#[must_use = "a stub is only registered by a then_* method"]
pub struct StubBuilder {
    substitute: Substitute,
    sig: MemberSig,
    rule: StubRule,
}

impl StubBuilder {
    pub(crate) fn new(substitute: Substitute, sig: MemberSig, rule: StubRule) -> Self {
        Self {
            substitute,
            sig,
            rule,
        }
    }

    /// Drop the configured matchers: the stub answers every call to the member.
    pub fn for_any_args(self) -> Self {
        let member = self.rule.member().clone();
        Self {
            rule: StubRule::new(member, Default::default()),
            ..self
        }
    }

    /// Return `value` on every matching call.
    ///
    /// Fails with [`Error::ReturnKindMismatch`] if the member cannot return it.
    pub fn then_return(self, value: impl Into<Value>) -> Result<Stub> {
        let value = value.into();
        check_kind(&self.substitute, &self.sig, &value)?;
        Ok(self.install(Reaction::Value(value)))
    }

    /// Return each value in turn, then keep returning the last one.
    pub fn then_return_each<I, V>(self, values: I) -> Result<Stub>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        produces_value(&self.sig)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        for value in &values {
            check_kind(&self.substitute, &self.sig, value)?;
        }
        let sequence = ValueSequence::new(values).ok_or_else(|| Error::UnsupportedReaction {
            member: self.sig.id().clone(),
            reason: "a value sequence needs at least one value",
        })?;
        Ok(self.install(Reaction::Sequence(sequence)))
    }

    /// Compute the result from the call.
    ///
    /// The computed value is checked against the declared return kind when
    /// the call is dispatched.
    pub fn then_compute<F>(self, compute: F) -> Result<Stub>
    where
        F: Fn(&Invocation) -> Result<Value> + 'static,
    {
        produces_value(&self.sig)?;
        Ok(self.install(Reaction::Computed(Rc::new(compute))))
    }

    /// Fail every matching call with `failure`.
    pub fn then_throw(self, failure: impl Into<Failure>) -> Stub {
        self.install(Reaction::Throw(failure.into()))
    }

    /// Run `action` on every matching call; the call returns the default.
    pub fn then_do<F>(self, action: F) -> Stub
    where
        F: Fn(&Invocation) + 'static,
    {
        self.install(Reaction::Effect(Rc::new(move |call: &Invocation| -> Result {
            action(call);
            Ok(())
        })))
    }

    /// Run the next step of `chain` on every matching call.
    pub fn then_chain(self, chain: CallbackChain) -> Stub {
        self.install(Reaction::Chain(chain))
    }

    fn install(self, reaction: Reaction) -> Stub {
        self.rule.attach(reaction);
        let rule = Rc::new(self.rule);
        self.substitute.register(rule.clone());
        Stub {
            substitute: self.substitute,
            sig: self.sig,
            rule,
        }
    }
}

/// Builder returned by [`Substitute::when`] for members that return unit.
#[must_use = "a stub is only registered by do_action, do_chain or throw"]
pub struct WhenBuilder {
    inner: StubBuilder,
}

impl WhenBuilder {
    pub(crate) fn new(inner: StubBuilder) -> Self {
        Self { inner }
    }

    pub fn for_any_args(self) -> Self {
        Self {
            inner: self.inner.for_any_args(),
        }
    }

    pub fn do_action<F>(self, action: F) -> Stub
    where
        F: Fn(&Invocation) + 'static,
    {
        self.inner.then_do(action)
    }

    pub fn do_chain(self, chain: CallbackChain) -> Stub {
        self.inner.then_chain(chain)
    }

    pub fn throw(self, failure: impl Into<Failure>) -> Stub {
        self.inner.then_throw(failure)
    }
}

/// Handle to a registered stub.
///
/// Dropping the handle leaves the stub in place.
#[derive(Clone)]
pub struct Stub {
    substitute: Substitute,
    sig: MemberSig,
    rule: Rc<StubRule>,
}

impl Stub {
    pub fn member(&self) -> &MemberId {
        self.rule.member()
    }

    /// Attach a side effect that runs after the existing reactions.
    pub fn and_do<F>(self, action: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.rule
            .attach(Reaction::Effect(Rc::new(move |call: &Invocation| -> Result {
                action(call);
                Ok(())
            })));
        self
    }

    /// Attach a value; being attached last, it becomes the call's result.
    pub fn and_return(self, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        check_kind(&self.substitute, &self.sig, &value)?;
        self.rule.attach(Reaction::Value(value));
        Ok(self)
    }

    pub fn and_throw(self, failure: impl Into<Failure>) -> Self {
        self.rule.attach(Reaction::Throw(failure.into()));
        self
    }

    pub fn and_chain(self, chain: CallbackChain) -> Self {
        self.rule.attach(Reaction::Chain(chain));
        self
    }

    /// Stop the stub from matching. Older stubs for the member apply again.
    pub fn disable(&self) {
        tracing::debug!(substitute = %self.substitute, member = %self.rule.member(), "stub disabled");
        self.rule.set_enabled(false);
    }

    pub fn enable(&self) {
        self.rule.set_enabled(true);
    }

    pub fn is_enabled(&self) -> bool {
        self.rule.is_enabled()
    }
}

impl std::fmt::Debug for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stub")
            .field("substitute", &self.substitute.id())
            .field("rule", &self.rule)
            .finish()
    }
}

fn produces_value(sig: &MemberSig) -> Result {
    match sig.returns() {
        ValueKind::Unit => Err(Error::UnsupportedReaction {
            member: sig.id().clone(),
            reason: "the member returns unit",
        }),
        _ => Ok(()),
    }
}

fn check_kind(substitute: &Substitute, sig: &MemberSig, value: &Value) -> Result {
    produces_value(sig)?;
    if sig.returns().admits(value, substitute.capability()) {
        Ok(())
    } else {
        Err(Error::ReturnKindMismatch {
            member: sig.id().clone(),
            expected: sig.returns().describe(),
            found: value.type_name(),
        })
    }
}
