//! Capability descriptors: the declared surface a substitute implements.

use std::{fmt, mem, rc::Rc, sync::Arc};

use crate::{Callback, Error, MemberId, Result, Value};

/// Declared type of a parameter or return value.
#[derive(Clone)]
pub enum ValueKind {
    Unit,
    Bool,
    Int,
    Float,
    Str,
    List,
    Callback,
    /// Another capability. Unstubbed calls return a recursive substitute.
    Capability(Rc<Capability>),
    /// The declaring capability itself, for members like `clone() -> Self`.
    This,
    /// Accepts any value; defaults to unit.
    Any,
}

impl ValueKind {
    /// Returns true if `value` may be passed or returned where this kind is declared.
    ///
    /// `owner` resolves [`ValueKind::This`].
    pub fn admits(&self, value: &Value, owner: &Capability) -> bool {
        match (self, value) {
            (ValueKind::Any, _)
            | (ValueKind::Unit, Value::Unit)
            | (ValueKind::Bool, Value::Bool(_))
            | (ValueKind::Int, Value::Int(_))
            | (ValueKind::Float, Value::Float(_))
            | (ValueKind::Str, Value::Str(_))
            | (ValueKind::List, Value::List(_))
            | (ValueKind::Callback, Value::Callback(_)) => true,
            (ValueKind::Capability(cap), Value::Substitute(s)) => **s.capability() == **cap,
            (ValueKind::This, Value::Substitute(s)) => **s.capability() == *owner,
            _ => false,
        }
    }

    /// The value an unstubbed call returns, for kinds that are not capabilities.
    ///
    /// Capability kinds return `None`: the dispatcher answers those with a
    /// memoized recursive substitute instead.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            ValueKind::Unit | ValueKind::Any => Some(Value::Unit),
            ValueKind::Bool => Some(Value::Bool(false)),
            ValueKind::Int => Some(Value::Int(0)),
            ValueKind::Float => Some(Value::Float(0.0)),
            ValueKind::Str => Some(Value::from("")),
            ValueKind::List => Some(Value::List(Vec::new())),
            ValueKind::Callback => Some(Value::Callback(Callback::noop())),
            ValueKind::Capability(_) | ValueKind::This => None,
        }
    }

    /// Name of the value variant this kind admits, as [`Value::type_name`] spells it.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Unit => "unit",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Callback => "callback",
            ValueKind::Capability(_) | ValueKind::This => "substitute",
            ValueKind::Any => "any",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ValueKind::Unit => "unit".into(),
            ValueKind::Bool => "bool".into(),
            ValueKind::Int => "int".into(),
            ValueKind::Float => "float".into(),
            ValueKind::Str => "string".into(),
            ValueKind::List => "list".into(),
            ValueKind::Callback => "callback".into(),
            ValueKind::Capability(cap) => format!("capability {}", cap.name()),
            ValueKind::This => "Self".into(),
            ValueKind::Any => "any".into(),
        }
    }
}

impl PartialEq for ValueKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueKind::Capability(a), ValueKind::Capability(b)) => a == b,
            (ValueKind::Capability(_), _) | (_, ValueKind::Capability(_)) => false,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Signature of one declared member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSig {
    id: MemberId,
    params: Vec<ValueKind>,
    returns: ValueKind,
}

impl MemberSig {
    #[inline]
    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> &ValueKind {
        &self.returns
    }
}

/// Signature of a declared event: the arguments its handlers receive.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSig {
    name: Arc<str>,
    params: Vec<ValueKind>,
}

impl EventSig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }
}

/// The set of members a substitute exposes.
///
/// Immutable once built and shared by every substitute created from it.
/// Two capabilities are equal when they share the name and declare the same
/// members and events with the same signatures, in any order. Building the
/// same descriptor twice therefore yields equal capabilities, while a
/// same-named capability with different members is a different type.
///
/// ```rust
/// use stunt::{Capability, ValueKind};
///
/// let calculator = Capability::builder("Calculator")
///     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
///     .property("mode", ValueKind::Str)
///     .event("powered_up", [])
///     .build()
///     .unwrap();
///
/// assert_eq!(calculator.name(), "Calculator");
/// assert!(calculator.member(&"add".into()).is_some());
/// ```
#[derive(Debug)]
pub struct Capability {
    name: Arc<str>,
    members: Vec<MemberSig>,
    events: Vec<EventSig>,
}

impl Capability {
    pub fn builder(name: &str) -> CapabilityBuilder {
        CapabilityBuilder {
            name: Arc::from(name),
            members: Vec::new(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }

    pub fn member(&self, id: &MemberId) -> Option<&MemberSig> {
        self.members.iter().find(|m| m.id == *id)
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberSig> {
        self.members.iter()
    }

    pub fn event(&self, name: &str) -> Option<&EventSig> {
        self.events.iter().find(|e| &*e.name == name)
    }

    /// Looks up a member and checks the argument count.
    pub(crate) fn signature(&self, id: &MemberId, arity: usize) -> Result<&MemberSig> {
        let sig = self.member(id).ok_or_else(|| Error::UndeclaredMember {
            capability: self.name.clone(),
            member: id.clone(),
        })?;
        if sig.arity() != arity {
            return Err(Error::ArityMismatch {
                member: id.clone(),
                expected: sig.arity(),
                actual: arity,
            });
        }
        Ok(sig)
    }

    /// Looks up a member without checking arity.
    pub(crate) fn declared(&self, id: &MemberId) -> Result<&MemberSig> {
        self.member(id).ok_or_else(|| Error::UndeclaredMember {
            capability: self.name.clone(),
            member: id.clone(),
        })
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.name == other.name
            && self.members.len() == other.members.len()
            && self.events.len() == other.events.len()
            && self
                .members
                .iter()
                .all(|sig| other.member(&sig.id) == Some(sig))
            && self
                .events
                .iter()
                .all(|event| other.event(&event.name) == Some(event))
    }
}

impl Eq for Capability {}

/// Builder for [`Capability`].
#[derive(Debug)]
pub struct CapabilityBuilder {
    name: Arc<str>,
    members: Vec<MemberSig>,
    events: Vec<EventSig>,
}

impl CapabilityBuilder {
    fn push(mut self, id: MemberId, params: Vec<ValueKind>, returns: ValueKind) -> Self {
        self.members.push(MemberSig {
            id,
            params,
            returns,
        });
        self
    }

    /// Declare a method.
    pub fn method(
        self,
        name: &str,
        params: impl IntoIterator<Item = ValueKind>,
        returns: ValueKind,
    ) -> Self {
        let params = params.into_iter().collect();
        self.push(MemberId::method(name), params, returns)
    }

    /// Declare a read/write property: a getter and a setter.
    pub fn property(self, name: &str, kind: ValueKind) -> Self {
        self.push(MemberId::get(name), Vec::new(), kind.clone())
            .push(MemberId::set(name), vec![kind], ValueKind::Unit)
    }

    /// Declare a property with a getter only.
    pub fn readonly_property(self, name: &str, kind: ValueKind) -> Self {
        self.push(MemberId::get(name), Vec::new(), kind)
    }

    /// Declare an event whose handlers receive `params`.
    ///
    /// Adds the `+=` and `-=` accessors, each taking the handler callback.
    pub fn event(mut self, name: &str, params: impl IntoIterator<Item = ValueKind>) -> Self {
        self.events.push(EventSig {
            name: Arc::from(name),
            params: params.into_iter().collect(),
        });
        self.push(
            MemberId::add(name),
            vec![ValueKind::Callback],
            ValueKind::Unit,
        )
        .push(
            MemberId::remove(name),
            vec![ValueKind::Callback],
            ValueKind::Unit,
        )
    }

    /// Finish the descriptor.
    ///
    /// Fails with [`Error::DuplicateMember`] if a member id was declared twice.
    pub fn build(self) -> Result<Rc<Capability>> {
        for (i, sig) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|m| m.id == sig.id) {
                return Err(Error::DuplicateMember {
                    capability: self.name.clone(),
                    member: sig.id.clone(),
                });
            }
        }
        Ok(Rc::new(Capability {
            name: self.name,
            members: self.members,
            events: self.events,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Substitute;

    fn calculator() -> Rc<Capability> {
        Capability::builder("Calculator")
            .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
            .property("mode", ValueKind::Str)
            .event("powered_up", [])
            .build()
            .unwrap()
    }

    #[test]
    fn property_declares_getter_and_setter() {
        let cap = calculator();
        let get = cap.member(&MemberId::get("mode")).unwrap();
        let set = cap.member(&MemberId::set("mode")).unwrap();
        assert_eq!(get.arity(), 0);
        assert_eq!(set.arity(), 1);
        assert!(matches!(set.returns(), ValueKind::Unit));
    }

    #[test]
    fn event_declares_subscription_accessors() {
        let cap = calculator();
        assert!(cap.member(&MemberId::add("powered_up")).is_some());
        assert!(cap.member(&MemberId::remove("powered_up")).is_some());
        assert!(cap.event("powered_up").unwrap().params().is_empty());
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let err = Capability::builder("Broken")
            .method("run", [], ValueKind::Unit)
            .method("run", [ValueKind::Int], ValueKind::Unit)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateMember {
                capability: Arc::from("Broken"),
                member: MemberId::method("run"),
            }
        );
    }

    #[test]
    fn signature_checks_declaration_and_arity() {
        let cap = calculator();
        assert!(cap.signature(&"add".into(), 2).is_ok());
        assert!(matches!(
            cap.signature(&"add".into(), 1),
            Err(Error::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            cap.signature(&"divide".into(), 2),
            Err(Error::UndeclaredMember { .. })
        ));
    }

    #[test]
    fn kinds_admit_matching_values() {
        let cap = calculator();
        assert!(ValueKind::Int.admits(&Value::Int(1), &cap));
        assert!(!ValueKind::Int.admits(&Value::from("1"), &cap));
        assert!(ValueKind::Any.admits(&Value::from("1"), &cap));
        assert!(!ValueKind::This.admits(&Value::Int(1), &cap));
    }

    fn url(extra: Option<&str>) -> Rc<Capability> {
        let mut builder = Capability::builder("Url").method("clone", [], ValueKind::This);
        if let Some(name) = extra {
            builder = builder.method(name, [], ValueKind::Int);
        }
        builder.build().unwrap()
    }

    #[test]
    fn capabilities_compare_by_declared_members() {
        assert_eq!(*url(None), *url(None));
        assert_ne!(*url(None), *url(Some("port")));

        let other = Capability::builder("Url")
            .method("other", [], ValueKind::Int)
            .build()
            .unwrap();
        assert_ne!(*url(None), *other);
    }

    #[test]
    fn same_named_capability_with_other_members_is_not_admitted() {
        let cap = url(None);
        let lookalike = Capability::builder("Url")
            .method("other", [], ValueKind::Int)
            .build()
            .unwrap();
        let real = Value::from(Substitute::new(url(None)));
        let fake = Value::from(Substitute::new(lookalike));

        assert!(ValueKind::This.admits(&real, &cap));
        assert!(!ValueKind::This.admits(&fake, &cap));
        assert!(ValueKind::Capability(cap.clone()).admits(&real, &calculator()));
        assert!(!ValueKind::Capability(cap).admits(&fake, &calculator()));
    }

    #[test]
    fn then_return_rejects_a_lookalike_capability() {
        let sub = Substitute::new(url(None));
        let lookalike = Capability::builder("Url")
            .method("other", [], ValueKind::Int)
            .build()
            .unwrap();

        let err = sub
            .when_called("clone", ())
            .unwrap()
            .then_return(Substitute::new(lookalike))
            .unwrap_err();
        assert!(matches!(err, Error::ReturnKindMismatch { .. }));
        sub.when_called("clone", ())
            .unwrap()
            .then_return(Substitute::new(url(None)))
            .unwrap();
    }

    #[test]
    fn readonly_property_declares_getter_only() {
        let cap = Capability::builder("Sensor")
            .readonly_property("reading", ValueKind::Float)
            .build()
            .unwrap();
        assert!(cap.member(&MemberId::get("reading")).is_some());
        assert!(cap.member(&MemberId::set("reading")).is_none());

        let sensor = Substitute::new(cap);
        assert_eq!(sensor.get("reading").unwrap(), Value::Float(0.0));
        assert!(matches!(
            sensor.set("reading", 1.5),
            Err(Error::UndeclaredMember { .. })
        ));
    }

    #[test]
    fn defaults_are_zero_values() {
        assert_eq!(ValueKind::Int.default_value(), Some(Value::Int(0)));
        assert_eq!(ValueKind::Str.default_value(), Some(Value::from("")));
        assert_eq!(ValueKind::List.default_value(), Some(Value::List(vec![])));
        assert!(ValueKind::This.default_value().is_none());
    }
}
