use std::{fmt, hash::Hash, sync::Arc};

/// What kind of entry point a [`MemberId`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    /// A plain method.
    Method,
    /// Property getter.
    Get,
    /// Property setter.
    Set,
    /// Adding a handler to an event.
    Add,
    /// Removing a handler from an event.
    Remove,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Method => "method",
            MemberKind::Get => "get",
            MemberKind::Set => "set",
            MemberKind::Add => "add",
            MemberKind::Remove => "remove",
        }
    }
}

/// Identity of a member declared by a [`Capability`](crate::Capability).
///
/// Methods, property accessors and event subscriptions share one namespace
/// of member ids, so the dispatcher, the stub table and the verifier treat
/// them uniformly. A property `mode` yields two ids (`get mode`, `set mode`)
/// and an event `completed` yields `completed +=` and `completed -=`.
///
/// ```rust
/// use stunt::{MemberId, MemberKind};
///
/// let add = MemberId::method("add");
/// assert_eq!(add.kind(), MemberKind::Method);
/// assert_eq!(MemberId::from("add"), add);
/// assert_ne!(MemberId::get("mode"), MemberId::set("mode"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId {
    name: Arc<str>,
    kind: MemberKind,
}

impl MemberId {
    pub fn new(name: &str, kind: MemberKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
        }
    }

    pub fn method(name: &str) -> Self {
        Self::new(name, MemberKind::Method)
    }

    pub fn get(property: &str) -> Self {
        Self::new(property, MemberKind::Get)
    }

    pub fn set(property: &str) -> Self {
        Self::new(property, MemberKind::Set)
    }

    pub fn add(event: &str) -> Self {
        Self::new(event, MemberKind::Add)
    }

    pub fn remove(event: &str) -> Self {
        Self::new(event, MemberKind::Remove)
    }

    /// The declared name, shared by both accessors of a property or event.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Returns true for event subscription accessors.
    pub fn is_event_accessor(&self) -> bool {
        matches!(self.kind, MemberKind::Add | MemberKind::Remove)
    }

    /// Renders a call of this member with already formatted arguments.
    ///
    /// Shared by recorded calls and by matcher descriptions so that failure
    /// reports line up.
    pub fn render(&self, args: &[String]) -> String {
        match self.kind {
            MemberKind::Method => format!("{}({})", self.name, args.join(", ")),
            MemberKind::Get => self.name.to_string(),
            MemberKind::Set => format!("{} = {}", self.name, args.join(", ")),
            MemberKind::Add => format!("{} += {}", self.name, args.join(", ")),
            MemberKind::Remove => format!("{} -= {}", self.name, args.join(", ")),
        }
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Method => write!(f, "{}", self.name),
            MemberKind::Get => write!(f, "get {}", self.name),
            MemberKind::Set => write!(f, "set {}", self.name),
            MemberKind::Add => write!(f, "{} +=", self.name),
            MemberKind::Remove => write!(f, "{} -=", self.name),
        }
    }
}

impl From<&str> for MemberId {
    fn from(name: &str) -> Self {
        Self::method(name)
    }
}

impl From<String> for MemberId {
    fn from(name: String) -> Self {
        Self {
            name: Arc::from(name),
            kind: MemberKind::Method,
        }
    }
}

impl From<&MemberId> for MemberId {
    fn from(id: &MemberId) -> Self {
        id.clone()
    }
}
