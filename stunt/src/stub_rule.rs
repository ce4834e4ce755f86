use std::{
    cell::{Cell, RefCell},
    fmt,
};

use crate::{Matchers, MemberId, Reaction, Value};

/// A (member, matchers) -> reactions binding.
///
/// Reactions can be attached after registration, so the list sits behind a
/// `RefCell`; dispatch works on a snapshot and never holds the borrow while
/// user code runs.
pub(crate) struct StubRule {
    member: MemberId,
    matchers: Matchers,
    reactions: RefCell<Vec<Reaction>>,
    enabled: Cell<bool>,
    auto: bool,
}

impl StubRule {
    pub(crate) fn new(member: MemberId, matchers: Matchers) -> Self {
        Self {
            member,
            matchers,
            reactions: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            auto: false,
        }
    }

    /// A getter rule recorded by a property set.
    pub(crate) fn auto_property(member: MemberId, value: Value) -> Self {
        Self {
            member,
            matchers: Matchers::any(),
            reactions: RefCell::new(vec![Reaction::Value(value)]),
            enabled: Cell::new(true),
            auto: true,
        }
    }

    #[inline]
    pub(crate) fn member(&self) -> &MemberId {
        &self.member
    }

    #[inline]
    pub(crate) fn matchers(&self) -> &Matchers {
        &self.matchers
    }

    pub(crate) fn is_auto(&self) -> bool {
        self.auto
    }

    pub(crate) fn attach(&self, reaction: Reaction) {
        self.reactions.borrow_mut().push(reaction);
    }

    pub(crate) fn reactions(&self) -> Vec<Reaction> {
        self.reactions.borrow().clone()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub(crate) fn accepts(&self, args: &[Value]) -> bool {
        self.is_enabled() && self.matchers.matches(args)
    }
}

impl fmt::Debug for StubRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubRule")
            .field("member", &self.member)
            .field("matchers", &self.matchers)
            .field("reactions", &self.reactions.borrow())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
