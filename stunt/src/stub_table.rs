use std::rc::Rc;

use crate::{MemberId, Value, stub_rule::StubRule};

/// Ordered stub rules of one substitute.
///
/// Resolution scans the rules for a member from the most recently
/// registered to the oldest and picks the first whose matchers accept the
/// arguments, so later configuration overrides earlier configuration for
/// overlapping matchers.
#[derive(Debug, Default)]
pub(crate) struct StubTable {
    rules: Vec<Rc<StubRule>>,
}

impl StubTable {
    pub(crate) fn register(&mut self, rule: Rc<StubRule>) {
        self.rules.push(rule);
    }

    /// Register a property value rule, replacing the previous one for the
    /// same getter.
    pub(crate) fn register_auto(&mut self, rule: Rc<StubRule>) {
        self.rules
            .retain(|r| !(r.is_auto() && r.member() == rule.member()));
        self.rules.push(rule);
    }

    /// Rules for `member` in registration order.
    pub(crate) fn rules_for(&self, member: &MemberId) -> Vec<Rc<StubRule>> {
        self.rules
            .iter()
            .filter(|r| r.member() == member)
            .cloned()
            .collect()
    }

    pub(crate) fn resolve(rules: &[Rc<StubRule>], args: &[Value]) -> Option<Rc<StubRule>> {
        rules.iter().rev().find(|r| r.accepts(args)).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }
}
