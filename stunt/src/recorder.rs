use std::rc::Rc;

use crate::Invocation;

/// Append-only log of the calls one substitute received.
///
/// Entries keep insertion order, which is also sequence order. The only way
/// to remove entries is [`clear`](Self::clear), which drops the whole log.
#[derive(Debug, Default)]
pub struct CallRecorder {
    entries: Vec<Rc<Invocation>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, call: Rc<Invocation>) {
        debug_assert!(
            self.entries.last().is_none_or(|last| last.seq() < call.seq()),
            "calls must be recorded in sequence order"
        );
        self.entries.push(call);
    }

    pub fn history(&self) -> &[Rc<Invocation>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
