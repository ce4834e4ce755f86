use std::{
    fmt, hash,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Position of a call in the process-wide call history.
///
/// Every dispatched call takes the next number from a single process-wide
/// counter, so sequence numbers are strictly increasing both within one
/// substitute and across all substitutes. Call-order verification relies
/// on this to interleave histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallSeq(u64);

impl CallSeq {
    pub(crate) fn next() -> Self {
        Self(NEXT_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CallSeq {
    fn from(value: u64) -> Self {
        CallSeq(value)
    }
}

impl From<CallSeq> for u64 {
    fn from(value: CallSeq) -> Self {
        value.0
    }
}

impl fmt::Display for CallSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
