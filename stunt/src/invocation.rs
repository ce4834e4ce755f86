use std::{fmt, sync::Arc};

use crate::{CallSeq, FromValue, MemberId, Result, SubstituteId, Value};

/// One observed call on a substitute.
///
/// Created once per dispatched call and never modified afterwards. Reactions
/// and callbacks receive the invocation being dispatched, so they can read
/// the actual arguments.
///
/// # Fields
///
/// - `seq`: process-wide position of the call
/// - `target`: the substitute that received the call
/// - `member`: the member that was called
/// - `args`: the actual arguments, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    seq: CallSeq,
    target: SubstituteId,
    capability: Arc<str>,
    member: MemberId,
    args: Vec<Value>,
}

impl Invocation {
    pub(crate) fn new(
        target: SubstituteId,
        capability: Arc<str>,
        member: MemberId,
        args: Vec<Value>,
    ) -> Self {
        Self {
            seq: CallSeq::next(),
            target,
            capability,
            member,
            args,
        }
    }

    #[inline]
    pub fn seq(&self) -> CallSeq {
        self.seq
    }

    #[inline]
    pub fn target(&self) -> SubstituteId {
        self.target
    }

    /// Name of the capability the target implements.
    pub fn capability(&self) -> &str {
        &self.capability
    }

    #[inline]
    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Returns the argument at `index` converted to `T`.
    ///
    /// A missing argument converts as unit, so asking for a `String` at an
    /// index past the end reports a type mismatch.
    pub fn arg_as<T: FromValue>(&self, index: usize) -> Result<T> {
        T::from_value(self.args.get(index).cloned().unwrap_or_default())
    }

    /// Renders the call without the capability prefix, e.g. `add(1, 2)`.
    pub fn describe(&self) -> String {
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        self.member.render(&args)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.capability, self.describe())
    }
}
