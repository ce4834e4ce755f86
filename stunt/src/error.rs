use std::sync::Arc;

use crate::{Failure, MemberId, OrderingFailure, VerificationFailure};

/// The single error type for all stunt operations.
///
/// Errors fall into four groups:
///
/// - configuration errors (see [`Error::is_configuration`]): an undeclared
///   member, a wrong argument count, a value the member cannot return, or an
///   unsupported reaction. Reported by the call that configured or queried
///   the substitute.
/// - [`Error::Configured`]: a stub configured to fail was dispatched. It
///   reaches the caller of the substituted member exactly like a failure of
///   the real implementation would.
/// - [`Error::Verification`] and [`Error::Ordering`]: expectations about the
///   recorded history were not met. These are meant to end the test.
/// - conversion and strict-mode errors raised while dispatching.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("'{capability}' does not declare member '{member}'")]
    UndeclaredMember {
        capability: Arc<str>,
        member: MemberId,
    },

    #[error("'{capability}' declares member '{member}' more than once")]
    DuplicateMember {
        capability: Arc<str>,
        member: MemberId,
    },

    #[error("'{member}' takes {expected} argument(s) but {actual} were supplied")]
    ArityMismatch {
        member: MemberId,
        expected: usize,
        actual: usize,
    },

    #[error("'{member}' returns {expected} but the configured value is {found}")]
    ReturnKindMismatch {
        member: MemberId,
        expected: String,
        found: &'static str,
    },

    #[error("Unsupported reaction for '{member}': {reason}")]
    UnsupportedReaction {
        member: MemberId,
        reason: &'static str,
    },

    #[error("Expected a value of type {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("No stub matches the call {0}")]
    Unconfigured(String),

    #[error(transparent)]
    Configured(Failure),

    #[error("{0}")]
    Verification(VerificationFailure),

    #[error("{0}")]
    Ordering(OrderingFailure),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    /// Returns true for errors caused by configuring or querying a member
    /// in a way the capability does not allow.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UndeclaredMember { .. }
                | Error::DuplicateMember { .. }
                | Error::ArityMismatch { .. }
                | Error::ReturnKindMismatch { .. }
                | Error::UnsupportedReaction { .. }
        )
    }

    /// Returns the configured failure if this error came from a `Throw` reaction.
    pub fn as_configured(&self) -> Option<&Failure> {
        match self {
            Error::Configured(failure) => Some(failure),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::UndeclaredMember {
                    capability: c1,
                    member: m1,
                },
                Self::UndeclaredMember {
                    capability: c2,
                    member: m2,
                },
            )
            | (
                Self::DuplicateMember {
                    capability: c1,
                    member: m1,
                },
                Self::DuplicateMember {
                    capability: c2,
                    member: m2,
                },
            ) => c1 == c2 && m1 == m2,
            (
                Self::ArityMismatch {
                    member: m1,
                    expected: e1,
                    actual: a1,
                },
                Self::ArityMismatch {
                    member: m2,
                    expected: e2,
                    actual: a2,
                },
            ) => m1 == m2 && e1 == e2 && a1 == a2,
            (
                Self::ReturnKindMismatch {
                    member: m1,
                    expected: e1,
                    found: f1,
                },
                Self::ReturnKindMismatch {
                    member: m2,
                    expected: e2,
                    found: f2,
                },
            ) => m1 == m2 && e1 == e2 && f1 == f2,
            (
                Self::UnsupportedReaction {
                    member: m1,
                    reason: r1,
                },
                Self::UnsupportedReaction {
                    member: m2,
                    reason: r2,
                },
            ) => m1 == m2 && r1 == r2,
            (
                Self::TypeMismatch {
                    expected: e1,
                    found: f1,
                },
                Self::TypeMismatch {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (Self::Unconfigured(a), Self::Unconfigured(b)) => a == b,
            (Self::Configured(a), Self::Configured(b)) => a == b,
            (Self::Verification(a), Self::Verification(b)) => a == b,
            (Self::Ordering(a), Self::Ordering(b)) => a == b,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        Error::Configured(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        let undeclared = Error::UndeclaredMember {
            capability: Arc::from("Calculator"),
            member: MemberId::method("divide"),
        };
        assert!(undeclared.is_configuration());
        assert_eq!(
            undeclared.to_string(),
            "'Calculator' does not declare member 'divide'"
        );

        let failure = Error::Configured(Failure::new("boom"));
        assert!(!failure.is_configuration());
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn configured_failures_compare_by_identity() {
        let failure = Failure::new("boom");
        assert_eq!(
            Error::Configured(failure.clone()),
            Error::Configured(failure)
        );
        assert_ne!(
            Error::Configured(Failure::new("boom")),
            Error::Configured(Failure::new("boom"))
        );
    }

    #[test]
    fn as_configured_exposes_failure() {
        let failure = Failure::new("queue is empty");
        let err: Error = failure.clone().into();
        assert_eq!(err.as_configured(), Some(&failure));
        assert!(Error::Unconfigured("x".into()).as_configured().is_none());
    }
}
