use std::{fmt, hash};
use uuid::Uuid;

/// Identity of one constructed substitute.
///
/// Each construction yields a fresh id, so two substitutes built from the
/// same capability never share recorded history or stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubstituteId(u128);

impl SubstituteId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// First eight hex digits, enough to tell substitutes apart in reports.
    pub fn short(&self) -> String {
        let full = Uuid::from_u128(self.0).simple().to_string();
        full[..8].to_string()
    }
}

impl From<u128> for SubstituteId {
    fn from(value: u128) -> Self {
        SubstituteId(value)
    }
}

impl fmt::Display for SubstituteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl Default for SubstituteId {
    fn default() -> Self {
        SubstituteId::new()
    }
}
