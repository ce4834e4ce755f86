/// Behavior switches for substitutes.
///
/// Use the builder methods to customize, or [`Default`] for the usual
/// behavior: lenient defaults and auto-valued properties.
///
/// # Examples
///
/// ```rust
/// use stunt::Config;
///
/// let config = Config::default()
///     .with_strict(true)                   // unmatched calls fail
///     .with_auto_property_values(false);   // setters do not feed getters
/// assert!(config.strict());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// When set, a call that matches no stub on a member returning a value
    /// fails with [`Error::Unconfigured`](crate::Error::Unconfigured)
    /// instead of returning the default.
    /// Members returning unit never fail this way.
    /// Default: false
    strict: bool,

    /// When set, dispatching a property setter makes later getter calls
    /// return the assigned value, until another set or a newer stub.
    /// Default: true
    auto_property_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict: false,
            auto_property_values: true,
        }
    }
}

impl Config {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn with_auto_property_values(mut self, enabled: bool) -> Self {
        self.auto_property_values = enabled;
        self
    }

    pub fn auto_property_values(&self) -> bool {
        self.auto_property_values
    }
}
