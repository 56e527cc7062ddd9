//! Runtime configuration.

use serde::{Deserialize, Serialize};
use stackbind_types::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK};
use thiserror::Error;

/// What a member call does when stack position 1 holds no usable
/// receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiverPolicy {
    /// Skip the call and produce no result.
    #[default]
    Skip,
    /// Fail the call with [`RuntimeError::MissingReceiver`](crate::RuntimeError::MissingReceiver).
    Raise,
}

/// The limits and policies a [`State`](crate::State) runs under.
///
/// Every key is optional in TOML:
///
/// ```
/// use stackbind::{Config, ReceiverPolicy};
///
/// let config = Config::from_toml_str(r#"
///     missing-receiver = "raise"
///     max-call-depth = 64
/// "#)?;
/// assert_eq!(config.missing_receiver, ReceiverPolicy::Raise);
/// assert_eq!(config.max_call_depth, 64);
/// # Ok::<(), stackbind::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Behaviour of member calls without a valid receiver.
    pub missing_receiver: ReceiverPolicy,
    /// Maximum number of live stack slots. At most [`DEFAULT_MAX_STACK`],
    /// which keeps negative stack indices clear of the upvalue
    /// pseudo-indices.
    pub max_stack: usize,
    /// Maximum number of nested native calls.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            missing_receiver: ReceiverPolicy::default(),
            max_stack: DEFAULT_MAX_STACK,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "max-call-depth",
                reason: "must be at least 1",
            });
        }
        if self.max_stack > DEFAULT_MAX_STACK {
            return Err(ConfigError::Invalid {
                key: "max-stack",
                reason: "must be at most 1000000",
            });
        }
        Ok(())
    }
}

/// An error loading a [`Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The input is not valid TOML or has unknown keys.
    #[error("failed to parse config TOML")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_is_the_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("max-depth = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_call_depth_is_rejected() {
        let err = Config::from_toml_str("max-call-depth = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for `max-call-depth`: must be at least 1"
        );
    }

    #[test]
    fn stack_limit_is_capped() {
        let err = Config::from_toml_str("max-stack = 2000000").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for `max-stack`: must be at most 1000000"
        );
        let config = Config::from_toml_str("max-stack = 1000000").unwrap();
        assert_eq!(config.max_stack, DEFAULT_MAX_STACK);
    }

    #[test]
    fn serializes_with_kebab_case_keys() {
        let text = toml::to_string(&Config::default()).unwrap();
        assert!(text.contains("missing-receiver = \"skip\""));
        assert!(text.contains("max-stack = 1000000"));
    }
}
