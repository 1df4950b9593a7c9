//! Command arguments and argument specs
//!
//! Arguments travel as string-encoded values keyed by name, the same way
//! they would arrive from a script console or a serialized log. Each command
//! declares the keys it understands through [`ArgSpec`]s; the manager checks
//! incoming arguments against those specs before a command runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};

/// String-keyed, string-valued argument map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandArgs {
    inner: BTreeMap<String, String>,
}

impl CommandArgs {
    /// Create an empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value.to_string());
        self
    }

    /// Set an argument, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Get the raw string value of an argument
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(|s| s.as_str())
    }

    /// Check whether an argument is set
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get a required string argument
    pub fn require(&self, command: &str, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| CommandError::MissingArgument {
            command: command.to_string(),
            arg: key.to_string(),
        })
    }

    /// Get a required argument parsed as `f64`
    pub fn require_f64(&self, command: &str, key: &str) -> Result<f64> {
        let raw = self.require(command, key)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CommandError::MalformedArgument {
                command: command.to_string(),
                arg: key.to_string(),
                expected: ArgKind::Float.to_string(),
                value: raw.to_string(),
            })
    }

    /// Get a required argument parsed as JSON
    pub fn require_json(&self, command: &str, key: &str) -> Result<serde_json::Value> {
        let raw = self.require(command, key)?;
        serde_json::from_str(raw).map_err(|_| CommandError::MalformedArgument {
            command: command.to_string(),
            arg: key.to_string(),
            expected: ArgKind::Json.to_string(),
            value: raw.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CommandArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl fmt::Display for CommandArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// The kind of value an argument holds once decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// Any string
    String,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// `true` or `false`
    Bool,
    /// Any JSON document
    Json,
}

impl ArgKind {
    /// Check that `raw` decodes as this kind.
    ///
    /// On failure returns the human name of the expected kind.
    fn check(self, raw: &str) -> std::result::Result<(), String> {
        let ok = match self {
            ArgKind::String => true,
            ArgKind::Int => raw.trim().parse::<i64>().is_ok(),
            ArgKind::Float => raw.trim().parse::<f64>().map(|v| v.is_finite()).unwrap_or(false),
            ArgKind::Bool => matches!(raw.trim(), "true" | "false"),
            ArgKind::Json => serde_json::from_str::<serde_json::Value>(raw).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(self.to_string())
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgKind::String => "string",
            ArgKind::Int => "integer",
            ArgKind::Float => "number",
            ArgKind::Bool => "boolean",
            ArgKind::Json => "JSON value",
        };
        f.write_str(name)
    }
}

/// Declaration of one argument a command accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    /// Argument key
    pub key: String,
    /// Value kind
    pub kind: ArgKind,
    /// Whether the argument must be set before the command runs
    pub required: bool,
    /// Human-readable description
    pub description: String,
}

impl ArgSpec {
    pub fn new(key: impl Into<String>, kind: ArgKind, required: bool) -> Self {
        Self {
            key: key.into(),
            kind,
            required,
            description: String::new(),
        }
    }

    /// Create a required argument spec
    pub fn required(key: impl Into<String>, kind: ArgKind) -> Self {
        Self::new(key, kind, true)
    }

    /// Create an optional argument spec
    pub fn optional(key: impl Into<String>, kind: ArgKind) -> Self {
        Self::new(key, kind, false)
    }

    /// Attach a description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Check `args` against `specs` for the command `command`.
///
/// Fails on the first key the command does not declare, then on the first
/// required key that is missing, then on the first value that does not
/// decode as its declared kind.
pub fn check_args(command: &str, specs: &[ArgSpec], args: &CommandArgs) -> Result<()> {
    for (key, _) in args.iter() {
        if !specs.iter().any(|s| s.key == key) {
            return Err(CommandError::UnsupportedArgument {
                command: command.to_string(),
                arg: key.to_string(),
            });
        }
    }

    for spec in specs {
        match args.get(&spec.key) {
            None if spec.required => {
                return Err(CommandError::MissingArgument {
                    command: command.to_string(),
                    arg: spec.key.clone(),
                });
            }
            None => {}
            Some(raw) => {
                spec.kind
                    .check(raw)
                    .map_err(|expected| CommandError::MalformedArgument {
                        command: command.to_string(),
                        arg: spec.key.clone(),
                        expected,
                        value: raw.to_string(),
                    })?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_specs() -> Vec<ArgSpec> {
        vec![
            ArgSpec::required("x", ArgKind::Float),
            ArgSpec::optional("label", ArgKind::String),
        ]
    }

    #[test]
    fn test_valid_args() {
        let args = CommandArgs::new().with("x", 1.5);
        assert!(check_args("move", &move_specs(), &args).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let args = CommandArgs::new().with("label", "drag");
        let err = check_args("move", &move_specs(), &args).unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { ref arg, .. } if arg == "x"));
    }

    #[test]
    fn test_malformed_value() {
        let args = CommandArgs::new().with("x", "left");
        let err = check_args("move", &move_specs(), &args).unwrap_err();
        assert!(matches!(err, CommandError::MalformedArgument { ref expected, .. } if expected == "number"));
    }

    #[test]
    fn test_unsupported_key() {
        let args = CommandArgs::new().with("x", 1).with("y", 2);
        let err = check_args("move", &move_specs(), &args).unwrap_err();
        assert!(matches!(err, CommandError::UnsupportedArgument { ref arg, .. } if arg == "y"));
    }

    #[test]
    fn test_kind_checks() {
        assert!(ArgKind::Int.check("42").is_ok());
        assert!(ArgKind::Int.check("4.2").is_err());
        assert!(ArgKind::Bool.check("true").is_ok());
        assert!(ArgKind::Bool.check("yes").is_err());
        assert!(ArgKind::Json.check(r#"{"a": [1, 2]}"#).is_ok());
        assert!(ArgKind::Json.check("{").is_err());
        assert!(ArgKind::Float.check("NaN").is_err());
    }

    #[test]
    fn test_display_is_key_ordered() {
        let args = CommandArgs::new().with("y", 2).with("x", 1);
        assert_eq!(args.to_string(), "x=1, y=2");
    }

    #[test]
    fn test_require_helpers() {
        let args = CommandArgs::new()
            .with("x", "3.25")
            .with("data", r#"{"k": 1}"#);
        assert_eq!(args.require_f64("move", "x").unwrap(), 3.25);
        assert_eq!(args.require_json("set", "data").unwrap()["k"], 1);
        assert!(args.require("move", "y").is_err());
    }
}
