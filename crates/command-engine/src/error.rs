//! Error types for the command engine

use thiserror::Error;

/// Result type alias using CommandError
pub type Result<T> = std::result::Result<T, CommandError>;

/// Errors that can occur while creating, doing, undoing or redoing commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// No factory registered under this name
    #[error("Cannot create command '{0}', it's not registered")]
    NotRegistered(String),

    /// The factory returned no command instance
    #[error("Factory for '{0}' produced no command")]
    NullCommand(String),

    /// An argument was passed that the command does not declare
    #[error("Command '{command}' does not support argument '{arg}'")]
    UnsupportedArgument { command: String, arg: String },

    /// A required argument is missing
    #[error("Command '{command}' is missing required argument '{arg}'")]
    MissingArgument { command: String, arg: String },

    /// An argument value could not be parsed as its declared kind
    #[error("Command '{command}': argument '{arg}' = '{value}' is not a valid {expected}")]
    MalformedArgument {
        command: String,
        arg: String,
        expected: String,
        value: String,
    },

    /// The command's own logic failed
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Doing a top-level command failed; its sub-commands were rolled back
    #[error("Doing '{command}' failed: {source}")]
    DoFailed {
        command: String,
        #[source]
        source: Box<CommandError>,
    },

    /// Doing a top-level command failed and some of its sub-commands could
    /// not be rolled back; their effects are still applied
    #[error(
        "Doing '{command}' failed: {source}; could not roll back {}",
        .rollback.join(", ")
    )]
    RollbackFailed {
        command: String,
        #[source]
        source: Box<CommandError>,
        /// One message per sub-command whose undo failed, last done first
        rollback: Vec<String>,
    },

    /// The undo stack is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Undoing a stack entry failed part-way
    #[error("Undoing '{command}' failed: {source}")]
    UndoFailed {
        command: String,
        #[source]
        source: Box<CommandError>,
    },

    /// Redoing a stack entry failed part-way
    #[error("Redoing '{command}' failed: {source}")]
    RedoFailed {
        command: String,
        #[source]
        source: Box<CommandError>,
    },

    /// The entry was left half-applied by an earlier undo/redo failure
    #[error("Stack entry '{0}' is corrupt after a failed undo/redo; clear the stack")]
    CorruptEntry(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Wrap an error raised while doing `command`
    pub(crate) fn doing(command: &str, source: CommandError) -> Self {
        Self::DoFailed {
            command: command.to_string(),
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while doing `command` whose rollback was
    /// incomplete
    pub(crate) fn doing_with_rollback(
        command: &str,
        source: CommandError,
        rollback: Vec<String>,
    ) -> Self {
        if rollback.is_empty() {
            return Self::doing(command, source);
        }
        Self::RollbackFailed {
            command: command.to_string(),
            source: Box::new(source),
            rollback,
        }
    }

    pub(crate) fn undoing(command: &str, source: CommandError) -> Self {
        Self::UndoFailed {
            command: command.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn redoing(command: &str, source: CommandError) -> Self {
        Self::RedoFailed {
            command: command.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composed_message_names_operation_and_cause() {
        let err = CommandError::doing("moveNode", CommandError::failed("node 'a' not found"));
        assert_eq!(
            err.to_string(),
            "Doing 'moveNode' failed: Command execution failed: node 'a' not found"
        );
    }

    #[test]
    fn test_rollback_failures_named_in_message() {
        let err = CommandError::doing_with_rollback(
            "removeNode",
            CommandError::failed("boom"),
            vec!["'disconnect': locked".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Doing 'removeNode' failed: Command execution failed: boom; could not roll back 'disconnect': locked"
        );

        let clean = CommandError::doing_with_rollback("removeNode", CommandError::failed("boom"), vec![]);
        assert!(matches!(clean, CommandError::DoFailed { .. }));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = CommandError::undoing("connect", CommandError::failed("boom"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Command execution failed: boom");
    }
}
