//! Command Engine - reversible, mergeable commands for the graph editor
//!
//! This crate provides the transactional command layer of the editor:
//!
//! - A name-based command registry with sticky registration
//! - Argument specs checked before a command runs
//! - An undo/redo stack whose entries bundle a top-level command with the
//!   sub-commands it spawned
//! - Merging of consecutive commands into one undo entry (drag gestures)
//! - Rollback of sub-commands when a command fails part-way
//! - Synchronous event notification for UI layers
//!
//! # Example
//!
//! ```ignore
//! use command_engine::{CommandArgs, CommandManager, CommandRegistry};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register::<MoveNodeCommand>("moveNode");
//!
//! let mut manager = CommandManager::new(registry);
//! let drag = manager.new_merge_id();
//! manager.create_command("moveNode", CommandArgs::new().with("x", 10), true, Some(drag))?;
//! manager.create_command("moveNode", CommandArgs::new().with("x", 12), true, Some(drag))?;
//! manager.undo_command()?; // reverts the whole drag
//! ```

pub mod actions;
pub mod args;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod registry;

// Re-export key types
pub use actions::{ActionRegistry, Shortcut};
pub use args::{check_args, ArgKind, ArgSpec, CommandArgs};
pub use command::{Command, CommandBase, CommandContext, SharedUserData, UserData};
pub use config::{DebugMode, ManagerConfig};
pub use error::{CommandError, Result};
pub use events::{CommandEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use manager::{
    CommandManager, CreatedCommand, DoneReport, ManagerHooks, MergeId, NoHooks, StackedCommand,
};
pub use registry::{
    CommandFactory, CommandRegistry, CommandSpec, DefaultCommandFactory, FnCommandFactory,
    NATIVE_IMPL,
};
