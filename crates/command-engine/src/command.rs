//! The command capability and its execution context
//!
//! A command is a reversible unit of work. While it runs, a command may
//! spawn sub-commands through its [`CommandContext`]; every sub-command
//! that succeeds is recorded as a low-level command of the top-level
//! command being done, and is undone and redone together with it.

use std::any::Any;
use std::sync::Arc;

use crate::args::{check_args, ArgSpec, CommandArgs};
use crate::error::Result;
use crate::manager::{ManagerHooks, MergeId};
use crate::registry::CommandRegistry;

/// Opaque data a factory hands to every command it creates
pub type UserData = dyn Any + Send + Sync;

/// Name and arguments shared by every command implementation
#[derive(Debug, Clone, Default)]
pub struct CommandBase {
    name: String,
    args: CommandArgs,
}

impl CommandBase {
    /// Create a base with a provisional name.
    ///
    /// The registry overwrites the name with the registered one when the
    /// command is created through it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: CommandArgs::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn args(&self) -> &CommandArgs {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut CommandArgs {
        &mut self.args
    }
}

/// A reversible unit of work
///
/// Implementors embed a [`CommandBase`] and expose it through `base` and
/// `base_mut`; name and argument handling then come for free.
///
/// `do_command` must either fully apply its own effect or leave things as
/// they were. Sub-commands it spawned before failing are rolled back by the
/// manager.
pub trait Command: Send {
    fn base(&self) -> &CommandBase;

    fn base_mut(&mut self) -> &mut CommandBase;

    /// Execute the command for the first time
    fn do_command(&mut self, ctx: &mut CommandContext<'_>) -> Result<()>;

    /// Revert the effect of `do_command` (or of the last `redo_command`)
    fn undo_command(&mut self) -> Result<()>;

    /// Re-apply the effect after an undo.
    ///
    /// Sub-commands are redone by the manager; this must only re-apply the
    /// command's own effect.
    fn redo_command(&mut self) -> Result<()>;

    /// Registered name of the command
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Called by the registry right after the factory created the command
    fn registration_callback(&mut self, name: &str, _user_data: Option<&UserData>) {
        self.base_mut().set_name(name);
    }

    /// Current arguments
    fn args(&self) -> &CommandArgs {
        self.base().args()
    }

    /// Set one argument from its string encoding
    fn set_arg(&mut self, key: &str, value: &str) {
        self.base_mut().args_mut().set(key, value);
    }

    /// Arguments this command understands
    fn arg_specs(&self) -> Vec<ArgSpec> {
        Vec::new()
    }

    /// Whether the command goes on the undo stack once done
    fn can_undo(&self) -> bool {
        true
    }

    /// Whether this command may replace the top undo entry, whose top-level
    /// command is `previous`, when both were done with `merge_id`.
    ///
    /// Only consulted once the merge ids already match.
    fn can_merge_with(&self, _previous: &dyn Command, _merge_id: MergeId) -> bool {
        true
    }

    /// One-line summary for history views and stack dumps
    fn description(&self) -> String {
        self.name().to_string()
    }
}

impl std::fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .field("args", self.args())
            .finish()
    }
}

/// Execution context handed to a top-level command while it runs
///
/// Collects the low-level commands the top-level command spawns, in the
/// order they start.
pub struct CommandContext<'a> {
    registry: &'a CommandRegistry,
    hooks: &'a dyn ManagerHooks,
    low_level: Vec<Box<dyn Command>>,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(registry: &'a CommandRegistry, hooks: &'a dyn ManagerHooks) -> Self {
        Self {
            registry,
            hooks,
            low_level: Vec::new(),
        }
    }

    /// Create a registered command, set and check its arguments, then do it
    /// as a sub-command.
    pub fn create_command(&mut self, name: &str, args: CommandArgs) -> Result<()> {
        let mut cmd = self.registry.create_command(name)?;
        for (key, value) in args.iter() {
            cmd.set_arg(key, value);
        }
        check_args(cmd.name(), &cmd.arg_specs(), cmd.args())?;
        self.do_command(cmd)
    }

    /// Do `cmd` as a sub-command of the command currently executing.
    ///
    /// Sub-commands spawned by `cmd` itself are recorded after it, so the
    /// flat list stays in start order.
    pub fn do_command(&mut self, mut cmd: Box<dyn Command>) -> Result<()> {
        let slot = self.low_level.len();
        cmd.do_command(self)?;
        self.hooks.command_pushed(cmd.as_ref(), true);
        self.low_level.insert(slot, cmd);
        Ok(())
    }

    /// Number of sub-commands recorded so far
    pub fn low_level_count(&self) -> usize {
        self.low_level.len()
    }

    pub(crate) fn into_low_level(self) -> Vec<Box<dyn Command>> {
        self.low_level
    }
}

/// Handle to user data passed through the registry
pub type SharedUserData = Arc<UserData>;
