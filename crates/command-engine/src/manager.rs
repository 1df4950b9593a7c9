//! Command manager: execution, undo/redo stacks and merging
//!
//! The manager creates commands through its [`CommandRegistry`], does them,
//! and keeps every successfully done top-level command, together with the
//! low-level commands it spawned, as one [`StackedCommand`] on the undo
//! stack.
//!
//! # Failure handling
//!
//! - A failed `do_command` rolls back the sub-commands it already did, in
//!   reverse order, and leaves both stacks exactly as they were.
//! - A failed undo or redo is not rolled back. The entry keeps whatever
//!   state it reached, is marked corrupt and stays where it was; any later
//!   undo (or redo) reaching it fails with [`CommandError::CorruptEntry`]
//!   until [`CommandManager::clear`] is called.
//!
//! # Merging
//!
//! Callers grouping a gesture (e.g. a node drag) ask for a
//! [`MergeId`] once and pass it with every command of the gesture. A command
//! done with the same id as the top undo entry replaces that entry; the
//! replaced entry is kept inside the new one so a single undo reverts the
//! whole gesture.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::args::{check_args, CommandArgs};
use crate::command::{Command, CommandContext};
use crate::config::{DebugMode, ManagerConfig};
use crate::error::{CommandError, Result};
use crate::events::{CommandEvent, EventSink, Observers};
use crate::registry::CommandRegistry;

/// Token grouping consecutive commands into one undo entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MergeId(u64);

impl MergeId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Extension points around command execution
///
/// All methods default to no-ops. Bridges to other runtimes override them
/// to mirror the stacks on their side.
pub trait ManagerHooks: Send + Sync {
    /// Called before a top-level command is done
    fn pre_do_command(&self, _cmd: &dyn Command) {}

    /// Called after a top-level command was done, undone or redone
    fn post_do_command(&self, _cmd: &dyn Command) {}

    /// Called when a command is recorded, either on the undo stack
    /// (`is_low == false`) or as a sub-command
    fn command_pushed(&self, _cmd: &dyn Command, _is_low: bool) {}
}

/// Hooks that do nothing
pub struct NoHooks;

impl ManagerHooks for NoHooks {}

/// Outcome of a successful `do_command`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneReport {
    pub name: String,
    /// False when the command cannot be undone and was not stacked
    pub added_to_stack: bool,
    /// True when the command replaced the top entry through merging
    pub replaced: bool,
}

/// Result of [`CommandManager::create_command`]
#[derive(Debug)]
pub enum CreatedCommand {
    /// Created with arguments set, not done yet
    Pending(Box<dyn Command>),
    /// Created and done
    Done(DoneReport),
}

/// An undo/redo stack entry
///
/// Bundles one top-level command with the low-level commands it spawned,
/// plus any entries it replaced through merging.
pub struct StackedCommand {
    top_level: Box<dyn Command>,
    low_level: Vec<Box<dyn Command>>,
    /// Entries replaced by merging, oldest first
    merged: Vec<StackedCommand>,
    merge_id: Option<MergeId>,
    succeeded: bool,
}

impl StackedCommand {
    fn new(
        top_level: Box<dyn Command>,
        low_level: Vec<Box<dyn Command>>,
        merge_id: Option<MergeId>,
    ) -> Self {
        Self {
            top_level,
            low_level,
            merged: Vec::new(),
            merge_id,
            succeeded: true,
        }
    }

    pub fn top_level(&self) -> &dyn Command {
        self.top_level.as_ref()
    }

    pub fn low_level(&self) -> impl Iterator<Item = &dyn Command> {
        self.low_level.iter().map(|c| c.as_ref())
    }

    pub fn merge_id(&self) -> Option<MergeId> {
        self.merge_id
    }

    /// False once an undo or redo of this entry failed part-way
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Number of entries folded into this one by merging
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    /// Top-level plus low-level commands of this entry.
    ///
    /// Entries folded in by merging are not counted; see
    /// [`merged_count`](Self::merged_count).
    pub fn command_count(&self) -> usize {
        1 + self.low_level.len()
    }

    fn absorb(&mut self, mut previous: StackedCommand) {
        let mut older = std::mem::take(&mut previous.merged);
        older.push(previous);
        self.merged = older;
    }

    /// Undo low-level commands last to first, then the top-level, then the
    /// entries this one replaced, newest first.
    fn undo(&mut self) -> Result<()> {
        for cmd in self.low_level.iter_mut().rev() {
            cmd.undo_command()
                .map_err(|e| CommandError::undoing(cmd.name(), e))?;
        }
        self.top_level.undo_command()?;
        for entry in self.merged.iter_mut().rev() {
            entry.undo()?;
        }
        Ok(())
    }

    /// Exact reverse of `undo`
    fn redo(&mut self) -> Result<()> {
        for entry in self.merged.iter_mut() {
            entry.redo()?;
        }
        self.top_level.redo_command()?;
        for cmd in self.low_level.iter_mut() {
            cmd.redo_command()
                .map_err(|e| CommandError::redoing(cmd.name(), e))?;
        }
        Ok(())
    }
}

/// Owns the undo/redo stacks and does, undoes and redoes commands
pub struct CommandManager {
    registry: CommandRegistry,
    hooks: Box<dyn ManagerHooks>,
    observers: Observers,
    undo_stack: Vec<StackedCommand>,
    redo_stack: Vec<StackedCommand>,
    merge_id_counter: u64,
    config: ManagerConfig,
}

impl CommandManager {
    /// Create a manager with default settings around `registry`
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            hooks: Box::new(NoHooks),
            observers: Observers::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            merge_id_counter: 0,
            config: ManagerConfig::default(),
        }
    }

    /// Create a manager with explicit settings
    pub fn with_config(registry: CommandRegistry, config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        let mut manager = Self::new(registry);
        manager.config = config;
        Ok(manager)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Replace the execution hooks
    pub fn set_hooks(&mut self, hooks: Box<dyn ManagerHooks>) {
        self.hooks = hooks;
    }

    /// Subscribe to manager events
    pub fn add_observer(&mut self, sink: Arc<dyn EventSink>) {
        self.observers.add(sink);
    }

    pub fn set_debug_mode(&mut self, mode: DebugMode) {
        self.config.debug_mode = mode;
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.config.debug_mode
    }

    /// Create a registered command and set its arguments.
    ///
    /// With `do_cmd` the command is done immediately (see
    /// [`do_command`](Self::do_command)); otherwise the configured command
    /// is handed back to the caller.
    pub fn create_command(
        &mut self,
        name: &str,
        args: CommandArgs,
        do_cmd: bool,
        merge_id: Option<MergeId>,
    ) -> Result<CreatedCommand> {
        let mut cmd = self.registry.create_command(name)?;
        Self::check_command_args(cmd.as_mut(), &args)?;

        if !do_cmd {
            return Ok(CreatedCommand::Pending(cmd));
        }
        self.do_command(cmd, merge_id).map(CreatedCommand::Done)
    }

    /// Set `args` on `cmd` and check them against its argument specs
    pub fn check_command_args(cmd: &mut dyn Command, args: &CommandArgs) -> Result<()> {
        for (key, value) in args.iter() {
            cmd.set_arg(key, value);
        }
        check_args(cmd.name(), &cmd.arg_specs(), cmd.args())
    }

    /// Do a command and record it on the undo stack.
    ///
    /// On failure every sub-command the command already did is undone and
    /// the stacks are left untouched. Sub-commands that could not be undone
    /// are listed in [`CommandError::RollbackFailed`].
    pub fn do_command(
        &mut self,
        mut cmd: Box<dyn Command>,
        merge_id: Option<MergeId>,
    ) -> Result<DoneReport> {
        self.hooks.pre_do_command(cmd.as_ref());

        let mut ctx = CommandContext::new(&self.registry, self.hooks.as_ref());
        let outcome = cmd.do_command(&mut ctx);
        let low_level = ctx.into_low_level();

        if let Err(e) = outcome {
            let rollback = Self::roll_back(low_level);
            let err = CommandError::doing_with_rollback(cmd.name(), e, rollback);
            log::warn!("{}", err);
            return Err(err);
        }

        let name = cmd.name().to_string();
        let args = cmd.args().clone();

        let report = if cmd.can_undo() {
            self.clear_redo_stack();
            let replaced = self.push_top_command(cmd, low_level, merge_id);
            DoneReport {
                name,
                added_to_stack: true,
                replaced,
            }
        } else {
            self.hooks.post_do_command(cmd.as_ref());
            DoneReport {
                name,
                added_to_stack: false,
                replaced: false,
            }
        };

        self.observers.emit(CommandEvent::CommandDone {
            name: report.name.clone(),
            args,
            added_to_stack: report.added_to_stack,
            replaced: report.replaced,
        });
        if report.added_to_stack {
            if let Some(entry) = self.undo_stack.last() {
                self.hooks.post_do_command(entry.top_level());
            }
        }
        self.log_stacks();

        Ok(report)
    }

    /// Undo the most recent undo entry and move it to the redo stack
    pub fn undo_command(&mut self) -> Result<()> {
        let entry = self
            .undo_stack
            .last_mut()
            .ok_or(CommandError::NothingToUndo)?;

        if !entry.succeeded {
            return Err(CommandError::CorruptEntry(entry.top_level.name().to_string()));
        }

        if let Err(e) = entry.undo() {
            entry.succeeded = false;
            let err = CommandError::undoing(entry.top_level.name(), e);
            log::error!("{}", err);
            self.log_stacks();
            return Err(err);
        }

        if let Some(entry) = self.undo_stack.pop() {
            let name = entry.top_level.name().to_string();
            self.redo_stack.push(entry);
            self.observers.emit(CommandEvent::CommandUndone { name });
        }
        if let Some(entry) = self.redo_stack.last() {
            self.hooks.post_do_command(entry.top_level());
        }
        self.log_stacks();
        Ok(())
    }

    /// Redo the most recent redo entry and move it back to the undo stack
    pub fn redo_command(&mut self) -> Result<()> {
        let entry = self
            .redo_stack
            .last_mut()
            .ok_or(CommandError::NothingToRedo)?;

        if !entry.succeeded {
            return Err(CommandError::CorruptEntry(entry.top_level.name().to_string()));
        }

        if let Err(e) = entry.redo() {
            entry.succeeded = false;
            let err = CommandError::redoing(entry.top_level.name(), e);
            log::error!("{}", err);
            self.log_stacks();
            return Err(err);
        }

        if let Some(entry) = self.redo_stack.pop() {
            let name = entry.top_level.name().to_string();
            self.undo_stack.push(entry);
            self.observers.emit(CommandEvent::CommandRedone { name });
        }
        if let Some(entry) = self.undo_stack.last() {
            self.hooks.post_do_command(entry.top_level());
        }
        self.log_stacks();
        Ok(())
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.observers.emit(CommandEvent::Cleared);
        self.log_stacks();
    }

    /// Issue a new merge id, distinct from every id issued before
    pub fn new_merge_id(&mut self) -> MergeId {
        self.merge_id_counter += 1;
        MergeId(self.merge_id_counter)
    }

    /// Number of top-level entries on the undo stack
    pub fn count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of entries on the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Number of top-level and low-level commands on the undo stack.
    ///
    /// A merged entry counts as its latest command only.
    pub fn total_undo_count(&self) -> usize {
        self.undo_stack.iter().map(|e| e.command_count()).sum()
    }

    /// Index of the next entry to undo, `None` when there is nothing to undo
    pub fn stack_index(&self) -> Option<usize> {
        self.undo_stack.len().checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.last().is_some_and(|e| e.succeeded)
    }

    pub fn can_redo(&self) -> bool {
        self.redo_stack.last().is_some_and(|e| e.succeeded)
    }

    /// Top-level command of the undo entry at `index`
    pub fn command_at_index(&self, index: usize) -> Option<&dyn Command> {
        self.undo_stack.get(index).map(|e| e.top_level())
    }

    /// Undo entry at `index`
    pub fn entry_at_index(&self, index: usize) -> Option<&StackedCommand> {
        self.undo_stack.get(index)
    }

    /// Both stacks as a string, used for debugging
    pub fn content(&self, with_args: bool) -> String {
        let index = self
            .stack_index()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-1".to_string());
        let mut res = format!(
            "--> CommandManager - size:{}, index:{}, total:{}\n",
            self.count(),
            index,
            self.total_undo_count()
        );
        res.push_str(&Self::stack_content("undo", &self.undo_stack, with_args));
        res.push_str(&Self::stack_content("redo", &self.redo_stack, with_args));
        res
    }

    fn stack_content(stack_name: &str, stack: &[StackedCommand], with_args: bool) -> String {
        let mut res = format!("  {} stack:\n", stack_name);
        for (i, entry) in stack.iter().enumerate() {
            let _ = write!(
                res,
                "    [{}] {}",
                i,
                Self::command_line(entry.top_level(), with_args)
            );
            if !entry.merged.is_empty() {
                let _ = write!(res, " (merged:{})", entry.merged.len());
            }
            if !entry.succeeded {
                res.push_str(" [corrupt]");
            }
            res.push('\n');
            for (j, low) in entry.low_level().enumerate() {
                let _ = writeln!(res, "      [{}.{}] {}", i, j, Self::command_line(low, with_args));
            }
        }
        res
    }

    fn command_line(cmd: &dyn Command, with_args: bool) -> String {
        if with_args && !cmd.args().is_empty() {
            format!("{} ({})", cmd.description(), cmd.args())
        } else {
            cmd.description()
        }
    }

    fn push_top_command(
        &mut self,
        cmd: Box<dyn Command>,
        low_level: Vec<Box<dyn Command>>,
        merge_id: Option<MergeId>,
    ) -> bool {
        let mut entry = StackedCommand::new(cmd, low_level, merge_id);

        let replaces_top = match (merge_id, self.undo_stack.last()) {
            (Some(id), Some(top)) => {
                top.succeeded
                    && top.merge_id == Some(id)
                    && entry.top_level.can_merge_with(top.top_level(), id)
            }
            _ => false,
        };
        if replaces_top {
            if let Some(previous) = self.undo_stack.pop() {
                entry.absorb(previous);
            }
        }

        self.hooks.command_pushed(entry.top_level(), false);
        self.undo_stack.push(entry);
        self.trim_undo_stack();
        replaces_top
    }

    fn clear_redo_stack(&mut self) {
        if !self.redo_stack.is_empty() {
            log::debug!("Discarding {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    fn trim_undo_stack(&mut self) {
        if let Some(max) = self.config.max_undo_depth {
            if self.undo_stack.len() > max {
                let excess = self.undo_stack.len() - max;
                self.undo_stack.drain(..excess);
                log::debug!("Dropped {} oldest undo entries (max depth {})", excess, max);
            }
        }
    }

    /// Undo the sub-commands of a failed top-level command, last to first.
    ///
    /// Keeps going past individual failures so as much as possible is
    /// reverted, and returns one message per sub-command left applied.
    fn roll_back(mut low_level: Vec<Box<dyn Command>>) -> Vec<String> {
        low_level
            .iter_mut()
            .rev()
            .filter_map(|cmd| {
                cmd.undo_command()
                    .err()
                    .map(|e| format!("'{}': {}", cmd.name(), e))
            })
            .collect()
    }

    fn log_stacks(&self) {
        match self.config.debug_mode {
            DebugMode::NoDebug => {}
            DebugMode::Debug => log::debug!("{}", self.content(false)),
            DebugMode::VerboseDebug => log::debug!("{}", self.content(true)),
        }
    }
}
