//! Remove Node
//!
//! Removing a connected node is expressed as sub-commands: one
//! `disconnect` per connection touching the node, then a `deleteNode`.
//! Undo replays them in reverse, so the node is back before its
//! connections are restored.

use command_engine::{ArgKind, ArgSpec, Command, CommandArgs, CommandBase, CommandContext, Result};

use super::{BuiltinCommand, DeleteNodeCommand, DisconnectCommand};
use crate::graph::SharedGraph;

/// Removes a node together with its connections
///
/// # Arguments
/// - `id` (required) - Node to remove
pub struct RemoveNodeCommand {
    base: CommandBase,
    graph: SharedGraph,
}

impl RemoveNodeCommand {
    pub const NAME: &'static str = "removeNode";

    pub fn new(graph: SharedGraph) -> Self {
        Self {
            base: CommandBase::new(Self::NAME),
            graph,
        }
    }

    fn boxed(graph: SharedGraph) -> Box<dyn Command> {
        Box::new(Self::new(graph))
    }
}

inventory::submit!(BuiltinCommand {
    name: RemoveNodeCommand::NAME,
    type_name: "RemoveNodeCommand",
    create: RemoveNodeCommand::boxed,
});

impl Command for RemoveNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        vec![ArgSpec::required("id", ArgKind::String)]
    }

    fn do_command(&mut self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let id = self.args().require(self.name(), "id")?.to_string();
        let connections = self.graph.lock().connections_of(&id);

        log::debug!(
            "removeNode: '{}' has {} connection(s) to remove first",
            id,
            connections.len()
        );
        for connection in connections {
            ctx.create_command(
                DisconnectCommand::NAME,
                CommandArgs::new()
                    .with("source", &connection.source)
                    .with("target", &connection.target),
            )?;
        }
        ctx.create_command(DeleteNodeCommand::NAME, CommandArgs::new().with("id", &id))
    }

    // Its whole effect lives in the sub-commands.
    fn undo_command(&mut self) -> Result<()> {
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> String {
        format!("Remove Node {}", self.args().get("id").unwrap_or_default())
    }
}
