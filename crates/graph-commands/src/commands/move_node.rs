//! Move Node
//!
//! Drags emit one `moveNode` per mouse event. Hosts pass the same merge id
//! for the whole drag so it collapses into a single undo entry. A move only
//! merges into a move of the same node.

use command_engine::{
    ArgKind, ArgSpec, Command, CommandBase, CommandContext, CommandError, MergeId, Result,
};

use super::BuiltinCommand;
use crate::graph::SharedGraph;

/// Moves a node to an absolute position
///
/// # Arguments
/// - `id` (required) - Node to move
/// - `x`, `y` (required) - New position
pub struct MoveNodeCommand {
    base: CommandBase,
    graph: SharedGraph,
    previous: Option<(f64, f64)>,
}

impl MoveNodeCommand {
    pub const NAME: &'static str = "moveNode";

    pub fn new(graph: SharedGraph) -> Self {
        Self {
            base: CommandBase::new(Self::NAME),
            graph,
            previous: None,
        }
    }

    fn boxed(graph: SharedGraph) -> Box<dyn Command> {
        Box::new(Self::new(graph))
    }
}

inventory::submit!(BuiltinCommand {
    name: MoveNodeCommand::NAME,
    type_name: "MoveNodeCommand",
    create: MoveNodeCommand::boxed,
});

impl Command for MoveNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        vec![
            ArgSpec::required("id", ArgKind::String),
            ArgSpec::required("x", ArgKind::Float),
            ArgSpec::required("y", ArgKind::Float),
        ]
    }

    fn can_merge_with(&self, previous: &dyn Command, _merge_id: MergeId) -> bool {
        previous.name() == self.name() && previous.args().get("id") == self.args().get("id")
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        self.redo_command()
    }

    fn undo_command(&mut self) -> Result<()> {
        let previous = self
            .previous
            .ok_or_else(|| CommandError::failed("moveNode was never done"))?;
        let id = self.args().require(self.name(), "id")?;
        self.graph.lock().move_node(id, previous)?;
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let id = self.args().require(self.name(), "id")?.to_string();
        let x = self.args().require_f64(self.name(), "x")?;
        let y = self.args().require_f64(self.name(), "y")?;
        self.previous = Some(self.graph.lock().move_node(&id, (x, y))?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Move Node {}", self.args().get("id").unwrap_or_default())
    }
}
