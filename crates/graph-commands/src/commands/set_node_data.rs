//! Set Node Data

use command_engine::{
    ArgKind, ArgSpec, Command, CommandBase, CommandContext, CommandError, Result,
};

use super::BuiltinCommand;
use crate::graph::SharedGraph;

/// Replaces a node's JSON data
pub struct SetNodeDataCommand {
    base: CommandBase,
    graph: SharedGraph,
    previous: Option<serde_json::Value>,
}

impl SetNodeDataCommand {
    pub const NAME: &'static str = "setNodeData";

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
    name: SetNodeDataCommand::NAME,
    type_name: "SetNodeDataCommand",
    create: SetNodeDataCommand::boxed,
});

impl Command for SetNodeDataCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        vec![
            ArgSpec::required("id", ArgKind::String),
            ArgSpec::required("data", ArgKind::Json),
        ]
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        self.redo_command()
    }

    fn undo_command(&mut self) -> Result<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| CommandError::failed("setNodeData was never done"))?;
        let id = self.args().require(self.name(), "id")?.to_string();
        self.graph.lock().set_node_data(&id, previous)?;
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let id = self.args().require(self.name(), "id")?.to_string();
        let data = self.args().require_json(self.name(), "data")?;
        self.previous = Some(self.graph.lock().set_node_data(&id, data)?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Set Data {}", self.args().get("id").unwrap_or_default())
    }
}
