//! Add Node / Delete Node
//!
//! `addNode` creates a node; `deleteNode` removes a node that has no
//! connections left. Both store the node so undo can put it back.

use command_engine::{
    ArgKind, ArgSpec, Command, CommandBase, CommandContext, CommandError, Result,
};

use super::BuiltinCommand;
use crate::graph::{GraphNode, SharedGraph};

/// Adds a node to the graph
///
/// # Arguments
/// - `id` (required) - Node identifier, unique in the graph
/// - `nodeType` (required) - Node type string
/// - `x`, `y` (optional) - Position, defaults to the origin
/// - `data` (optional) - Initial JSON data
pub struct AddNodeCommand {
    base: CommandBase,
    graph: SharedGraph,
    node: Option<GraphNode>,
}

impl AddNodeCommand {
    pub const NAME: &'static str = "addNode";

    pub fn new(graph: SharedGraph) -> Self {
        Self {
            base: CommandBase::new(Self::NAME),
            graph,
            node: None,
        }
    }

    fn boxed(graph: SharedGraph) -> Box<dyn Command> {
        Box::new(Self::new(graph))
    }

    fn build_node(&self) -> Result<GraphNode> {
        let args = self.args();
        let coord = |key: &str| -> Result<f64> {
            if args.contains(key) {
                args.require_f64(self.name(), key)
            } else {
                Ok(0.0)
            }
        };
        let data = if args.contains("data") {
            args.require_json(self.name(), "data")?
        } else {
            serde_json::Value::Null
        };

        Ok(GraphNode {
            id: args.require(self.name(), "id")?.to_string(),
            node_type: args.require(self.name(), "nodeType")?.to_string(),
            position: (coord("x")?, coord("y")?),
            data,
        })
    }
}

inventory::submit!(BuiltinCommand {
    name: AddNodeCommand::NAME,
    type_name: "AddNodeCommand",
    create: AddNodeCommand::boxed,
});

impl Command for AddNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        vec![
            ArgSpec::required("id", ArgKind::String).describe("Node identifier"),
            ArgSpec::required("nodeType", ArgKind::String).describe("Node type"),
            ArgSpec::optional("x", ArgKind::Float),
            ArgSpec::optional("y", ArgKind::Float),
            ArgSpec::optional("data", ArgKind::Json).describe("Initial node data"),
        ]
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        let node = self.build_node()?;
        self.graph.lock().insert_node(node.clone())?;
        log::debug!("addNode: added '{}' ({})", node.id, node.node_type);
        self.node = Some(node);
        Ok(())
    }

    fn undo_command(&mut self) -> Result<()> {
        let node = self
            .node
            .as_ref()
            .ok_or_else(|| CommandError::failed("addNode was never done"))?;
        self.graph.lock().remove_node(&node.id)?;
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let node = self
            .node
            .clone()
            .ok_or_else(|| CommandError::failed("addNode was never done"))?;
        self.graph.lock().insert_node(node)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add Node {}", self.args().get("id").unwrap_or_default())
    }
}

/// Deletes a node that has no connections
///
/// # Arguments
/// - `id` (required) - Node to delete
pub struct DeleteNodeCommand {
    base: CommandBase,
    graph: SharedGraph,
    removed: Option<GraphNode>,
}

impl DeleteNodeCommand {
    pub const NAME: &'static str = "deleteNode";

    pub fn new(graph: SharedGraph) -> Self {
        Self {
            base: CommandBase::new(Self::NAME),
            graph,
            removed: None,
        }
    }

    fn boxed(graph: SharedGraph) -> Box<dyn Command> {
        Box::new(Self::new(graph))
    }
}

inventory::submit!(BuiltinCommand {
    name: DeleteNodeCommand::NAME,
    type_name: "DeleteNodeCommand",
    create: DeleteNodeCommand::boxed,
});

impl Command for DeleteNodeCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        vec![ArgSpec::required("id", ArgKind::String)]
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        self.redo_command()
    }

    fn undo_command(&mut self) -> Result<()> {
        let node = self
            .removed
            .take()
            .ok_or_else(|| CommandError::failed("deleteNode was never done"))?;
        if let Err(e) = self.graph.lock().insert_node(node.clone()) {
            self.removed = Some(node);
            return Err(e.into());
        }
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let id = self.args().require(self.name(), "id")?.to_string();
        self.removed = Some(self.graph.lock().remove_node(&id)?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Delete Node {}", self.args().get("id").unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::shared_graph;
    use crate::test_support::manager_for;
    use command_engine::CommandArgs;

    #[test]
    fn test_add_node_with_defaults() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);

        manager
            .create_command(
                "addNode",
                CommandArgs::new().with("id", "a").with("nodeType", "text-input"),
                true,
                None,
            )
            .unwrap();

        let doc = graph.lock();
        let node = doc.node("a").unwrap();
        assert_eq!(node.node_type, "text-input");
        assert_eq!(node.position, (0.0, 0.0));
        assert_eq!(node.data, serde_json::Value::Null);
    }

    #[test]
    fn test_add_undo_redo() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);

        manager
            .create_command(
                "addNode",
                CommandArgs::new()
                    .with("id", "a")
                    .with("nodeType", "llm")
                    .with("x", 10)
                    .with("data", r#"{"model": "small"}"#),
                true,
                None,
            )
            .unwrap();
        assert_eq!(graph.lock().node("a").unwrap().data["model"], "small");

        manager.undo_command().unwrap();
        assert!(graph.lock().node("a").is_none());

        manager.redo_command().unwrap();
        assert_eq!(graph.lock().node("a").unwrap().position, (10.0, 0.0));
    }

    #[test]
    fn test_duplicate_id_fails_cleanly() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);
        let args = CommandArgs::new().with("id", "a").with("nodeType", "llm");

        manager.create_command("addNode", args.clone(), true, None).unwrap();
        let err = manager.create_command("addNode", args, true, None).err().unwrap();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_delete_node() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);
        manager
            .create_command(
                "addNode",
                CommandArgs::new().with("id", "a").with("nodeType", "llm"),
                true,
                None,
            )
            .unwrap();

        manager
            .create_command("deleteNode", CommandArgs::new().with("id", "a"), true, None)
            .unwrap();
        assert_eq!(graph.lock().node_count(), 0);

        manager.undo_command().unwrap();
        assert!(graph.lock().node("a").is_some());
    }
}
