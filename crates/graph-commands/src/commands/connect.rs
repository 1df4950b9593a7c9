//! Connect / Disconnect

use command_engine::{ArgKind, ArgSpec, Command, CommandBase, CommandContext, Result};

use super::BuiltinCommand;
use crate::graph::{Connection, SharedGraph};

fn connection_specs() -> Vec<ArgSpec> {
    vec![
        ArgSpec::required("source", ArgKind::String).describe("Output endpoint, 'node.port'"),
        ArgSpec::required("target", ArgKind::String).describe("Input endpoint, 'node.port'"),
    ]
}

fn connection_arg(cmd: &dyn Command) -> Result<Connection> {
    let source = cmd.args().require(cmd.name(), "source")?;
    let target = cmd.args().require(cmd.name(), "target")?;
    Ok(Connection::parse(source, target)?)
}

/// Connects an output port to an input port
pub struct ConnectCommand {
    base: CommandBase,
    graph: SharedGraph,
}

impl ConnectCommand {
    pub const NAME: &'static str = "connect";

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
    name: ConnectCommand::NAME,
    type_name: "ConnectCommand",
    create: ConnectCommand::boxed,
});

impl Command for ConnectCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        connection_specs()
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        self.redo_command()
    }

    fn undo_command(&mut self) -> Result<()> {
        let connection = connection_arg(&*self)?;
        self.graph.lock().disconnect(&connection)?;
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let connection = connection_arg(&*self)?;
        self.graph.lock().connect(connection)?;
        Ok(())
    }

    fn description(&self) -> String {
        match connection_arg(self) {
            Ok(c) => format!("Connect {}", c),
            Err(_) => "Connect".to_string(),
        }
    }
}

/// Removes a connection
pub struct DisconnectCommand {
    base: CommandBase,
    graph: SharedGraph,
}

impl DisconnectCommand {
    pub const NAME: &'static str = "disconnect";

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
    name: DisconnectCommand::NAME,
    type_name: "DisconnectCommand",
    create: DisconnectCommand::boxed,
});

impl Command for DisconnectCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn arg_specs(&self) -> Vec<ArgSpec> {
        connection_specs()
    }

    fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
        self.redo_command()
    }

    fn undo_command(&mut self) -> Result<()> {
        let connection = connection_arg(&*self)?;
        self.graph.lock().connect(connection)?;
        Ok(())
    }

    fn redo_command(&mut self) -> Result<()> {
        let connection = connection_arg(&*self)?;
        self.graph.lock().disconnect(&connection)?;
        Ok(())
    }

    fn description(&self) -> String {
        match connection_arg(self) {
            Ok(c) => format!("Disconnect {}", c),
            Err(_) => "Disconnect".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{shared_graph, Connection};
    use crate::test_support::{add_node, manager_for};
    use command_engine::{CommandArgs, CommandError};

    fn link(source: &str, target: &str) -> CommandArgs {
        CommandArgs::new().with("source", source).with("target", target)
    }

    #[test]
    fn test_connect_and_undo() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);
        add_node(&mut manager, "a");
        add_node(&mut manager, "b");

        manager
            .create_command("connect", link("a.out", "b.in"), true, None)
            .unwrap();
        assert_eq!(
            graph.lock().connections(),
            &[Connection::parse("a.out", "b.in").unwrap()]
        );

        manager.undo_command().unwrap();
        assert!(graph.lock().connections().is_empty());
    }

    #[test]
    fn test_malformed_endpoint() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);
        add_node(&mut manager, "a");

        let err = manager
            .create_command("connect", link("a", "b.in"), true, None)
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::DoFailed { .. }));
        assert!(err.to_string().contains("Invalid endpoint 'a'"));
    }

    #[test]
    fn test_disconnect_missing_connection() {
        let graph = shared_graph("g");
        let mut manager = manager_for(&graph);
        add_node(&mut manager, "a");
        add_node(&mut manager, "b");

        let result = manager.create_command("disconnect", link("a.out", "b.in"), true, None);
        assert!(result.is_err());
        assert_eq!(manager.count(), 2);
    }
}
