//! Built-in graph commands
//!
//! Every command type submits a [`BuiltinCommand`] descriptor through
//! `inventory`; [`register_builtins`] installs all of them into a
//! registry, each bound to the same shared graph.

mod add_node;
mod connect;
mod move_node;
mod remove_node;
mod set_node_data;

pub use add_node::{AddNodeCommand, DeleteNodeCommand};
pub use connect::{ConnectCommand, DisconnectCommand};
pub use move_node::MoveNodeCommand;
pub use remove_node::RemoveNodeCommand;
pub use set_node_data::SetNodeDataCommand;

use std::sync::Arc;

use command_engine::{Command, CommandRegistry, FnCommandFactory};

use crate::graph::SharedGraph;

/// Link-time descriptor of a built-in command
pub struct BuiltinCommand {
    /// Name the command is registered under
    pub name: &'static str,
    /// Rust type behind the name, reported in registry listings
    pub type_name: &'static str,
    /// Constructor binding a fresh command to the graph
    pub create: fn(SharedGraph) -> Box<dyn Command>,
}

inventory::collect!(BuiltinCommand);

/// Register every built-in command, bound to `graph`.
///
/// Returns the number of newly registered names; names already present in
/// the registry keep their existing factory.
pub fn register_builtins(registry: &mut CommandRegistry, graph: &SharedGraph) -> usize {
    let mut registered = 0;
    for builtin in inventory::iter::<BuiltinCommand> {
        let graph = graph.clone();
        let create = builtin.create;
        let factory = FnCommandFactory::new(builtin.type_name, move || Some(create(graph.clone())));
        if registry.register_factory(builtin.name, Arc::new(factory)) {
            registered += 1;
        }
    }
    log::debug!("Registered {} built-in graph commands", registered);
    registered
}
