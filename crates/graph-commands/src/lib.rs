//! Graph Commands
//!
//! Undoable editing commands for the node graph document, built on
//! `command-engine`. Each command type registers itself at link time;
//! hosts get a ready manager from [`command_manager`].
//!
//! # Commands
//!
//! - **addNode** / **deleteNode**: create or delete a single node
//! - **removeNode**: disconnect a node, then delete it (via sub-commands)
//! - **moveNode**: reposition a node; mergeable for drags
//! - **connect** / **disconnect**: edit connections between ports
//! - **setNodeData**: replace a node's JSON data

pub mod commands;
pub mod graph;

pub use commands::*;
pub use graph::{
    shared_graph, Connection, Endpoint, GraphDocument, GraphError, GraphNode, NodeId, SharedGraph,
};

use command_engine::{CommandManager, CommandRegistry, ManagerConfig};

/// Build a manager whose registry holds every built-in command bound to `graph`
pub fn command_manager(graph: &SharedGraph, config: ManagerConfig) -> command_engine::Result<CommandManager> {
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry, graph);
    CommandManager::with_config(registry, config)
}
