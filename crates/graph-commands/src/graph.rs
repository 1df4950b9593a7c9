//! In-memory node graph edited by the built-in commands
//!
//! The document is deliberately dumb: every mutation is a single checked
//! step returning what it replaced, so commands can store it and put it
//! back on undo.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use command_engine::CommandError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a node
pub type NodeId = String;

/// Graph handle shared between the host and the commands it creates
pub type SharedGraph = Arc<Mutex<GraphDocument>>;

/// Create an empty shared graph
pub fn shared_graph(name: impl Into<String>) -> SharedGraph {
    Arc::new(Mutex::new(GraphDocument::new(name)))
}

/// Errors raised by document mutations
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Node '{0}' already exists")]
    NodeExists(NodeId),

    #[error("Node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("Node '{0}' still has connections")]
    NodeStillConnected(NodeId),

    #[error("Connection {0} already exists")]
    ConnectionExists(Connection),

    #[error("Connection {0} not found")]
    ConnectionNotFound(Connection),

    #[error("Invalid endpoint '{0}', expected 'node.port'")]
    InvalidEndpoint(String),
}

impl From<GraphError> for CommandError {
    fn from(err: GraphError) -> Self {
        CommandError::failed(err.to_string())
    }
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub node_type: String,
    pub position: (f64, f64),
    pub data: serde_json::Value,
}

/// One side of a connection: a port on a node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: String,
}

impl FromStr for Endpoint {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((node, port)) if !node.is_empty() && !port.is_empty() => Ok(Self {
                node: node.to_string(),
                port: port.to_string(),
            }),
            _ => Err(GraphError::InvalidEndpoint(s.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

/// Directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Connection {
    /// Parse a connection from its two `node.port` endpoints
    pub fn parse(source: &str, target: &str) -> Result<Self, GraphError> {
        Ok(Self {
            source: source.parse()?,
            target: target.parse()?,
        })
    }

    pub fn touches(&self, node: &str) -> bool {
        self.source.node == node || self.target.node == node
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// The editable graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub name: String,
    nodes: BTreeMap<NodeId, GraphNode>,
    connections: Vec<Connection>,
}

impl GraphDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections with `node` on either side
    pub fn connections_of(&self, node: &str) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.touches(node))
            .cloned()
            .collect()
    }

    pub fn insert_node(&mut self, node: GraphNode) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::NodeExists(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove an unconnected node
    pub fn remove_node(&mut self, id: &str) -> Result<GraphNode, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        if self.connections.iter().any(|c| c.touches(id)) {
            return Err(GraphError::NodeStillConnected(id.to_string()));
        }
        self.nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Move a node, returning its previous position
    pub fn move_node(&mut self, id: &str, position: (f64, f64)) -> Result<(f64, f64), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut node.position, position))
    }

    /// Replace a node's data, returning the previous data
    pub fn set_node_data(
        &mut self,
        id: &str,
        data: serde_json::Value,
    ) -> Result<serde_json::Value, GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut node.data, data))
    }

    pub fn connect(&mut self, connection: Connection) -> Result<(), GraphError> {
        for node in [&connection.source.node, &connection.target.node] {
            if !self.nodes.contains_key(node) {
                return Err(GraphError::NodeNotFound(node.clone()));
            }
        }
        if self.connections.contains(&connection) {
            return Err(GraphError::ConnectionExists(connection));
        }
        self.connections.push(connection);
        Ok(())
    }

    pub fn disconnect(&mut self, connection: &Connection) -> Result<(), GraphError> {
        let index = self
            .connections
            .iter()
            .position(|c| c == connection)
            .ok_or_else(|| GraphError::ConnectionNotFound(connection.clone()))?;
        self.connections.remove(index);
        Ok(())
    }
}
