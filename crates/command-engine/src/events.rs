//! Notifications emitted by the command system
//!
//! Events are sent from the manager and the registries to any observer
//! (typically a UI layer refreshing its history or menu views). Dispatch is
//! synchronous and happens on the caller's thread.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::args::CommandArgs;

/// Trait for receiving command events
///
/// This abstracts over the transport (direct callback, channel, log, ...)
/// so the manager does not depend on any UI toolkit.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: CommandEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted by the command system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandEvent {
    /// A top-level command was done successfully
    #[serde(rename_all = "camelCase")]
    CommandDone {
        name: String,
        args: CommandArgs,
        /// False for commands that cannot be undone
        added_to_stack: bool,
        /// True when the command replaced the top entry through merging
        replaced: bool,
    },

    /// The top undo entry was undone
    #[serde(rename_all = "camelCase")]
    CommandUndone { name: String },

    /// The top redo entry was redone
    #[serde(rename_all = "camelCase")]
    CommandRedone { name: String },

    /// Both stacks were cleared
    Cleared,

    /// A command factory was registered
    #[serde(rename_all = "camelCase")]
    CommandRegistered {
        name: String,
        type_name: String,
        impl_kind: String,
    },

    /// An action name was registered for the first time
    #[serde(rename_all = "camelCase")]
    ActionRegistered { name: String },

    /// The last registration of an action name was removed
    #[serde(rename_all = "camelCase")]
    ActionUnregistered { name: String },
}

/// Fan-out list of sinks
#[derive(Clone, Default)]
pub(crate) struct Observers {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Observers {
    pub(crate) fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Deliver to every sink. A failing sink does not stop the others.
    pub(crate) fn emit(&self, event: CommandEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event.clone()) {
                log::warn!("Dropped {:?}: {}", event, e);
            }
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: CommandEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<CommandEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<CommandEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: CommandEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
