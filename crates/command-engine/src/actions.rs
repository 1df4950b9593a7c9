//! Action registry: which named actions exist and which shortcuts they use
//!
//! The same action (e.g. "graph.deleteSelection") may be instantiated by
//! several views at once. Each instance registers itself under the action
//! name; the name stays registered until its last instance unregisters.
//! Shortcuts are stored per name and shared by every instance, so changing
//! them once updates all of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::events::{CommandEvent, EventSink, Observers};

/// A key sequence in portable text form, e.g. `"Ctrl+Z"`
pub type Shortcut = String;

#[derive(Debug, Clone, Default)]
struct ActionEntry {
    registrations: usize,
    shortcuts: Vec<Shortcut>,
}

/// Registry of named actions and their shortcuts
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, ActionEntry>,
    observers: Observers,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to action (un)registration events
    pub fn add_observer(&mut self, sink: Arc<dyn EventSink>) {
        self.observers.add(sink);
    }

    /// Register one instance of `name`.
    ///
    /// The first registration sets the shortcuts; later ones adopt the
    /// shortcuts already stored for the name.
    pub fn register_action(&mut self, name: &str, shortcuts: Vec<Shortcut>) {
        let entry = self.actions.entry(name.to_string()).or_default();
        entry.registrations += 1;
        if entry.registrations > 1 {
            return;
        }
        entry.shortcuts = shortcuts.clone();

        for shortcut in &shortcuts {
            let users = self.is_shortcut_used(shortcut);
            if users.len() > 1 {
                log::warn!("Shortcut '{}' is shared by actions {:?}", shortcut, users);
            }
        }
        self.observers.emit(CommandEvent::ActionRegistered {
            name: name.to_string(),
        });
    }

    /// Remove one instance of `name`. The name is unregistered when its
    /// last instance goes away.
    pub fn unregister_action(&mut self, name: &str) {
        let Some(entry) = self.actions.get_mut(name) else {
            log::debug!("Action '{}' is not registered", name);
            return;
        };

        entry.registrations = entry.registrations.saturating_sub(1);
        if entry.registrations == 0 {
            self.actions.remove(name);
            self.observers.emit(CommandEvent::ActionUnregistered {
                name: name.to_string(),
            });
        }
    }

    pub fn is_action_registered(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Number of live instances registered under `name`
    pub fn registration_count(&self, name: &str) -> usize {
        self.actions.get(name).map(|e| e.registrations).unwrap_or(0)
    }

    /// Names of the actions bound to `shortcut`
    pub fn is_shortcut_used(&self, shortcut: &str) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|(_, e)| e.shortcuts.iter().any(|s| s == shortcut))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Replace the shortcuts of every instance of `name`.
    ///
    /// Returns false if the action is not registered.
    pub fn set_shortcuts(&mut self, name: &str, shortcuts: Vec<Shortcut>) -> bool {
        match self.actions.get_mut(name) {
            Some(entry) => {
                entry.shortcuts = shortcuts;
                true
            }
            None => false,
        }
    }

    /// Shortcuts of `name`, empty if the action is not registered
    pub fn shortcuts(&self, name: &str) -> &[Shortcut] {
        self.actions
            .get(name)
            .map(|e| e.shortcuts.as_slice())
            .unwrap_or(&[])
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(|s| s.as_str()).collect()
    }

    /// Actions and their shortcuts as a string, used for debugging
    pub fn content(&self) -> String {
        let mut res = String::from("--> ActionRegistry:\n");
        for (name, entry) in &self.actions {
            res.push_str(&format!(
                "[{}] count:{}, shortcuts:[{}]\n",
                name,
                entry.registrations,
                entry.shortcuts.join(", ")
            ));
        }
        res
    }
}
