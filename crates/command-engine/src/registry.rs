//! Command registry mapping command names to factories
//!
//! The registry is the only way the manager creates commands by name.
//! Registration is sticky: once a name is known it keeps its first factory,
//! and unregistering is a no-op so previously created commands always have
//! a resolvable name.
//!
//! # Usage
//!
//! ```ignore
//! use command_engine::CommandRegistry;
//!
//! let mut registry = CommandRegistry::new();
//! registry.register::<MoveNodeCommand>("moveNode");
//! let cmd = registry.create_command("moveNode")?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{Command, SharedUserData};
use crate::error::{CommandError, Result};
use crate::events::{CommandEvent, EventSink, Observers};

/// Implementation kind recorded for factories registered from Rust
pub const NATIVE_IMPL: &str = "Rust";

/// Creates fresh command instances for one registered name
pub trait CommandFactory: Send + Sync {
    /// Create a new command, or `None` if the factory cannot produce one
    fn create(&self) -> Option<Box<dyn Command>>;

    /// Name of the command type this factory produces
    fn type_name(&self) -> String;

    /// Opaque data passed to each created command's registration callback
    fn user_data(&self) -> Option<SharedUserData> {
        None
    }
}

/// Factory for any `Default` command type
pub struct DefaultCommandFactory<C> {
    _marker: std::marker::PhantomData<fn() -> C>,
}

impl<C> DefaultCommandFactory<C> {
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<C> Default for DefaultCommandFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Command + Default + 'static> CommandFactory for DefaultCommandFactory<C> {
    fn create(&self) -> Option<Box<dyn Command>> {
        Some(Box::new(C::default()))
    }

    fn type_name(&self) -> String {
        std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Closure-backed factory
///
/// Lets hosts capture shared state (a document handle, a service) in the
/// constructor without writing a factory type.
pub struct FnCommandFactory {
    type_name: String,
    create: Box<dyn Fn() -> Option<Box<dyn Command>> + Send + Sync>,
    user_data: Option<SharedUserData>,
}

impl FnCommandFactory {
    pub fn new(
        type_name: impl Into<String>,
        create: impl Fn() -> Option<Box<dyn Command>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            create: Box::new(create),
            user_data: None,
        }
    }

    /// Attach user data handed to every created command
    pub fn with_user_data(mut self, data: SharedUserData) -> Self {
        self.user_data = Some(data);
        self
    }
}

impl CommandFactory for FnCommandFactory {
    fn create(&self) -> Option<Box<dyn Command>> {
        (self.create)()
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn user_data(&self) -> Option<SharedUserData> {
        self.user_data.clone()
    }
}

/// What the registry knows about a registered name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub type_name: String,
    pub impl_kind: String,
}

struct RegistryEntry {
    spec: CommandSpec,
    factory: Arc<dyn CommandFactory>,
}

/// Registry of command factories keyed by command name
pub struct CommandRegistry {
    entries: BTreeMap<String, RegistryEntry>,
    observers: Observers,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            observers: Observers::default(),
        }
    }

    /// Subscribe to `CommandRegistered` events
    pub fn add_observer(&mut self, sink: Arc<dyn EventSink>) {
        self.observers.add(sink);
    }

    /// Register a native factory under `name`.
    ///
    /// Returns `false` and keeps the existing factory if the name is
    /// already registered.
    pub fn register_factory(&mut self, name: &str, factory: Arc<dyn CommandFactory>) -> bool {
        self.register_factory_with_kind(name, factory, NATIVE_IMPL)
    }

    /// Register a factory with an explicit implementation kind.
    ///
    /// Bridges that create commands implemented in another runtime use
    /// this to tag their entries.
    pub fn register_factory_with_kind(
        &mut self,
        name: &str,
        factory: Arc<dyn CommandFactory>,
        impl_kind: &str,
    ) -> bool {
        if self.is_registered(name) {
            log::debug!("Command '{}' already registered, keeping first factory", name);
            return false;
        }

        let spec = CommandSpec {
            type_name: factory.type_name(),
            impl_kind: impl_kind.to_string(),
        };
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                spec: spec.clone(),
                factory,
            },
        );

        log::debug!(
            "Registered command '{}' (type: {}, implType: {})",
            name,
            spec.type_name,
            spec.impl_kind
        );
        self.observers.emit(CommandEvent::CommandRegistered {
            name: name.to_string(),
            type_name: spec.type_name,
            impl_kind: spec.impl_kind,
        });
        true
    }

    /// Register a `Default` command type
    pub fn register<C: Command + Default + 'static>(&mut self, name: &str) -> bool {
        self.register_factory(name, Arc::new(DefaultCommandFactory::<C>::new()))
    }

    /// Register a closure constructor
    pub fn register_fn<F>(&mut self, name: &str, type_name: &str, create: F) -> bool
    where
        F: Fn() -> Box<dyn Command> + Send + Sync + 'static,
    {
        self.register_factory(
            name,
            Arc::new(FnCommandFactory::new(type_name, move || Some(create()))),
        )
    }

    /// Intentionally does nothing: command names stay resolvable for the
    /// lifetime of the registry.
    pub fn unregister_factory(&mut self, name: &str) {
        log::debug!("Ignoring unregister request for command '{}'", name);
    }

    /// Check if a command name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Type and implementation kind of a registered command
    pub fn command_spec(&self, name: &str) -> Result<&CommandSpec> {
        self.entries
            .get(name)
            .map(|e| &e.spec)
            .ok_or_else(|| CommandError::NotRegistered(name.to_string()))
    }

    /// Create a fresh instance of the command registered under `name`
    pub fn create_command(&self, name: &str) -> Result<Box<dyn Command>> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| CommandError::NotRegistered(name.to_string()))?;

        let mut cmd = entry
            .factory
            .create()
            .ok_or_else(|| CommandError::NullCommand(name.to_string()))?;

        let user_data = entry.factory.user_data();
        cmd.registration_callback(name, user_data.as_deref());
        Ok(cmd)
    }

    /// List all registered command names in sorted order
    pub fn command_names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry content as a string, used for debugging
    pub fn content(&self) -> String {
        let mut res = String::from("--> CommandRegistry:\n");
        for (name, entry) in &self.entries {
            res.push_str(&format!(
                "[{}] type:{}, implType:{}\n",
                name, entry.spec.type_name, entry.spec.impl_kind
            ));
        }
        res
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandBase, CommandContext, UserData};
    use crate::events::VecEventSink;

    #[derive(Default)]
    struct NoopCommand {
        base: CommandBase,
        tag: Option<String>,
    }

    impl Command for NoopCommand {
        fn base(&self) -> &CommandBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut CommandBase {
            &mut self.base
        }

        fn registration_callback(&mut self, name: &str, user_data: Option<&UserData>) {
            self.base.set_name(name);
            self.tag = user_data
                .and_then(|d| d.downcast_ref::<String>())
                .cloned();
        }

        fn do_command(&mut self, _ctx: &mut CommandContext<'_>) -> Result<()> {
            Ok(())
        }

        fn undo_command(&mut self) -> Result<()> {
            Ok(())
        }

        fn redo_command(&mut self) -> Result<()> {
            Ok(())
        }

        fn description(&self) -> String {
            format!("{} [{}]", self.name(), self.tag.as_deref().unwrap_or("-"))
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register::<NoopCommand>("noop"));

        assert!(registry.is_registered("noop"));
        assert!(!registry.is_registered("unknown"));

        let cmd = registry.create_command("noop").unwrap();
        assert_eq!(cmd.name(), "noop");

        let spec = registry.command_spec("noop").unwrap();
        assert_eq!(spec.type_name, "NoopCommand");
        assert_eq!(spec.impl_kind, NATIVE_IMPL);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let sink = Arc::new(VecEventSink::new());
        let mut registry = CommandRegistry::new();
        registry.add_observer(sink.clone());

        assert!(registry.register::<NoopCommand>("noop"));
        assert!(!registry.register_fn("noop", "Other", || Box::new(NoopCommand::default())));

        assert_eq!(registry.command_spec("noop").unwrap().type_name, "NoopCommand");
        assert_eq!(sink.events().len(), 1);
        assert_eq!(
            sink.events()[0],
            CommandEvent::CommandRegistered {
                name: "noop".to_string(),
                type_name: "NoopCommand".to_string(),
                impl_kind: "Rust".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        let registry = CommandRegistry::new();
        let err = registry.create_command("missing").unwrap_err();
        assert!(matches!(err, CommandError::NotRegistered(ref n) if n == "missing"));
        assert!(registry.command_spec("missing").is_err());
    }

    #[test]
    fn test_null_factory() {
        let mut registry = CommandRegistry::new();
        registry.register_factory("broken", Arc::new(FnCommandFactory::new("Broken", || None)));

        let err = registry.create_command("broken").unwrap_err();
        assert!(matches!(err, CommandError::NullCommand(_)));
    }

    #[test]
    fn test_user_data_reaches_command() {
        let mut registry = CommandRegistry::new();
        let factory = FnCommandFactory::new("NoopCommand", || {
            Some(Box::new(NoopCommand::default()) as Box<dyn Command>)
        })
        .with_user_data(Arc::new("graph-1".to_string()));
        registry.register_factory("tagged", Arc::new(factory));

        let cmd = registry.create_command("tagged").unwrap();
        assert_eq!(cmd.description(), "tagged [graph-1]");
    }

    #[test]
    fn test_unregister_is_noop() {
        let mut registry = CommandRegistry::new();
        registry.register::<NoopCommand>("noop");
        registry.unregister_factory("noop");
        assert!(registry.is_registered("noop"));
    }

    #[test]
    fn test_script_kind_and_content() {
        let mut registry = CommandRegistry::new();
        registry.register::<NoopCommand>("b");
        registry.register_factory_with_kind(
            "a",
            Arc::new(FnCommandFactory::new("ScriptCommand", || None)),
            "Python",
        );

        assert_eq!(registry.command_names(), vec!["a", "b"]);
        assert_eq!(
            registry.content(),
            "--> CommandRegistry:\n[a] type:ScriptCommand, implType:Python\n[b] type:NoopCommand, implType:Rust\n"
        );
    }
}
