use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;

use crate::{
    client::{line_client_builder, ClientParams, LineClient, LineClientBuilder},
    error::{BackendUnavailable, ConfigError},
    name::NameHandler,
};

/// Components registered by [`DEFAULT_GATEWAY`](crate::DEFAULT_GATEWAY)'s
/// users. Register before the first stat is emitted, the backend is only
/// resolved once.
pub static DEFAULT_COMPONENTS: LazyLock<Arc<ComponentRegistry>> =
    LazyLock::new(|| Arc::new(ComponentRegistry::new()));

/// Something config can refer to by name.
#[derive(Clone)]
pub enum Component {
    NameHandler(NameHandler),
    LineClient(LineClientBuilder),
}

impl Component {
    fn kind(&self) -> &'static str {
        match self {
            Component::NameHandler(_) => "name handler",
            Component::LineClient(_) => "line client",
        }
    }
}

/// Named, pluggable pieces of the gateway. Config values such as
/// `stat_name_handler` are looked up here, so an unknown name or a name bound
/// to the wrong kind of component is a configuration error.
#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            components: Default::default(),
        }
    }

    /// Register a component, replacing and returning whatever was registered
    /// under `name` before.
    pub fn register(&self, name: impl Into<String>, component: Component) -> Option<Component> {
        let mut components = self.components.write();
        match components.entry(name.into()) {
            Entry::Occupied(mut oe) => Some(oe.insert(component)),
            Entry::Vacant(ve) => {
                ve.insert(component);
                None
            }
        }
    }

    pub fn register_name_handler(&self, name: impl Into<String>, handler: NameHandler) {
        self.register(name, Component::NameHandler(handler));
    }

    pub fn register_line_client<F, C>(&self, name: impl Into<String>, build: F)
    where
        F: Fn(&ClientParams) -> Result<C, BackendUnavailable> + Send + Sync + 'static,
        C: LineClient + 'static,
    {
        self.register(name, Component::LineClient(line_client_builder(build)));
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.components.read().get(name).cloned()
    }

    fn lookup(&self, key: &'static str, name: &str) -> Result<Component, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownComponent {
            key,
            name: name.to_string(),
        })
    }

    pub fn name_handler(&self, key: &'static str, name: &str) -> Result<NameHandler, ConfigError> {
        match self.lookup(key, name)? {
            Component::NameHandler(handler) => Ok(handler),
            other => Err(ConfigError::IncompatibleComponent {
                key,
                name: name.to_string(),
                expected: "name handler",
                found: other.kind(),
            }),
        }
    }

    pub fn line_client(
        &self,
        key: &'static str,
        name: &str,
    ) -> Result<LineClientBuilder, ConfigError> {
        match self.lookup(key, name)? {
            Component::LineClient(builder) => Ok(builder),
            other => Err(ConfigError::IncompatibleComponent {
                key,
                name: name.to_string(),
                expected: "line client",
                found: other.kind(),
            }),
        }
    }
}
