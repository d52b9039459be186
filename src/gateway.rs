//! The process-wide entry point. A [`Gateway`] picks one backend the first
//! time it is used and keeps it for the rest of its life.

use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};

use once_cell::sync::OnceCell;

use crate::{
    allow_list::AllowList,
    client::{
        self, line_client_builder, tagged_client_builder, ClientParams, LineClient,
        LineClientBuilder, TaggedClient, TaggedClientBuilder,
    },
    config::{self, keys, ConfigSource, EnvConfig},
    dispatcher::SafeDispatcher,
    error::{BackendUnavailable, ConfigError, Result},
    registry::{ComponentRegistry, DEFAULT_COMPONENTS},
    sink::{DogStatsdSink, NoopSink, StatsSink, StatsdSink},
};

/// Configured from `STATSGATE_*` environment variables, with custom
/// components looked up in [`DEFAULT_COMPONENTS`].
pub static DEFAULT_GATEWAY: LazyLock<Gateway> = LazyLock::new(|| {
    Gateway::builder()
        .config(EnvConfig::new())
        .components(DEFAULT_COMPONENTS.clone())
        .build()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    DogStatsd,
    Statsd,
    Noop,
}

/// Decide which backend the config asks for. The datadog flag takes priority
/// over `statsd_on`; with neither set, stats are dropped.
pub fn select_backend(config: &dyn ConfigSource) -> Result<BackendKind, ConfigError> {
    if config.has_option(keys::DATADOG_ENABLED)
        && config::get_bool(config, keys::DATADOG_ENABLED)? == Some(true)
    {
        return Ok(BackendKind::DogStatsd);
    }
    if config::get_bool(config, keys::STATSD_ON)?.unwrap_or(false) {
        return Ok(BackendKind::Statsd);
    }
    Ok(BackendKind::Noop)
}

enum BuildError {
    Config(ConfigError),
    Unavailable(BackendUnavailable),
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<BackendUnavailable> for BuildError {
    fn from(e: BackendUnavailable) -> Self {
        Self::Unavailable(e)
    }
}

struct Resolved {
    kind: BackendKind,
    dispatcher: SafeDispatcher,
}

/// Lazily resolved stats gateway. Share it by reference or behind an [`Arc`];
/// every clone of the reference sees the same backend.
pub struct Gateway {
    config: Arc<dyn ConfigSource>,
    components: Arc<ComponentRegistry>,
    statsd_client: LineClientBuilder,
    dogstatsd_client: TaggedClientBuilder,
    resolved: OnceCell<Resolved>,
}

impl Gateway {
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// The dispatcher every operation goes through, resolving the backend on
    /// first use. Concurrent first callers block until the one resolution
    /// finishes. A configuration error is returned to whoever triggered the
    /// resolution and nothing is cached, so later calls fail the same way.
    pub fn dispatcher(&self) -> Result<&SafeDispatcher, ConfigError> {
        Ok(&self.resolved()?.dispatcher)
    }

    /// The backend in use. This is [`BackendKind::Noop`] when the configured
    /// backend could not be built.
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        Ok(self.resolved()?.kind)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    fn resolved(&self) -> Result<&Resolved, ConfigError> {
        self.resolved.get_or_try_init(|| self.resolve())
    }

    fn resolve(&self) -> Result<Resolved, ConfigError> {
        let selected = select_backend(&*self.config)?;
        let built = match selected {
            BackendKind::DogStatsd => self.dogstatsd_sink(),
            BackendKind::Statsd => self.statsd_sink(),
            BackendKind::Noop => Ok(Box::new(NoopSink) as Box<dyn StatsSink>),
        };
        let (kind, sink) = match built {
            Ok(sink) => (selected, sink),
            Err(BuildError::Config(e)) => return Err(e),
            Err(BuildError::Unavailable(e)) => {
                tracing::error!(
                    message = "could not configure stats client, using noop sink",
                    backend = ?selected,
                    error = %e
                );
                (BackendKind::Noop, Box::new(NoopSink) as Box<dyn StatsSink>)
            }
        };

        let allow_list = AllowList::new(self.config.get(keys::ALLOW_LIST).as_deref());
        tracing::info!(
            message = "stats backend ready",
            backend = ?kind,
            allow_list = ?allow_list.prefixes()
        );
        Ok(Resolved {
            kind,
            dispatcher: SafeDispatcher::new(
                sink,
                allow_list,
                self.config.clone(),
                self.components.clone(),
            ),
        })
    }

    fn client_params(&self) -> Result<ClientParams, ConfigError> {
        Ok(ClientParams {
            host: self
                .config
                .get(keys::HOST)
                .unwrap_or_else(|| config::DEFAULT_HOST.to_string()),
            port: config::get_port(&*self.config, keys::PORT)?,
            prefix: self.config.get(keys::PREFIX).unwrap_or_default(),
        })
    }

    fn statsd_sink(&self) -> Result<Box<dyn StatsSink>, BuildError> {
        let builder = match self.config.get(keys::CUSTOM_CLIENT_PATH) {
            Some(name) => {
                let builder = self.components.line_client(keys::CUSTOM_CLIENT_PATH, &name)?;
                tracing::info!(message = "loaded custom statsd client", client = %name);
                builder
            }
            None => self.statsd_client.clone(),
        };
        let params = self.client_params()?;
        tracing::debug!(
            message = "building statsd client",
            host = %params.host,
            port = params.port,
            prefix = %params.prefix
        );
        let client = builder(&params)?;
        Ok(Box::new(StatsdSink::new(client)))
    }

    fn dogstatsd_sink(&self) -> Result<Box<dyn StatsSink>, BuildError> {
        let params = self.client_params()?;
        let constant_tags = config::parse_tags(self.config.get(keys::DATADOG_TAGS).as_deref());
        tracing::debug!(
            message = "building dogstatsd client",
            host = %params.host,
            port = params.port,
            namespace = %params.prefix,
            constant_tags = ?constant_tags
        );
        let client = (self.dogstatsd_client)(&params)?;
        Ok(Box::new(DogStatsdSink::new(client, constant_tags)))
    }
}

impl StatsSink for Gateway {
    fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.dispatcher()?.increment(stat, count, rate, tags)
    }

    fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.dispatcher()?.decrement(stat, count, rate, tags)
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool, tags: &[&str]) -> Result<()> {
        self.dispatcher()?.gauge(stat, value, rate, delta, tags)
    }

    fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()> {
        self.dispatcher()?.timing(stat, dt, tags)
    }
}

#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<Arc<dyn ConfigSource>>,
    components: Option<Arc<ComponentRegistry>>,
    statsd_client: Option<LineClientBuilder>,
    dogstatsd_client: Option<TaggedClientBuilder>,
}

impl GatewayBuilder {
    /// Defaults to [`EnvConfig`].
    pub fn config(self, config: impl ConfigSource + 'static) -> Self {
        self.shared_config(Arc::new(config))
    }

    pub fn shared_config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = Some(config);
        self
    }

    /// Where `stat_name_handler` and `statsd_custom_client_path` are looked
    /// up. Defaults to an empty registry.
    pub fn components(mut self, components: Arc<ComponentRegistry>) -> Self {
        self.components = Some(components);
        self
    }

    /// Replace the line client used when no custom client is configured.
    pub fn statsd_client<F, C>(mut self, build: F) -> Self
    where
        F: Fn(&ClientParams) -> Result<C, BackendUnavailable> + Send + Sync + 'static,
        C: LineClient + 'static,
    {
        self.statsd_client = Some(line_client_builder(build));
        self
    }

    pub fn dogstatsd_client<F, C>(mut self, build: F) -> Self
    where
        F: Fn(&ClientParams) -> Result<C, BackendUnavailable> + Send + Sync + 'static,
        C: TaggedClient + 'static,
    {
        self.dogstatsd_client = Some(tagged_client_builder(build));
        self
    }

    pub fn build(self) -> Gateway {
        Gateway {
            config: self
                .config
                .unwrap_or_else(|| Arc::new(EnvConfig::new())),
            components: self.components.unwrap_or_default(),
            statsd_client: self
                .statsd_client
                .unwrap_or_else(|| Arc::new(client::default_line_client)),
            dogstatsd_client: self
                .dogstatsd_client
                .unwrap_or_else(|| Arc::new(client::default_tagged_client)),
            resolved: OnceCell::new(),
        }
    }
}
