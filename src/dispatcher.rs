use std::{sync::Arc, time::Duration};

use crate::{
    allow_list::AllowList,
    config::{keys, ConfigSource},
    error::Result,
    name::validate_stat_name,
    registry::ComponentRegistry,
    sink::StatsSink,
};

/// Validates and filters every stat before it reaches the backend sink.
///
/// Each call goes through the same steps:
/// 1. resolve the name handler from `stat_name_handler` (read on every call,
///    so changing the config takes effect immediately),
/// 2. run it over the name; invalid names are logged at ERROR and dropped,
/// 3. drop, without logging, names the allow list doesn't cover,
/// 4. forward to the sink and hand back its result.
///
/// Only name errors are swallowed. Sink errors and config errors from
/// resolving the handler are returned as is.
pub struct SafeDispatcher {
    sink: Box<dyn StatsSink>,
    allow_list: AllowList,
    config: Arc<dyn ConfigSource>,
    components: Arc<ComponentRegistry>,
}

impl SafeDispatcher {
    pub fn new(
        sink: Box<dyn StatsSink>,
        allow_list: AllowList,
        config: Arc<dyn ConfigSource>,
        components: Arc<ComponentRegistry>,
    ) -> Self {
        Self {
            sink,
            allow_list,
            config,
            components,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    fn dispatch<F>(&self, stat: &str, emit: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<()>,
    {
        let handler = match self.config.get(keys::NAME_HANDLER) {
            Some(name) => Some(self.components.name_handler(keys::NAME_HANDLER, &name)?),
            None => None,
        };
        let validated = match &handler {
            Some(handler) => handler(stat),
            None => validate_stat_name(stat),
        };
        let name = match validated {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(message = "invalid stat name", stat = stat, error = %e);
                return Ok(());
            }
        };
        if !self.allow_list.test(&name) {
            return Ok(());
        }
        emit(&name)
    }
}

impl StatsSink for SafeDispatcher {
    fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.dispatch(stat, |stat| self.sink.increment(stat, count, rate, tags))
    }

    fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.dispatch(stat, |stat| self.sink.decrement(stat, count, rate, tags))
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool, tags: &[&str]) -> Result<()> {
        self.dispatch(stat, |stat| {
            self.sink.gauge(stat, value, rate, delta, tags)
        })
    }

    fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()> {
        self.dispatch(stat, |stat| self.sink.timing(stat, dt, tags))
    }
}
