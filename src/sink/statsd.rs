use std::time::Duration;

use super::StatsSink;
use crate::{
    client::LineClient,
    error::{Error, Result},
};

/// Plain statsd backend. The line protocol has no tags, so any passed in are
/// dropped.
pub struct StatsdSink {
    client: Box<dyn LineClient>,
}

impl StatsdSink {
    pub fn new(client: Box<dyn LineClient>) -> Self {
        Self { client }
    }
}

impl StatsSink for StatsdSink {
    fn increment(&self, stat: &str, count: i64, rate: f64, _tags: &[&str]) -> Result<()> {
        self.client.incr(stat, count, rate).map_err(Error::Transport)
    }

    fn decrement(&self, stat: &str, count: i64, rate: f64, _tags: &[&str]) -> Result<()> {
        self.client.decr(stat, count, rate).map_err(Error::Transport)
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool, _tags: &[&str]) -> Result<()> {
        self.client
            .gauge(stat, value, rate, delta)
            .map_err(Error::Transport)
    }

    fn timing(&self, stat: &str, dt: Duration, _tags: &[&str]) -> Result<()> {
        self.client.timing(stat, dt).map_err(Error::Transport)
    }
}
