use std::time::Duration;

use smallvec::SmallVec;

use super::StatsSink;
use crate::{
    client::TaggedClient,
    error::{Error, Result},
};

/// Dogstatsd backend. Every event carries the caller's tags followed by the
/// constant tags this sink was built with.
pub struct DogStatsdSink {
    client: Box<dyn TaggedClient>,
    constant_tags: Vec<String>,
}

impl DogStatsdSink {
    pub fn new(client: Box<dyn TaggedClient>, constant_tags: Vec<String>) -> Self {
        Self {
            client,
            constant_tags,
        }
    }

    pub fn constant_tags(&self) -> &[String] {
        &self.constant_tags
    }

    fn merge_tags<'a>(&'a self, tags: &[&'a str]) -> SmallVec<[&'a str; 8]> {
        tags.iter()
            .copied()
            .chain(self.constant_tags.iter().map(String::as_str))
            .collect()
    }
}

impl StatsSink for DogStatsdSink {
    fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.client
            .increment(stat, count, &self.merge_tags(tags), rate)
            .map_err(Error::Transport)
    }

    fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.client
            .decrement(stat, count, &self.merge_tags(tags), rate)
            .map_err(Error::Transport)
    }

    /// Dogstatsd has no delta gauges, `delta` is ignored.
    fn gauge(&self, stat: &str, value: f64, rate: f64, _delta: bool, tags: &[&str]) -> Result<()> {
        self.client
            .gauge(stat, value, &self.merge_tags(tags), rate)
            .map_err(Error::Transport)
    }

    fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()> {
        self.client
            .timing(stat, dt, &self.merge_tags(tags))
            .map_err(Error::Transport)
    }
}
