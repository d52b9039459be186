use std::{fmt::Write, time::Duration};

use cadence::MetricSink;

use super::{bind_udp_sink, keep_sample, negate, ClientParams, PrefixedSink, TaggedClient};
use crate::error::{BackendUnavailable, TransportError};

/// Dogstatsd over UDP. The configured prefix becomes the namespace of every
/// metric.
///
/// Events with a rate below 1 are sampled here and carry `|@rate`, the same
/// as on the plain statsd client.
pub struct DogStatsdUdpClient {
    sink: PrefixedSink,
}

impl DogStatsdUdpClient {
    pub fn connect(params: &ClientParams) -> Result<Self, BackendUnavailable> {
        let sink = bind_udp_sink(params)?;
        tracing::debug!(message = "dogstatsd client ready", host = %params.host, port = params.port);
        Ok(Self::from_sink(&params.prefix, sink))
    }

    pub fn from_sink<S>(namespace: &str, sink: S) -> Self
    where
        S: MetricSink + Send + Sync + 'static,
    {
        Self {
            sink: PrefixedSink::new(namespace, sink),
        }
    }

    /// `namespace.metric:value|type[|@rate][|#tag,...]`
    fn send(
        &self,
        metric: &str,
        value: &str,
        tags: &[&str],
        rate: f64,
    ) -> Result<(), TransportError> {
        if !keep_sample(rate) {
            return Ok(());
        }
        let mut line = String::with_capacity(metric.len() + value.len() + 32);
        self.sink.start_line(&mut line, metric, value);
        if rate < 1.0 {
            // Writing into a String can't fail.
            let _ = write!(line, "|@{rate}");
        }
        if !tags.is_empty() {
            line.push_str("|#");
            line.push_str(&tags.join(","));
        }
        self.sink.emit(&line)
    }
}

impl TaggedClient for DogStatsdUdpClient {
    fn increment(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.send(metric, &format!("{value}|c"), tags, sample_rate)
    }

    fn decrement(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.increment(metric, negate(value)?, tags, sample_rate)
    }

    fn gauge(
        &self,
        metric: &str,
        value: f64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.send(metric, &format!("{value}|g"), tags, sample_rate)
    }

    fn timing(&self, metric: &str, value: Duration, tags: &[&str]) -> Result<(), TransportError> {
        let ms = value.as_micros() as f64 / 1000.0;
        self.send(metric, &format!("{ms}|ms"), tags, 1.0)
    }
}
