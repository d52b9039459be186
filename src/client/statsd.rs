use std::{fmt::Write, time::Duration};

use cadence::MetricSink;

use super::{bind_udp_sink, keep_sample, negate, ClientParams, LineClient, PrefixedSink};
use crate::error::{BackendUnavailable, TransportError};

/// Plain statsd over UDP. Lines are rendered here and handed to a cadence
/// sink, since cadence has no notion of delta gauges.
pub struct StatsdUdpClient {
    sink: PrefixedSink,
}

impl StatsdUdpClient {
    /// Bind an ephemeral socket and resolve `host:port` once, up front.
    pub fn connect(params: &ClientParams) -> Result<Self, BackendUnavailable> {
        let sink = bind_udp_sink(params)?;
        tracing::debug!(message = "statsd client ready", host = %params.host, port = params.port);
        Ok(Self::from_sink(&params.prefix, sink))
    }

    pub fn from_sink<S>(prefix: &str, sink: S) -> Self
    where
        S: MetricSink + Send + Sync + 'static,
    {
        Self {
            sink: PrefixedSink::new(prefix, sink),
        }
    }

    fn render(&self, out: &mut String, stat: &str, value: &str, rate: f64) {
        self.sink.start_line(out, stat, value);
        if rate < 1.0 {
            // Writing into a String can't fail.
            let _ = write!(out, "|@{rate}");
        }
    }

    fn send(&self, stat: &str, value: &str, rate: f64) -> Result<(), TransportError> {
        if !keep_sample(rate) {
            return Ok(());
        }
        let mut line = String::with_capacity(stat.len() + value.len() + 16);
        self.render(&mut line, stat, value, rate);
        self.sink.emit(&line)
    }
}

impl LineClient for StatsdUdpClient {
    fn incr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError> {
        self.send(stat, &format!("{count}|c"), rate)
    }

    fn decr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError> {
        self.incr(stat, negate(count)?, rate)
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool) -> Result<(), TransportError> {
        // -0.0 would otherwise render as "-0", which reads as a delta.
        let value = if value == 0.0 { 0.0 } else { value };
        if value < 0.0 && !delta {
            if !keep_sample(rate) {
                return Ok(());
            }
            // A bare negative value would be read as a delta. Reset to zero
            // and then apply it, in one datagram.
            let mut lines = String::new();
            self.render(&mut lines, stat, "0|g", 1.0);
            lines.push('\n');
            self.render(&mut lines, stat, &format!("{value}|g"), 1.0);
            return self.sink.emit(&lines);
        }
        let sign = if delta && value.is_sign_positive() { "+" } else { "" };
        self.send(stat, &format!("{sign}{value}|g"), rate)
    }

    fn timing(&self, stat: &str, dt: Duration) -> Result<(), TransportError> {
        let ms = dt.as_secs_f64() * 1000.0;
        self.send(stat, &format!("{ms:.6}|ms"), 1.0)
    }
}
