//! Wire clients. The gateway only talks to these traits; how (or whether)
//! anything reaches the network is up to the implementation.

use std::{sync::Arc, time::Duration};

use crate::error::{BackendUnavailable, TransportError};

#[cfg(feature = "udp")]
mod dogstatsd;
#[cfg(feature = "udp")]
mod statsd;

#[cfg(feature = "udp")]
pub use dogstatsd::DogStatsdUdpClient;
#[cfg(feature = "udp")]
pub use statsd::StatsdUdpClient;

/// The minimal statsd line protocol client.
pub trait LineClient: Send + Sync {
    fn incr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError>;

    fn decr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError>;

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool) -> Result<(), TransportError>;

    fn timing(&self, stat: &str, dt: Duration) -> Result<(), TransportError>;
}

/// A dogstatsd style client that understands tags.
pub trait TaggedClient: Send + Sync {
    fn increment(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError>;

    fn decrement(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError>;

    fn gauge(
        &self,
        metric: &str,
        value: f64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError>;

    fn timing(&self, metric: &str, value: Duration, tags: &[&str]) -> Result<(), TransportError>;
}

/// Connection parameters handed to client constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientParams {
    pub host: String,
    pub port: u16,
    /// Prepended to every stat name (the dogstatsd namespace).
    pub prefix: String,
}

/// Anything that can be built from host, port and prefix is a usable line
/// client. Custom clients are registered as one of these.
pub type LineClientBuilder =
    Arc<dyn Fn(&ClientParams) -> Result<Box<dyn LineClient>, BackendUnavailable> + Send + Sync>;

pub type TaggedClientBuilder =
    Arc<dyn Fn(&ClientParams) -> Result<Box<dyn TaggedClient>, BackendUnavailable> + Send + Sync>;

/// Box up a typed constructor as a [`LineClientBuilder`].
pub fn line_client_builder<F, C>(build: F) -> LineClientBuilder
where
    F: Fn(&ClientParams) -> Result<C, BackendUnavailable> + Send + Sync + 'static,
    C: LineClient + 'static,
{
    Arc::new(
        move |params: &ClientParams| -> Result<Box<dyn LineClient>, BackendUnavailable> {
            Ok(Box::new(build(params)?))
        },
    )
}

pub fn tagged_client_builder<F, C>(build: F) -> TaggedClientBuilder
where
    F: Fn(&ClientParams) -> Result<C, BackendUnavailable> + Send + Sync + 'static,
    C: TaggedClient + 'static,
{
    Arc::new(
        move |params: &ClientParams| -> Result<Box<dyn TaggedClient>, BackendUnavailable> {
            Ok(Box::new(build(params)?))
        },
    )
}

/// The built-in statsd client, or [`BackendUnavailable::FeatureDisabled`]
/// when the crate was compiled without `udp`.
pub fn default_line_client(params: &ClientParams) -> Result<Box<dyn LineClient>, BackendUnavailable> {
    #[cfg(feature = "udp")]
    {
        Ok(Box::new(StatsdUdpClient::connect(params)?))
    }
    #[cfg(not(feature = "udp"))]
    {
        let _ = params;
        Err(BackendUnavailable::FeatureDisabled("udp"))
    }
}

pub fn default_tagged_client(
    params: &ClientParams,
) -> Result<Box<dyn TaggedClient>, BackendUnavailable> {
    #[cfg(feature = "udp")]
    {
        Ok(Box::new(DogStatsdUdpClient::connect(params)?))
    }
    #[cfg(not(feature = "udp"))]
    {
        let _ = params;
        Err(BackendUnavailable::FeatureDisabled("udp"))
    }
}

#[cfg(feature = "udp")]
pub(crate) fn bind_udp_sink(
    params: &ClientParams,
) -> Result<cadence::UdpMetricSink, BackendUnavailable> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").map_err(BackendUnavailable::Bind)?;
    socket
        .set_nonblocking(true)
        .map_err(BackendUnavailable::Bind)?;
    cadence::UdpMetricSink::from((params.host.as_str(), params.port), socket).map_err(|e| {
        BackendUnavailable::Resolve {
            host: params.host.clone(),
            port: params.port,
            source: Box::new(e),
        }
    })
}

/// Keep roughly `rate` of all events. Agents scale sampled counters back up
/// using the `|@rate` suffix, so dropped events must really be dropped.
#[cfg(feature = "udp")]
pub(crate) fn keep_sample(rate: f64) -> bool {
    rate >= 1.0 || fastrand::f64() < rate
}

/// `-count`, failing instead of overflowing on `i64::MIN`.
#[cfg(feature = "udp")]
pub(crate) fn negate(count: i64) -> Result<i64, TransportError> {
    count
        .checked_neg()
        .ok_or_else(|| format!("cannot decrement by {count}").into())
}

/// A cadence sink and the prefix every line written to it starts with.
#[cfg(feature = "udp")]
pub(crate) struct PrefixedSink {
    sink: Box<dyn cadence::MetricSink + Send + Sync>,
    prefix: Option<String>,
}

#[cfg(feature = "udp")]
impl PrefixedSink {
    pub(crate) fn new<S>(prefix: &str, sink: S) -> Self
    where
        S: cadence::MetricSink + Send + Sync + 'static,
    {
        let prefix = prefix.trim_end_matches('.');
        Self {
            sink: Box::new(sink),
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
        }
    }

    /// Append `prefix.stat:value` to `out`.
    pub(crate) fn start_line(&self, out: &mut String, stat: &str, value: &str) {
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
            out.push('.');
        }
        out.push_str(stat);
        out.push(':');
        out.push_str(value);
    }

    pub(crate) fn emit(&self, lines: &str) -> Result<(), TransportError> {
        self.sink.emit(lines)?;
        Ok(())
    }
}
