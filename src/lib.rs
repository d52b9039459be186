//! statsgate is a small stats gateway: call sites emit counters, gauges and
//! timings through one [`Gateway`], which validates the stat name, checks it
//! against an allow list and forwards it to whichever backend the config
//! selected (plain statsd, dogstatsd, or nothing at all).
//!
//! ```no_run
//! use std::time::Duration;
//! use statsgate::{StatsSink, StatsSinkExt, DEFAULT_GATEWAY};
//!
//! // Backend selection happens here, on first use, from STATSGATE_* env vars.
//! DEFAULT_GATEWAY.incr("scheduler.heartbeat")?;
//! DEFAULT_GATEWAY.increment("ti.finish", 1, 1.0, &["state:success"])?;
//! DEFAULT_GATEWAY.time("task.duration", Duration::from_millis(12))?;
//! # Ok::<(), statsgate::Error>(())
//! ```
//!
//! Invalid names never surface as errors, they are logged and dropped. The
//! errors callers do see are config errors from the first resolution and
//! transport errors from the backend client.

pub mod allow_list;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod name;
pub mod registry;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_util;

pub use allow_list::AllowList;
pub use config::{ConfigSource, EnvConfig, MapConfig};
pub use dispatcher::SafeDispatcher;
pub use error::{BackendUnavailable, ConfigError, Error, InvalidName, Result, TransportError};
pub use gateway::{select_backend, BackendKind, Gateway, GatewayBuilder, DEFAULT_GATEWAY};
pub use registry::{Component, ComponentRegistry, DEFAULT_COMPONENTS};
pub use sink::{DogStatsdSink, NoopSink, StatsSink, StatsSinkExt, StatsdSink};
