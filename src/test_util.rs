//! Recording doubles and log capture shared by the unit tests.

use std::{fmt, io, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    Layer,
};

use crate::{
    client::{LineClient, TaggedClient},
    error::{Error, Result, TransportError},
    sink::StatsSink,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Increment {
        stat: String,
        count: i64,
        rate: f64,
        tags: Vec<String>,
    },
    Decrement {
        stat: String,
        count: i64,
        rate: f64,
        tags: Vec<String>,
    },
    Gauge {
        stat: String,
        value: f64,
        rate: f64,
        delta: bool,
        tags: Vec<String>,
    },
    Timing {
        stat: String,
        dt: Duration,
        tags: Vec<String>,
    },
}

fn owned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

impl Call {
    pub fn increment(stat: &str, count: i64, rate: f64, tags: &[&str]) -> Self {
        Self::Increment {
            stat: stat.into(),
            count,
            rate,
            tags: owned(tags),
        }
    }

    pub fn decrement(stat: &str, count: i64, rate: f64, tags: &[&str]) -> Self {
        Self::Decrement {
            stat: stat.into(),
            count,
            rate,
            tags: owned(tags),
        }
    }

    pub fn gauge(stat: &str, value: f64, rate: f64, delta: bool, tags: &[&str]) -> Self {
        Self::Gauge {
            stat: stat.into(),
            value,
            rate,
            delta,
            tags: owned(tags),
        }
    }

    pub fn timing(stat: &str, dt: Duration, tags: &[&str]) -> Self {
        Self::Timing {
            stat: stat.into(),
            dt,
            tags: owned(tags),
        }
    }
}

#[derive(Clone, Default)]
struct Calls {
    calls: Arc<Mutex<Vec<Call>>>,
    fail: bool,
}

impl Calls {
    fn push(&self, call: Call) -> Result<(), TransportError> {
        self.calls.lock().push(call);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into());
        }
        Ok(())
    }
}

/// A [`StatsSink`] that remembers what it was asked to emit.
#[derive(Clone, Default)]
pub struct RecordingSink(Calls);

impl RecordingSink {
    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.lock().clone()
    }
}

impl StatsSink for RecordingSink {
    fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.0
            .push(Call::increment(stat, count, rate, tags))
            .map_err(Error::Transport)
    }

    fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
        self.0
            .push(Call::decrement(stat, count, rate, tags))
            .map_err(Error::Transport)
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool, tags: &[&str]) -> Result<()> {
        self.0
            .push(Call::gauge(stat, value, rate, delta, tags))
            .map_err(Error::Transport)
    }

    fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()> {
        self.0
            .push(Call::timing(stat, dt, tags))
            .map_err(Error::Transport)
    }
}

#[derive(Clone, Default)]
pub struct RecordingLineClient(Calls);

impl RecordingLineClient {
    /// Records calls and then fails every one of them.
    pub fn failing() -> Self {
        Self(Calls {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.lock().clone()
    }
}

impl LineClient for RecordingLineClient {
    fn incr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError> {
        self.0.push(Call::increment(stat, count, rate, &[]))
    }

    fn decr(&self, stat: &str, count: i64, rate: f64) -> Result<(), TransportError> {
        self.0.push(Call::decrement(stat, count, rate, &[]))
    }

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool) -> Result<(), TransportError> {
        self.0.push(Call::gauge(stat, value, rate, delta, &[]))
    }

    fn timing(&self, stat: &str, dt: Duration) -> Result<(), TransportError> {
        self.0.push(Call::timing(stat, dt, &[]))
    }
}

#[derive(Clone, Default)]
pub struct RecordingTaggedClient(Calls);

impl RecordingTaggedClient {
    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.lock().clone()
    }
}

impl TaggedClient for RecordingTaggedClient {
    fn increment(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.0.push(Call::increment(metric, value, sample_rate, tags))
    }

    fn decrement(
        &self,
        metric: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.0.push(Call::decrement(metric, value, sample_rate, tags))
    }

    fn gauge(
        &self,
        metric: &str,
        value: f64,
        tags: &[&str],
        sample_rate: f64,
    ) -> Result<(), TransportError> {
        self.0
            .push(Call::gauge(metric, value, sample_rate, false, tags))
    }

    fn timing(&self, metric: &str, value: Duration, tags: &[&str]) -> Result<(), TransportError> {
        self.0.push(Call::timing(metric, value, tags))
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub fields: Vec<(String, String)>,
}

impl LogEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FieldVisitor(Vec<(String, String)>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(LogEvent {
            level: *event.metadata().level(),
            fields: visitor.0,
        });
    }
}

/// Run `f` with a thread-local subscriber and return every event it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<LogEvent>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        events: events.clone(),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().clone();
    (result, events)
}
