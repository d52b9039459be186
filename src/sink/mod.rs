use std::{sync::Arc, time::Duration};

use crate::error::Result;

mod dogstatsd;
mod statsd;

pub use dogstatsd::DogStatsdSink;
pub use statsd::StatsdSink;

/// The four operations every backend, the dispatcher and the gateway itself
/// support. Code that emits stats should only need this trait.
pub trait StatsSink: Send + Sync {
    fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()>;

    fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()>;

    fn gauge(&self, stat: &str, value: f64, rate: f64, delta: bool, tags: &[&str]) -> Result<()>;

    fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()>;
}

/// Shorthands using the default count, rate and tags.
pub trait StatsSinkExt: StatsSink {
    fn incr(&self, stat: &str) -> Result<()> {
        self.increment(stat, 1, 1.0, &[])
    }

    fn decr(&self, stat: &str) -> Result<()> {
        self.decrement(stat, 1, 1.0, &[])
    }

    fn set_gauge(&self, stat: &str, value: f64) -> Result<()> {
        self.gauge(stat, value, 1.0, false, &[])
    }

    fn time(&self, stat: &str, dt: Duration) -> Result<()> {
        self.timing(stat, dt, &[])
    }
}

impl<S: StatsSink + ?Sized> StatsSinkExt for S {}

macro_rules! forward_sink {
    ($($ty:ty),*) => {$(
        impl<S: StatsSink + ?Sized> StatsSink for $ty {
            fn increment(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
                (**self).increment(stat, count, rate, tags)
            }

            fn decrement(&self, stat: &str, count: i64, rate: f64, tags: &[&str]) -> Result<()> {
                (**self).decrement(stat, count, rate, tags)
            }

            fn gauge(
                &self,
                stat: &str,
                value: f64,
                rate: f64,
                delta: bool,
                tags: &[&str],
            ) -> Result<()> {
                (**self).gauge(stat, value, rate, delta, tags)
            }

            fn timing(&self, stat: &str, dt: Duration, tags: &[&str]) -> Result<()> {
                (**self).timing(stat, dt, tags)
            }
        }
    )*};
}

forward_sink!(Box<S>, Arc<S>, &S);

/// Drops everything. Used when no backend is configured or the configured
/// one can't be built.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StatsSink for NoopSink {
    fn increment(&self, _stat: &str, _count: i64, _rate: f64, _tags: &[&str]) -> Result<()> {
        Ok(())
    }

    fn decrement(&self, _stat: &str, _count: i64, _rate: f64, _tags: &[&str]) -> Result<()> {
        Ok(())
    }

    fn gauge(
        &self,
        _stat: &str,
        _value: f64,
        _rate: f64,
        _delta: bool,
        _tags: &[&str],
    ) -> Result<()> {
        Ok(())
    }

    fn timing(&self, _stat: &str, _dt: Duration, _tags: &[&str]) -> Result<()> {
        Ok(())
    }
}
