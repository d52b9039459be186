use std::time::{Duration, Instant};

use statsgate::{StatsSink, StatsSinkExt, DEFAULT_GATEWAY};

// Try it with a local agent:
//   STATSGATE_STATSD_ON=true STATSGATE_STATSD_PREFIX=demo cargo run --example emit
#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!(backend = ?DEFAULT_GATEWAY.backend()?, "stats gateway ready");

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    for i in 0..20u32 {
        let started = Instant::now();
        ticker.tick().await;
        DEFAULT_GATEWAY.incr("demo.ticks")?;
        DEFAULT_GATEWAY.gauge("demo.iteration", f64::from(i), 1.0, false, &["source:demo"])?;
        // Dropped and logged, '/' is not allowed in stat names.
        DEFAULT_GATEWAY.incr("demo/invalid")?;
        DEFAULT_GATEWAY.time("demo.tick_wait", started.elapsed())?;
    }
    Ok(())
}
