use std::sync::OnceLock;

use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use prometheus::{IntGaugeVec, Opts};

pub struct Metrics {
    pub deployments_created: Counter<u64>,
    pub deployments_scheduled: Counter<u64>,
    pub deployments_completed: Counter<u64>,
    pub deployments_errored: Counter<u64>,
    pub plan_generation_seconds: Histogram<f64>,
    pub artifact_resolutions_total: Counter<u64>,
    pub artifact_resolution_failures: IntGaugeVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

pub fn init(registry: &prometheus::Registry) -> Result<(), anyhow::Error> {
    let meter = global::meter("eve-deploy");

    let artifact_resolution_failures = IntGaugeVec::new(
        Opts::new(
            "eve_artifact_resolution_failures",
            "Unresolved artifact requests by feed",
        ),
        &["feed"],
    )?;
    registry.register(Box::new(artifact_resolution_failures.clone()))?;

    let metrics = Metrics {
        deployments_created: meter.u64_counter("eve_deployments_created_total").init(),
        deployments_scheduled: meter.u64_counter("eve_deployments_scheduled_total").init(),
        deployments_completed: meter.u64_counter("eve_deployments_completed_total").init(),
        deployments_errored: meter.u64_counter("eve_deployments_errored_total").init(),
        plan_generation_seconds: meter.f64_histogram("eve_plan_generation_seconds").init(),
        artifact_resolutions_total: meter.u64_counter("eve_artifact_resolutions_total").init(),
        artifact_resolution_failures,
    };

    METRICS
        .set(metrics)
        .map_err(|_| anyhow::anyhow!("Metrics already initialized"))?;

    Ok(())
}

#[allow(clippy::expect_used)]
pub fn get() -> &'static Metrics {
    METRICS
        .get()
        .expect("Metrics not initialized - call metrics::init() first")
}
