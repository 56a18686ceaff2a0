use prometheus::{Encoder, Gauge, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub jobs_evaluated_total: IntCounterVec,
    pub jobs_in_queue: IntGauge,
    pub evaluation_latency_seconds: HistogramVec,
    pub platform_share_month_to_date: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let jobs_evaluated_total = IntCounterVec::new(
            Opts::new("jobs_evaluated_total", "Automated job evaluations by action"),
            &["action"],
        )
        .expect("valid jobs_evaluated_total metric");

        let jobs_in_queue = IntGauge::new("jobs_in_queue", "Job offers waiting for automation")
            .expect("valid jobs_in_queue metric");

        let evaluation_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "evaluation_latency_seconds",
                "Latency of processing one job offer in seconds",
            ),
            &["outcome"],
        )
        .expect("valid evaluation_latency_seconds metric");

        let platform_share_month_to_date = Gauge::new(
            "platform_share_month_to_date",
            "Platform share collected in the current month",
        )
        .expect("valid platform_share_month_to_date metric");

        registry
            .register(Box::new(jobs_evaluated_total.clone()))
            .expect("register jobs_evaluated_total");
        registry
            .register(Box::new(jobs_in_queue.clone()))
            .expect("register jobs_in_queue");
        registry
            .register(Box::new(evaluation_latency_seconds.clone()))
            .expect("register evaluation_latency_seconds");
        registry
            .register(Box::new(platform_share_month_to_date.clone()))
            .expect("register platform_share_month_to_date");

        Self {
            registry,
            jobs_evaluated_total,
            jobs_in_queue,
            evaluation_latency_seconds,
            platform_share_month_to_date,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
