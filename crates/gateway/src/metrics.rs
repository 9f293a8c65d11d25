use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::time::Duration;

#[derive(Clone)]
pub struct PredictMetrics {
    duration: Histogram<f64>,
    predictions: Counter<u64>,
    failures: Counter<u64>,
}

impl PredictMetrics {
    /// Instruments on the global meter; no-ops until a meter provider is installed.
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 2.5, 5.0, 10.0,
        ];

        let duration = meter
            .f64_histogram("predict_duration_seconds")
            .with_description("Time to classify one uploaded image (decode + infer + assemble)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let predictions = meter
            .u64_counter("predictions_total")
            .with_description("Total successful predictions")
            .build();
        let failures = meter
            .u64_counter("prediction_failures_total")
            .with_description("Total failed predictions by reason")
            .build();

        Self {
            duration,
            predictions,
            failures,
        }
    }

    pub fn record_success(&self, elapsed: Duration, predicted_class: &str) {
        self.duration.record(elapsed.as_secs_f64(), &[]);
        self.predictions
            .add(1, &[KeyValue::new("class", predicted_class.to_string())]);
    }

    pub fn record_failure(&self, reason: &'static str) {
        self.failures.add(1, &[KeyValue::new("reason", reason)]);
    }
}
