use once_cell::sync::Lazy;
use opentelemetry::{global, metrics::Counter};

pub struct Metrics {
    pub redacted_counter: Counter<u64>,
}

pub static METRICS: Lazy<Metrics> = Lazy::new(|| {
    let meter = global::meter("publicgate");
    Metrics {
        redacted_counter: meter
            .u64_counter("publicgate.redacted_members_total")
            .with_description("Private members removed from introspection results")
            .init(),
    }
});
