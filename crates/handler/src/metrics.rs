use once_cell::sync::Lazy;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};

pub struct Metrics {
    pub query_counter: Counter<u64>,
    pub query_histogram: Histogram<f64>,
    pub rejected_counter: Counter<u64>,
}

pub static METRICS: Lazy<Metrics> = Lazy::new(|| {
    let meter = global::meter("publicgate");
    Metrics {
        query_counter: meter
            .u64_counter("publicgate.queries_total")
            .with_description("Total number of GraphQL requests")
            .init(),
        query_histogram: meter
            .f64_histogram("publicgate.query_duration_seconds")
            .with_description("GraphQL request duration")
            .init(),
        rejected_counter: meter
            .u64_counter("publicgate.rejected_operations_total")
            .with_description("Operations rejected by validation")
            .init(),
    }
});
