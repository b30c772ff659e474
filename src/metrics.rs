use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("stock_api_requests_total", "Total number of requests").unwrap();
    pub static ref QUOTA_ADMITTED: Counter =
        register_counter!("stock_api_quota_admitted_total", "Calls admitted by the quota gate").unwrap();
    pub static ref QUOTA_REJECTED: Counter =
        register_counter!("stock_api_quota_rejected_total", "Calls rejected by the quota gate").unwrap();
    pub static ref TRACKED_IDENTITIES: Gauge =
        register_gauge!("stock_api_tracked_identities", "API keys currently holding a quota window").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "stock_api_request_latency_seconds",
        "Stock lookup latency in seconds"
    )
    .unwrap();
}

// Render every registered metric in the text exposition format
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
