use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, HistogramVec, register_counter, register_counter_vec,
    register_gauge, register_histogram_vec,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "proxy_requests_total",
        "Total number of proxy requests",
        &["endpoint"]
    )
    .unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("proxy_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("proxy_cache_misses_total", "Total cache misses").unwrap();
    pub static ref VENDOR_LATENCY: HistogramVec = register_histogram_vec!(
        "proxy_vendor_latency_seconds",
        "Vendor call latency in seconds",
        &["vendor"]
    )
    .unwrap();
    pub static ref VENDOR_FAILURES: CounterVec = register_counter_vec!(
        "proxy_vendor_failures_total",
        "Vendor calls that ended in an error",
        &["vendor"]
    )
    .unwrap();
    pub static ref AUTH_REJECTIONS: Counter =
        register_counter!("proxy_auth_rejections_total", "Requests rejected by the token check").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("proxy_cache_size", "Current number of items in cache").unwrap();
}
