use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Validation Metrics
    pub static ref VALIDATION_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "validation_rejections_total",
        "Requests rejected before reaching storage",
        &["code"]
    )
    .unwrap();

    // Entity Metrics
    pub static ref MOD_VERSIONS_TOTAL: IntGauge = register_int_gauge!(
        "mod_versions_total",
        "Total number of mod versions in the database"
    )
    .unwrap();

    pub static ref GLOBAL_RATINGS_TOTAL: IntGauge = register_int_gauge!(
        "global_ratings_total",
        "Total number of entries in the global rating view"
    )
    .unwrap();
}

/// Initialize all metrics (called on startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&HTTP_REQUEST_DURATION_SECONDS);
    lazy_static::initialize(&VALIDATION_REJECTIONS_TOTAL);
    lazy_static::initialize(&MOD_VERSIONS_TOTAL);
    lazy_static::initialize(&GLOBAL_RATINGS_TOTAL);
}
