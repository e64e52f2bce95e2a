//! Metrics definitions for the site API client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_ATTEMPT: MetricDef = MetricDef {
    name: "site_api.request.attempt",
    metric_type: MetricType::Counter,
    description: "Number of HTTP request attempts sent to the site API",
};

pub const REQUEST_FAILURE: MetricDef = MetricDef {
    name: "site_api.request.failure",
    metric_type: MetricType::Counter,
    description: "Number of request attempts that failed with a network error or non-2xx status",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "site_api.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a single request attempt in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUEST_ATTEMPT, REQUEST_FAILURE, REQUEST_DURATION];
