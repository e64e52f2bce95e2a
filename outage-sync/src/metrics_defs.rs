//! Metrics definitions for a sync run.

use shared::metrics_defs::{MetricDef, MetricType};

pub const OUTAGES_FETCHED: MetricDef = MetricDef {
    name: "outage_sync.outages.fetched",
    metric_type: MetricType::Histogram,
    description: "Number of outages returned by the service before filtering",
};

pub const OUTAGES_SUBMITTED: MetricDef = MetricDef {
    name: "outage_sync.outages.submitted",
    metric_type: MetricType::Histogram,
    description: "Number of annotated outages submitted for the site",
};

pub const ALL_METRICS: &[MetricDef] = &[OUTAGES_FETCHED, OUTAGES_SUBMITTED];
