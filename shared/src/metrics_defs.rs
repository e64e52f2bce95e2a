//! Common types for metrics definitions.
//!
//! Each crate declares its metrics as `MetricDef` constants in its own
//! `metrics_defs` module and registers them once at startup with
//! [`describe_all`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Registers the description of every metric with the installed recorder.
/// Calling this without a recorder is a no-op.
pub fn describe_all(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        metrics::counter!($def.name, $($labels)+)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        metrics::histogram!($def.name, $($labels)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &[MetricDef] = &[
        MetricDef {
            name: "test.counter",
            metric_type: MetricType::Counter,
            description: "a counter",
        },
        MetricDef {
            name: "test.histogram",
            metric_type: MetricType::Histogram,
            description: "a histogram",
        },
    ];

    #[test]
    fn metric_type_names() {
        assert_eq!(MetricType::Counter.as_str(), "Counter");
        assert_eq!(MetricType::Histogram.as_str(), "Histogram");
    }

    #[test]
    fn macros_without_recorder_are_noops() {
        describe_all(DEFS);
        counter!(DEFS[0]).increment(1);
        counter!(DEFS[0], "endpoint" => "outages").increment(1);
        histogram!(DEFS[1]).record(0.5);
    }
}
