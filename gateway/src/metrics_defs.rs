//! Metrics definitions for the gateway.

use shared::metrics_defs::{MetricDef, MetricType};

pub const OPERATION_REQUESTS: MetricDef = MetricDef {
    name: "operation.requests",
    metric_type: MetricType::Counter,
    description: "Number of handled operations. Tagged with operation, outcome.",
};

pub const OPERATION_DURATION: MetricDef = MetricDef {
    name: "operation.duration",
    metric_type: MetricType::Histogram,
    description: "Time to handle an operation in seconds, backend call included. Tagged with operation.",
};

pub const BACKEND_CLIENTS_ACQUIRED: MetricDef = MetricDef {
    name: "backend.clients_acquired",
    metric_type: MetricType::Counter,
    description: "Number of backend client handles handed out. Tagged with strategy.",
};

/// Registered with the recorder at startup so exporters can describe each metric.
pub const ALL_METRICS: &[MetricDef] = &[
    OPERATION_REQUESTS,
    OPERATION_DURATION,
    BACKEND_CLIENTS_ACQUIRED,
];
