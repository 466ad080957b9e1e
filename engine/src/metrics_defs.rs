//! Metrics definitions for the engine.

use shared::metrics_defs::{MetricDef, MetricType};

pub const LABELS_APPLIED: MetricDef = MetricDef {
    name: "labels.applied",
    metric_type: MetricType::Counter,
    description: "Dashboard and routing labels that changed engine state",
};

pub const LABELS_IGNORED: MetricDef = MetricDef {
    name: "labels.ignored",
    metric_type: MetricType::Counter,
    description: "Dashboard-namespace labels dropped because they did not parse",
};

pub const ROUTING_RULES_WITHOUT_HOST: MetricDef = MetricDef {
    name: "labels.routing_rule.no_host",
    metric_type: MetricType::Counter,
    description: "Routing rules with no extractable Host matcher",
};

pub const ORPHANS_RECONCILED: MetricDef = MetricDef {
    name: "reconcile.orphans_merged",
    metric_type: MetricType::Counter,
    description: "Routing-derived fragments merged into a declared fragment",
};

pub const UNASSIGNED_FRAGMENTS: MetricDef = MetricDef {
    name: "document.unassigned_fragments",
    metric_type: MetricType::Gauge,
    description: "Fragments left out of the last document because they have no group",
};

pub const DOCUMENT_GROUPS: MetricDef = MetricDef {
    name: "document.groups",
    metric_type: MetricType::Gauge,
    description: "Groups in the last built document",
};

pub const DOCUMENT_WRITES: MetricDef = MetricDef {
    name: "document.writes",
    metric_type: MetricType::Counter,
    description: "Documents persisted by the sink",
};

pub const DOCUMENT_WRITE_FAILURES: MetricDef = MetricDef {
    name: "document.write_failures",
    metric_type: MetricType::Counter,
    description: "Documents the sink failed to persist",
};

pub const RESCAN_DURATION: MetricDef = MetricDef {
    name: "rescan.duration",
    metric_type: MetricType::Histogram,
    description: "Time to reset, replay and persist a full rescan in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    LABELS_APPLIED,
    LABELS_IGNORED,
    ROUTING_RULES_WITHOUT_HOST,
    ORPHANS_RECONCILED,
    UNASSIGNED_FRAGMENTS,
    DOCUMENT_GROUPS,
    DOCUMENT_WRITES,
    DOCUMENT_WRITE_FAILURES,
    RESCAN_DURATION,
];
