use belt_exam::registration::{DocumentFormat, OrderingPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_format(raw: &str) -> Result<DocumentFormat, String> {
    DocumentFormat::parse(raw).ok_or_else(|| format!("unknown format '{raw}' (expected xlsx or csv)"))
}

pub(crate) fn parse_ordering(raw: &str) -> Result<OrderingPolicy, String> {
    OrderingPolicy::parse(raw)
        .ok_or_else(|| format!("unknown ordering '{raw}' (expected selection or rank)"))
}
