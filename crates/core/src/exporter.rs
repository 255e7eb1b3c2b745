//! Prometheus exposition of window signals.
//!
//! The recorder is owned by the exporter rather than installed as the
//! process-global `metrics` recorder, so each exporter renders only the
//! signals registered through it.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError};

use metrics::Label;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tracing::warn;

use crate::signal::SignalState;

/// Name of the per-window gauge.
pub const SIGNAL_METRIC: &str = "maintenance_active";

/// Binds window signals to `maintenance_active` gauges and renders them.
pub struct SignalExporter {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    registered: Mutex<HashSet<BTreeMap<String, String>>>,
}

impl SignalExporter {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        Self {
            recorder,
            handle,
            registered: Mutex::new(HashSet::new()),
        }
    }

    /// Register a gauge for the given label set and return its signal.
    ///
    /// Labels are emitted in key order, so exposition text is stable.
    /// Registering the same label set twice yields two signals backed by one
    /// series; whichever writes last is what gets scraped.
    pub fn register(&self, labels: &BTreeMap<String, String>) -> SignalState {
        let first = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(labels.clone());
        if !first {
            warn!(
                ?labels,
                "label set already registered, windows share one {} series", SIGNAL_METRIC
            );
        }

        let labels: Vec<Label> = labels
            .iter()
            .map(|(key, value)| Label::new(key.clone(), value.clone()))
            .collect();
        let gauge = metrics::with_local_recorder(&self.recorder, || {
            metrics::gauge!(SIGNAL_METRIC, labels)
        });
        SignalState::new(gauge)
    }

    /// Whether a gauge with exactly these labels was registered.
    pub fn is_registered(&self, labels: &BTreeMap<String, String>) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(labels)
    }

    /// Prometheus text exposition of every registered signal.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// A cloneable handle for serving [`render`](Self::render) elsewhere.
    pub fn handle(&self) -> PrometheusHandle {
        self.handle.clone()
    }
}

impl Default for SignalExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn registered_signal_renders_inactive() {
        let exporter = SignalExporter::new();
        exporter.register(&labels(&[("name", "db-maint"), ("configured_timezone", "UTC")]));

        let text = exporter.render();
        assert!(
            text.contains(r#"maintenance_active{configured_timezone="UTC",name="db-maint"} 0"#),
            "{text}"
        );
    }

    #[test]
    fn labels_are_sorted_by_key() {
        let exporter = SignalExporter::new();
        exporter.register(&labels(&[("zone", "a"), ("name", "w"), ("app", "db")]));

        let text = exporter.render();
        assert!(
            text.contains(r#"maintenance_active{app="db",name="w",zone="a"}"#),
            "{text}"
        );
    }

    #[test]
    fn render_follows_signal_value() {
        let exporter = SignalExporter::new();
        let signal = exporter.register(&labels(&[("name", "w")]));

        signal.set_active();
        assert!(exporter.render().contains(r#"maintenance_active{name="w"} 1"#));

        signal.set_inactive();
        assert!(exporter.render().contains(r#"maintenance_active{name="w"} 0"#));
    }

    #[test]
    fn duplicate_label_set_shares_one_series() {
        let exporter = SignalExporter::new();
        let set = labels(&[("name", "dup")]);
        assert!(!exporter.is_registered(&set));

        let first = exporter.register(&set);
        let second = exporter.register(&set);
        assert!(exporter.is_registered(&set));

        first.set_active();
        second.set_inactive();
        assert!(first.is_active(), "signals stay independent");

        let text = exporter.render();
        assert_eq!(text.matches(r#"maintenance_active{name="dup"}"#).count(), 1, "{text}");
        assert!(text.contains(r#"maintenance_active{name="dup"} 0"#), "{text}");
    }

    #[test]
    fn exporters_are_isolated() {
        let first = SignalExporter::new();
        let second = SignalExporter::new();
        first.register(&labels(&[("name", "only-first")]));

        assert!(first.render().contains("only-first"));
        assert!(!second.render().contains("only-first"));
    }
}
