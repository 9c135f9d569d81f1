//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Collector registration stays private; callers get intent-named methods.
//! - Only transfer, remote-call, and HTTP counters are tracked.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    transfers_started_total: IntCounter,
    transfers_finished_total: IntCounterVec,
    active_transfers: IntGauge,
    transfer_bytes_total: IntCounter,
    remote_calls_total: IntCounterVec,
}

impl Metrics {
    /// Construct a new registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let transfers_started_total = counter(
            "transfers_started_total",
            "Direct transfers admitted by the engine",
        )?;
        let transfers_finished_total = counter_vec(
            "transfers_finished_total",
            "Direct transfers that reached a terminal state",
            &["outcome"],
        )?;
        let active_transfers = IntGauge::with_opts(Opts::new(
            "active_transfers",
            "Direct transfers currently occupying a slot",
        ))
        .map_err(|source| TelemetryError::build("active_transfers", source))?;
        let transfer_bytes_total = counter(
            "transfer_bytes_total",
            "Bytes written to disk by direct transfers",
        )?;
        let remote_calls_total = counter_vec(
            "remote_calls_total",
            "Calls to external services by outcome",
            &["service", "outcome"],
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "transfers_started_total", &transfers_started_total)?;
        register(&registry, "transfers_finished_total", &transfers_finished_total)?;
        register(&registry, "active_transfers", &active_transfers)?;
        register(&registry, "transfer_bytes_total", &transfer_bytes_total)?;
        register(&registry, "remote_calls_total", &remote_calls_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                transfers_started_total,
                transfers_finished_total,
                active_transfers,
                transfer_bytes_total,
                remote_calls_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Record an admitted transfer.
    pub fn inc_transfer_started(&self) {
        self.inner.transfers_started_total.inc();
    }

    /// Record a transfer reaching `outcome` (`completed`, `failed`, `cancelled`).
    pub fn inc_transfer_finished(&self, outcome: &str) {
        self.inner
            .transfers_finished_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the active transfer gauge.
    pub fn set_active_transfers(&self, count: i64) {
        self.inner.active_transfers.set(count);
    }

    /// Add bytes written by a transfer.
    pub fn add_transfer_bytes(&self, bytes: u64) {
        self.inner.transfer_bytes_total.inc_by(bytes);
    }

    /// Record an external service call outcome (`ok`, `error`, `timeout`).
    pub fn inc_remote_call(&self, service: &str, outcome: &str) {
        self.inner
            .remote_calls_total
            .with_label_values(&[service, outcome])
            .inc();
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the output is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Exposition { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::ExpositionEncoding { source })
    }
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::build(name, source))
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::build(name, source))
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::register(name, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_render() -> std::result::Result<(), TelemetryError> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/downloads", 200);
        metrics.inc_transfer_started();
        metrics.inc_transfer_finished("failed");
        metrics.set_active_transfers(2);
        metrics.add_transfer_bytes(4096);
        metrics.inc_remote_call("qbittorrent", "ok");

        let rendered = metrics.render()?;
        assert!(rendered.contains("active_transfers 2"));
        assert!(rendered.contains("transfers_started_total 1"));
        assert!(rendered.contains("transfer_bytes_total 4096"));
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("transfers_finished_total{outcome=\"failed\"} 1"));
        assert!(rendered.contains("remote_calls_total"));
        Ok(())
    }

    #[test]
    fn registries_are_independent() -> std::result::Result<(), TelemetryError> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_transfer_started();
        assert!(first.render()?.contains("transfers_started_total 1"));
        assert!(second.render()?.contains("transfers_started_total 0"));
        Ok(())
    }
}
