//! Prometheus metrics

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Setup Prometheus metrics exporter
/// Returns a handle that can be used to retrieve metrics
pub fn setup_metrics() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!("Prometheus metrics exporter installed");

    Ok(handle)
}

/// Record a pack installation (fresh install or overwrite)
pub fn record_pack_installed(uuid: &str) {
    metrics::counter!("voicepack_manager_packs_installed_total",
        "model" => uuid.to_string()
    )
    .increment(1);
}

/// Record a pack uninstallation
pub fn record_pack_uninstalled(uuid: &str) {
    metrics::counter!("voicepack_manager_packs_uninstalled_total",
        "model" => uuid.to_string()
    )
    .increment(1);
}

/// Record a pack update via the catalog
pub fn record_pack_updated(uuid: &str) {
    metrics::counter!("voicepack_manager_packs_updated_total",
        "model" => uuid.to_string()
    )
    .increment(1);
}

/// Update total installed pack count gauge
pub fn update_installed_count(count: usize) {
    metrics::gauge!("voicepack_manager_packs_count").set(count as f64);
}
