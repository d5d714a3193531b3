//! Prometheus registry for the bot process.
//!
//! Core counters (searches, downloads, deliveries, updates) are registered
//! here next to process-level metrics of the binary.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// 1 while the polling loop runs.
pub static RUNNER_UP: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(Opts::new(
        "tunegrab_runner_up",
        "Whether the update polling loop is running",
    ))
    .unwrap()
});

/// Build info, constant 1 with the version as a label.
pub static BUILD_INFO: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("tunegrab_build_info", "Build information")
            .const_label("version", env!("CARGO_PKG_VERSION")),
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(RUNNER_UP.clone())).unwrap();
    registry.register(Box::new(BUILD_INFO.clone())).unwrap();

    for metric in tunegrab_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }

    BUILD_INFO.set(1);
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
