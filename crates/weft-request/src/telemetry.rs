use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for a service embedding the request context storage.
///
/// - `service_name`: identifies this component (e.g. "billing-gateway")
///
/// Verbosity follows `RUST_LOG`, defaulting to `info`. Calling again after a
/// subscriber is installed is a no-op, so tests and embedders can both call
/// it unconditionally.
pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(service_name, "tracing initialized");
    }
}
