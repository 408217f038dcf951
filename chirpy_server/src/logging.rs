//! Structured logging configuration.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with noisy
/// dependencies turned down. Library crates logging through the `log`
/// facade are captured as well.
///
/// # Example
///
/// ```no_run
/// use chirpy_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// Never pass raw credentials, tokens or password material as `message`.
///
/// # Example
///
/// ```
/// use chirpy_server::logging::log_security_event;
///
/// log_security_event("failed_login", None, Some("req-1"), "Incorrect email or password");
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<uuid::Uuid>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = ?user_id,
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}
