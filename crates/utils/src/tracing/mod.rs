use gatehouse_core::GateError;
use std::fmt::Display;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// Reads `RUST_LOG`, defaulting to `info`, and writes compact lines to stderr.
/// Calling it twice returns an error instead of panicking.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    init_with_default("info")
}

/// Initialize tracing with a fallback directive used when `RUST_LOG` is unset
pub fn init_with_default(
    directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one request through the gate
pub fn request_span(route: &str, path: &str) -> Span {
    span!(Level::DEBUG, "gate", route = %route, path = %path)
}

/// Emit a structured event for the final gate decision
pub fn gate_decision(route: &str, principal: &dyn Display, denial: Option<&GateError>) {
    match denial {
        None => debug!(route = %route, principal = %principal, "gate_allowed"),
        Some(GateError::Internal { message }) => error!(
            route = %route,
            principal = %principal,
            message = %message,
            "handler_failed"
        ),
        Some(err) => warn!(
            route = %route,
            principal = %principal,
            code = %err.code(),
            status = err.status_code(),
            "gate_denied"
        ),
    }
}

/// Emit a structured event for cache operations
pub fn cache_event(key: &str, hit: bool) {
    if hit {
        debug!(key = %key, "cache_hit");
    } else {
        debug!(key = %key, "cache_miss");
    }
}

/// Emit a structured event for rate limit accounting
pub fn rate_event(key: &str, route_class: &str, remaining: u32) {
    trace!(
        key = %key,
        route_class = %route_class,
        remaining = remaining,
        "rate_counted"
    );
}
