use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route diagnostics to stderr, leaving stdout to the chat view. Errors also
/// reach Sentry as issues and warnings ride along as breadcrumbs. `RUST_LOG`
/// overrides the default of `warn` plus `info` for this crate.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pcbuilder_lib=info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(sentry_layer)
        .init();

    tracing::debug!("Tracing initialized");
}
