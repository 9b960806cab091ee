fn main() {
    // Initialize Sentry before anything else so panics during startup are captured.
    // Returns a no-op guard when SENTRY_DSN is absent (local dev).
    let sentry_guard = sentry::init(sentry_options());

    let result = pcbuilder_lib::run();
    // Flush pending Sentry events before a non-zero exit skips destructors.
    drop(sentry_guard);

    if let Err(e) = result {
        eprintln!("pc-builder: {e}");
        std::process::exit(1);
    }
}

fn sentry_options() -> sentry::ClientOptions {
    sentry::ClientOptions {
        dsn: option_env!("SENTRY_DSN").and_then(|s| s.parse().ok()),
        release: Some(env!("CARGO_PKG_VERSION").into()),
        traces_sample_rate: 0.0,
        send_default_pii: false,
        before_send: Some(std::sync::Arc::new(|mut event| {
            // Chat content never leaves the machine through crash reports.
            if let Some(ref mut request) = event.request {
                request.data = None;
            }
            event.user = None;
            Some(event)
        })),
        ..Default::default()
    }
}
