pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod sync;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use client::{RemoteService, ServiceClient};
use config::ServiceConfig;
use error::AppError;
use sync::{SendOutcome, Synchronizer};
use ui::Intent;

pub fn run() -> Result<(), AppError> {
    logging::init();

    tracing::info!("Starting PC Builder v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(chat_loop())
}

/// Terminal front end: draws state changes and forwards each input line to
/// the synchronizer as an intent.
async fn chat_loop() -> Result<(), AppError> {
    let config = ServiceConfig::from_env()?;
    let client = Arc::new(ServiceClient::new(&config)?);

    match client.health().await {
        Ok(health) if health.status == "ok" => {
            tracing::info!(base_url = %config.base_url, "Service is healthy");
        }
        Ok(health) => {
            tracing::warn!(status = %health.status, "Service reported degraded health");
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "Health check failed: {}", e);
            println!("{}", ui::render_error_banner(&format!(
                "Service at {} is not reachable: {e}",
                config.base_url
            )));
        }
    }

    let sync = Arc::new(Synchronizer::new(client));

    let mut updates = sync.subscribe();
    let renderer = tokio::spawn(async move {
        let mut screen = ui::Screen::default();
        loop {
            let state = updates.borrow_and_update().clone();
            for block in screen.update(&state) {
                println!("{block}");
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    sync.load_session_list().await;
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ui::parse_intent(&line) {
            Intent::Send(text) => spawn_send(&sync, text),
            Intent::Suggest(n) => spawn_send(&sync, ui::SUGGESTIONS[n - 1].to_string()),
            Intent::NewSession => sync.start_new_session(),
            Intent::ListSessions => {
                sync.load_session_list().await;
                println!(
                    "{}",
                    ui::render_session_list(&sync.snapshot(), chrono::Utc::now())
                );
            }
            Intent::Open(arg) => {
                let state = sync.snapshot();
                match ui::resolve_session(&arg, &state.sessions) {
                    Some(id) => {
                        let id = id.to_string();
                        let sync = Arc::clone(&sync);
                        tokio::spawn(async move { sync.select_session(&id).await });
                    }
                    None => println!("No chat matches \"{arg}\". Try /sessions."),
                }
            }
            Intent::ShowBuild => match sync.snapshot().active_build {
                Some(build) => println!("{}", ui::render_build_card(&build)),
                None => println!("No build yet."),
            },
            Intent::Export(dir) => export_current(&sync, dir).await,
            Intent::Help => println!("{}", ui::HELP),
            Intent::Quit => break,
            Intent::Unknown(cmd) => println!("Unknown command {cmd}. Type /help."),
        }
    }

    renderer.abort();
    tracing::info!("Exiting");
    Ok(())
}

fn spawn_send(sync: &Arc<Synchronizer>, text: String) {
    let sync = Arc::clone(sync);
    tokio::spawn(async move {
        if sync.send_message(&text).await == SendOutcome::Ignored && sync.snapshot().in_flight {
            println!("(still waiting for the previous reply)");
        }
    });
}

async fn export_current(sync: &Synchronizer, dir: Option<PathBuf>) {
    let Some(build) = sync.snapshot().active_build else {
        println!("No build to export.");
        return;
    };
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    match export::export_build(&build, &dir).await {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => {
            tracing::warn!(kind = e.kind(), "Export failed: {}", e);
            println!("{}", ui::render_error_banner(&format!("Export failed: {e}")));
        }
    }
}
