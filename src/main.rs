mod catalog;
mod config;
mod db;
mod flows;
mod ipc;
mod onboarding;
mod prefs;
mod slots;

use std::io::{self, BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(level: &str) {
    // stdout carries IPC responses; all diagnostics go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_level(true)
                .with_target(false),
        )
        .init();
}

fn main() {
    // A bad config file must not keep the sidecar from starting.
    let (cfg, cfg_err) = match config::LessondConfig::load_with_dotenv() {
        Ok(c) => (c, None),
        Err(e) => (config::LessondConfig::default(), Some(e)),
    };
    init_tracing(&cfg.log_level);
    if let Some(e) = cfg_err {
        tracing::warn!(error = %e, "invalid configuration; using defaults");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        reschedule_lead_minutes = cfg.scheduling.reschedule.lead_minutes,
        book_with_student_lead_minutes = cfg.scheduling.book_with_student.lead_minutes,
        "lessond started"
    );

    let mut state = ipc::AppState::new(cfg);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed; shutting down");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed; exiting");
}
