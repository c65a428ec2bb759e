// Wellness Chat terminal entry point
// Reads lines from stdin and feeds them to one chat session.

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use wellness_chat_core::brain::QUICK_PROMPTS;
use wellness_chat_core::{
    telemetry, AppError, BackendKind, ChatConfig, KeywordClassifier, LocalBackend, Message,
    RemoteBackend, SessionHandle,
};

const QUIT_COMMAND: &str = "/quit";

fn start_session(config: &ChatConfig) -> Result<SessionHandle, AppError> {
    let options = config.session_options();
    match config.backend {
        BackendKind::Local => {
            let classifier = KeywordClassifier::with_table(config.rule_table()?);
            Ok(SessionHandle::new(Arc::new(LocalBackend::new(classifier)), options))
        }
        BackendKind::Remote => {
            let url = config
                .remote_url
                .clone()
                .ok_or_else(|| AppError::Config("Remote backend requires a URL".to_string()))?;
            let backend = RemoteBackend::new(url, config.remote_token.clone(), config.request_timeout());
            Ok(SessionHandle::new(Arc::new(backend), options))
        }
    }
}

/// A bare number picks the matching quick prompt.
fn resolve_input(line: &str) -> &str {
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| QUICK_PROMPTS.get(i).copied())
        .unwrap_or(line)
}

fn print_bot(message: &Message) {
    if let Some(notice) = message.severity.and_then(|s| s.escalation_notice()) {
        println!("\n!! {} !!", notice);
    }
    println!("\nbot> {}", message.text);
    if let Some(severity) = message.severity {
        println!("     [{}]", severity.badge());
    }
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ChatConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(env!("CARGO_PKG_NAME"), config.log_format)?;
    if let Some(path) = &config.env_file {
        info!("Loaded environment from {}", path.display());
    }
    info!(backend = ?config.backend, "Starting wellness chat");

    let session = start_session(&config).context("Failed to start chat session")?;

    for message in session.messages().await? {
        print_bot(&message);
    }
    println!("Not sure where to start? Type a number:");
    for (i, prompt) in QUICK_PROMPTS.iter().enumerate() {
        println!("  {}. {}", i + 1, prompt);
    }
    println!("Type {} to leave.\n", QUIT_COMMAND);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == QUIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match session.submit_and_wait(resolve_input(line)).await {
            Ok(reply) => print_bot(&reply),
            Err(e) => error!("Failed to get a reply: {}", e),
        }
    }

    session.shutdown().await?;
    Ok(())
}
