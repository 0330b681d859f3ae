//! Terminal front end for the SDK chatbot.
//!
//! [`start`] signs in, loads the backend feature flags, starts the
//! conversation view and reads commands from stdin until `:quit`, `:logout`,
//! end of input or Ctrl+C.

use std::sync::Arc;

use anyhow::Context;
use backend_client::{AppConfig, BackendClient, config_from_env};
use chat_stream::ResultStore;
use colored::Colorize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
};
use tracing::{info, warn};

mod app;
mod commands;
mod error_handler;
mod progress;
pub mod telemetry;
mod view;

pub use app::{Console, Reply, fallback_message};
pub use commands::{Command, parse_line};
pub use error_handler::{ConsoleError, ConsoleResult};
pub use view::ConversationView;

pub async fn start() -> anyhow::Result<()> {
    let cfg = config_from_env().context("loading backend configuration")?;
    let client = Arc::new(BackendClient::new(cfg)?);

    if let Some(creds) = client.config().credentials.clone() {
        let signed_in = client
            .sign_in(&creds)
            .await
            .context("signing in to the chatbot backend")?;
        if !signed_in {
            anyhow::bail!("Invalid credentials for user {}", creds.username);
        }
        println!("{} {}", "Signed in as".dimmed(), creds.username.bold());
    }

    let features = match client.fetch_config().await {
        Ok(features) => features,
        Err(err) => {
            warn!(error = %err, "backend config unavailable, optional features off");
            AppConfig::default()
        }
    };

    let store = Arc::new(ResultStore::new());
    let view = ConversationView::new(store.clone(), features.data_catalog_url().map(str::to_string));
    let view_task = tokio::spawn(view.run());
    let console = Console::new(client, store, features);

    println!("{}", "Type a question, or :help for commands.".dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        let cmd = match parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{}", err.to_string().red());
                continue;
            }
        };

        let fallback = fallback_message(&cmd);
        match console.execute(cmd).await {
            Ok(Reply::Silent) => {}
            Ok(Reply::Notice(msg)) => println!("{}", msg.green()),
            Ok(Reply::Quit(msg)) => {
                println!("{msg}");
                break;
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "command failed");
                eprintln!("{}", err.user_message(fallback).red());
            }
        }
    }

    console.shutdown().await;
    view_task.abort();
    info!("console closed");
    Ok(())
}
