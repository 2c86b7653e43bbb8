//! modelwatch binary.
//!
//! The host runtime pipes one JSON turn-end event per line:
//! ```bash
//! my-agent --emit-turn-events | modelwatch watch
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use modelwatch::{run_event_stream, ModelWatch, Result, WatchError};
use modelwatch_core::{resolve_delivery_target_traced, Environment, TracedTarget, WatchPaths};
use modelwatch_notify::Notifier;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// modelwatch - announce model switches of a running agent
#[derive(Parser, Debug)]
#[command(name = "modelwatch")]
#[command(about = "Send a Telegram message whenever the agent's model, provider or auth profile changes")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read turn-end events (JSON lines) from stdin and announce switches
    Watch,
    /// Show resolved paths and delivery target
    Resolve,
    /// Send a message through the resolved target
    Send {
        /// Message text
        text: String,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load the optional .env from the state directory before snapshotting
    let env_path = WatchPaths::resolve(&Environment::from_process()).env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }

    let filter = match args.verbose {
        0 => "modelwatch=info,modelwatch_core=info,modelwatch_notify=info",
        1 => "modelwatch=debug,modelwatch_core=debug,modelwatch_notify=debug",
        2 => "modelwatch=trace,modelwatch_core=trace,modelwatch_notify=trace,reqwest=debug",
        _ => "trace",
    };

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let env = Environment::from_process();

    match args.command {
        Command::Watch => watch(env).await?,
        Command::Resolve => resolve(&env),
        Command::Send { text } => send(&env, &text).await?,
    }

    Ok(())
}

async fn watch(env: Environment) -> Result<()> {
    let notifier = Arc::new(Notifier::telegram());
    let mut handler = ModelWatch::new(env, notifier);

    let stdin = BufReader::new(tokio::io::stdin());
    let stats = run_event_stream(stdin, &mut handler).await?;
    info!(
        events = stats.events,
        switches = stats.switches,
        malformed = stats.malformed,
        "Watch finished"
    );
    Ok(())
}

fn resolve(env: &Environment) {
    let paths = WatchPaths::resolve(env);
    let TracedTarget {
        target,
        token_source,
        chat_id_source,
    } = resolve_delivery_target_traced(env);

    println!("state dir:      {}", paths.state_dir.display());
    println!("config:         {}", paths.config_file().display());
    println!("auth profiles:  {}", paths.auth_profiles_file().display());
    match (target.token(), token_source) {
        (Some(token), Some(source)) => println!("token:          {} ({})", mask(token), source),
        _ => println!("token:          <none>"),
    }
    match (target.chat_id(), chat_id_source) {
        (Some(chat_id), Some(source)) => println!("chat id:        {} ({})", chat_id, source),
        _ => println!("chat id:        <none>"),
    }
}

async fn send(env: &Environment, text: &str) -> Result<()> {
    let target = modelwatch_core::resolve_delivery_target(env);
    if target.token().is_none() {
        return Err(WatchError::IncompleteTarget("bot token"));
    }
    if target.chat_id().is_none() {
        return Err(WatchError::IncompleteTarget("chat id"));
    }

    Notifier::telegram().notify(&target, text).await;
    Ok(())
}

/// Show at most the first quarter of a token, nothing of short ones.
fn mask(token: &str) -> String {
    let len = token.chars().count();
    if len < 12 {
        return "****".to_string();
    }
    let prefix: String = token.chars().take(len / 4).collect();
    format!("{}…", prefix)
}
