// Unit Converter - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use unit_converter::server::{build_router, AppState};
use unit_converter::{init_logging, CommentError, CommentStore, Config, ConfigOverrides};

#[derive(Parser, Debug)]
#[command(name = "converter-server", version, about = "Web UI for the unit converter")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long)]
    bind: Option<String>,

    /// Comment board file
    #[arg(long)]
    comments_file: Option<PathBuf>,

    /// Directory served under /static
    #[arg(long)]
    web_dir: Option<PathBuf>,

    /// Reset a corrupt comment file to an empty board instead of refusing to start
    #[arg(long)]
    reset_corrupt: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    println!("🌐 Unit Converter - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::resolve(
        args.config.as_deref(),
        ConfigOverrides {
            comments_file: args.comments_file,
            bind_addr: args.bind,
            web_dir: args.web_dir,
        },
    )?;

    let store = match CommentStore::open(&config.comments_file) {
        Ok(store) => store,
        Err(err @ CommentError::CorruptState { .. }) if !args.reset_corrupt => {
            error!("{}", err);
            eprintln!("❌ Comment file is corrupt.");
            eprintln!("   Fix {:?} by hand, or restart with --reset-corrupt", config.comments_file);
            return Err(err.into());
        }
        Err(err @ CommentError::CorruptState { .. }) => {
            warn!("{}", err);
            CommentStore::open_or_reset(&config.comments_file)?
        }
        Err(err) => return Err(err.into()),
    };
    info!(path = ?store.path(), comments = store.len(), "comment board loaded");

    let state = AppState::new(store);
    let app = build_router(state, &config.web_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/categories", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
