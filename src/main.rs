mod cli;
mod logging;

use anyhow::Result;
use chat_wait::{
    Bridge, BridgeConfig, ChatWaitConfig, ContentKind, Context, Platform, SenderId, SessionId,
    handler,
};
use clap::{Parser, Subcommand};
use cli::{ConsolePlatform, OutputMode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "chatwait")]
#[command(about = "Wait for chat replies inside a handler - console demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the user and project layers)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session id given to stdin messages
    #[arg(long, global = true, default_value_t = 1)]
    session: i64,

    /// Sender id given to stdin messages
    #[arg(long, global = true, default_value_t = 1)]
    sender: i64,

    /// Print outbound payloads as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Suppress normal output
    #[arg(long, global = true)]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Write logs to a timestamped file under the config directory
    #[arg(long, global = true, conflicts_with = "log_file")]
    save_log: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for one message and echo it back
    Echo {
        /// Content kind to accept (text, photo, sticker, any, ...)
        #[arg(long, default_value = "text")]
        kind: ContentKind,

        /// Listen timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run the number form
    Form {
        /// Form timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Delay after each message step, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChatWaitConfig::load_file(path)?,
        None => ChatWaitConfig::load(None)?,
    };

    let log_file = if cli.save_log {
        Some(logging::default_log_path(cli.session)?)
    } else {
        cli.log_file.clone().or_else(|| config.logging.file_path())
    };
    logging::init_logging(cli.debug, cli.quiet, log_file)?;

    if let Commands::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };
    let platform: Arc<dyn Platform> = Arc::new(ConsolePlatform::new(mode));
    let session = SessionId(cli.session);
    let sender = SenderId(cli.sender);

    let bridge = Bridge::new(
        BridgeConfig::from_config(&config)
            .with_timeout_handler(handler(|ctx: Context| async move {
                let _ = ctx.send("You took too long to answer.").await;
            }))
            .with_cancel_handler(handler(|ctx: Context| async move {
                let _ = ctx.send("Cancelled.").await;
            })),
    );

    // Lines nobody is waiting for end up here
    let pipeline = bridge.middleware(handler(|ctx: Context| async move {
        if let Some(message) = ctx.message() {
            tracing::info!(text = %message.text, "Unhandled message");
        }
    }));

    tokio::spawn({
        let platform = platform.clone();
        async move {
            if let Err(e) = cli::pump_stdin(platform, pipeline, session, sender).await {
                tracing::error!("stdin: {}", e);
            }
        }
    });

    let ctx = Context::for_session(platform, session);
    let conversation = async {
        match cli.command {
            Commands::Echo { kind, timeout } => {
                cli::demo::echo(&bridge, &ctx, kind, timeout.map(Duration::from_secs)).await
            }
            Commands::Form { timeout, delay_ms } => cli::demo::form(
                &bridge,
                &ctx,
                timeout.map(Duration::from_secs),
                delay_ms.map(Duration::from_millis),
            )
            .await
            .map(|_| ()),
            Commands::Config => Ok(()),
        }
    };

    tokio::select! {
        result = conversation => result?,
        signal = cli::shutdown_signal() => signal?,
    }

    Ok(())
}
