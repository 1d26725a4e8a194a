//! stream-cli - command line client for the stream storage service

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use stream_client::{
    Body, CallOptions, CancellationToken, ClientConfig, StreamClient, StreamConfiguration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stream-cli")]
#[command(about = "Create, write and read streams on a stream storage server")]
#[command(version)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://localhost:8080", env = "STREAM_SERVER")]
    server: String,

    /// Basic auth user name
    #[arg(long, env = "STREAM_USERNAME", requires = "password")]
    username: Option<String>,

    /// Basic auth password
    #[arg(long, env = "STREAM_PASSWORD", requires = "username")]
    password: Option<String>,

    /// Default timeout in milliseconds (0 disables it)
    #[arg(long, env = "STREAM_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Keep connections alive by default
    #[arg(long, env = "STREAM_KEEPALIVE")]
    keepalive: bool,

    /// Enable debug logging
    #[arg(short, long, env = "STREAM_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a stream
    Create {
        /// Stream id
        id: String,
        /// Time to live in milliseconds; the stream never expires without it
        #[arg(long)]
        ttl_ms: Option<u64>,
        #[command(flatten)]
        call: CallArgs,
    },
    /// Write a file (or stdin) to a stream
    Write {
        /// Stream id
        id: String,
        /// File to send instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[command(flatten)]
        call: CallArgs,
    },
    /// Read a stream to stdout
    Read {
        /// Stream id
        id: String,
        #[command(flatten)]
        call: CallArgs,
    },
}

/// Per-call overrides shared by every subcommand
#[derive(clap::Args, Debug, Default)]
struct CallArgs {
    /// Timeout for this call in milliseconds
    #[arg(long, conflicts_with = "no_timeout")]
    call_timeout_ms: Option<u64>,

    /// Disable the timeout for this call
    #[arg(long)]
    no_timeout: bool,

    /// Keepalive for this call
    #[arg(long)]
    call_keepalive: Option<bool>,
}

impl CallArgs {
    fn options(&self, signal: CancellationToken) -> CallOptions {
        let mut options = CallOptions::new().with_signal(signal);
        if self.no_timeout {
            options = options.without_timeout();
        } else if let Some(ms) = self.call_timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        options.keepalive = self.call_keepalive;
        options
    }
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.server).with_keepalive(self.keepalive);
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            config = config.with_basic_auth(username, password);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so `read` output stays clean
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("stream_cli={},stream_client={}", log_level, log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = StreamClient::new(args.client_config())?;
    tracing::debug!("Using server {}", client.config().server);

    // Ctrl-C cancels whatever call is in flight
    let interrupt = CancellationToken::new();
    tokio::spawn({
        let interrupt = interrupt.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted");
                interrupt.cancel();
            }
        }
    });

    match &args.command {
        Command::Create { id, ttl_ms, call } => {
            let configuration = StreamConfiguration { time_to_live: *ttl_ms };
            client
                .create_stream(id, &configuration, call.options(interrupt.clone()))
                .await
                .with_context(|| format!("failed to create stream {}", id))?;
            tracing::info!("Created stream {}", id);
        }
        Command::Write { id, file, call } => {
            let payload = match file {
                Some(path) => Body::reader(
                    tokio::fs::File::open(path)
                        .await
                        .with_context(|| format!("failed to open {}", path.display()))?,
                ),
                None => Body::reader(tokio::io::stdin()),
            };
            client
                .write_stream(id, payload, call.options(interrupt.clone()))
                .await
                .with_context(|| format!("failed to write stream {}", id))?;
            tracing::info!("Wrote stream {}", id);
        }
        Command::Read { id, call } => {
            let body = client
                .read_stream(id, call.options(interrupt.clone()))
                .await
                .with_context(|| format!("failed to read stream {}", id))?;
            let mut reader = body.into_async_read();
            let mut stdout = tokio::io::stdout();
            let copied = tokio::io::copy(&mut reader, &mut stdout)
                .await
                .with_context(|| format!("failed while reading stream {}", id))?;
            tracing::debug!("Read {} bytes from stream {}", copied, id);
        }
    }

    Ok(())
}
