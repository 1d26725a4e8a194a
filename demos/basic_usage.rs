//! Basic usage example for the stream storage client
//!
//! This example demonstrates:
//! - Creating a stream with a time to live
//! - Writing bytes to it
//! - Reading them back chunk by chunk
//! - Handling a locked stream
//!
//! Run with: cargo run --example basic_usage

use futures::StreamExt;
use std::time::Duration;
use stream_client::{CallOptions, ClientConfig, ClientError, StreamClient, StreamConfiguration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = ClientConfig::new("http://localhost:8080")
        .with_timeout(Duration::from_secs(10))
        .with_keepalive(true);
    let client = StreamClient::new(config)?;

    println!("Creating stream 'demo' (expires in 5 minutes)...");
    let ttl = StreamConfiguration::expiring_after(Duration::from_secs(300));
    match client.create_stream("demo", &ttl, CallOptions::default()).await {
        Ok(()) => println!("   created"),
        Err(ClientError::StreamLocked { .. }) => {
            println!("   stream is locked, try again later");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    println!("Writing to 'demo'...");
    client
        .write_stream("demo", "Hello from the stream client!", CallOptions::default())
        .await?;

    println!("Reading 'demo' (no timeout for this call)...");
    let mut body = client
        .read_stream("demo", CallOptions::new().without_timeout())
        .await?;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        println!("   {} bytes: {}", chunk.len(), String::from_utf8_lossy(&chunk));
    }

    Ok(())
}
