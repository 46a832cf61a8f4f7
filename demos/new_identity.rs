//! Example: New identity (circuit rotation)
//!
//! Asks the daemon to switch to clean circuits with SIGNAL NEWNYM.
//!
//! Run with: cargo run --example new_identity

use std::time::Duration;
use torctl::{ControlConfig, ControlConnection, Result, Signal};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("Connecting to control port...");
    let mut connection = ControlConnection::open(ControlConfig::from_env()?).await?;
    println!("Connected and authenticated!\n");

    println!("Requesting new identity (NEWNYM signal)...");
    connection.signal_newnym().await?.into_result()?;
    println!("New identity requested!");

    // NEWNYM is rate limited by the daemon; a second request right away
    // is accepted but may be deferred.
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("\nClearing the DNS cache...");
    let reply = connection.signal(Signal::ClearDnsCache).await?;
    println!("SIGNAL {} -> {} {}", Signal::ClearDnsCache, reply.code, reply.message);

    connection.quit().await?;
    println!("\nDone!");

    Ok(())
}
