//! Configuration management example for torctl.
//!
//! Queries and modifies the daemon's runtime configuration using the
//! GETCONF, SETCONF and RESETCONF commands.
//!
//! Run with: cargo run --example config
//!
//! Requires a running daemon with its control port enabled.

use torctl::{ControlConfig, ControlConnection, ControlError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("torctl=trace")
        .init();

    println!("Connecting to control port...");
    let mut connection = ControlConnection::open(ControlConfig::from_env()?).await?;
    println!("Connected and authenticated!\n");

    // ========================================
    // Reading Configuration
    // ========================================
    println!("=== Reading Configuration ===\n");

    for key in ["SocksPort", "ControlPort", "MaxCircuitDirtiness"] {
        let reply = connection.get_conf(key).await?;
        println!("{} -> {} {}", key, reply.code, reply.message);
    }

    // ========================================
    // Modifying Configuration
    // ========================================
    println!("\n=== Modifying Configuration ===\n");

    println!("Setting MaxCircuitDirtiness to 600 seconds...");
    match connection
        .set_conf("MaxCircuitDirtiness=600")
        .await?
        .into_result()
    {
        Ok(_) => println!("Accepted"),
        Err(ControlError::CommandRejected { code, message }) => {
            println!("Rejected with {}: {}", code, message);
        }
        Err(e) => return Err(e),
    }

    let reply = connection.get_conf("MaxCircuitDirtiness").await?;
    println!("Now: {}", reply.message);

    println!("Resetting MaxCircuitDirtiness to default...");
    connection.reset_conf("MaxCircuitDirtiness").await?;

    let reply = connection.get_conf("MaxCircuitDirtiness").await?;
    println!("Default: {}", reply.message);

    // SAVECONF rewrites the torrc on disk; uncomment to try it:
    // connection.save_conf("").await?;

    println!("\n=== Done ===");
    connection.quit().await?;

    Ok(())
}
