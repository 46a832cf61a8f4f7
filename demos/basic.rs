//! Example: Basic connection and authentication
//!
//! Connects to the control port, authenticates with a password and asks
//! the daemon for its version.
//!
//! Run with: cargo run --example basic
//!
//! Set TOR_CONTROL_HOST, TOR_CONTROL_PORT and TOR_CONTROL_PASSWORD to point
//! at a daemon other than localhost:9051 with an empty password.

use torctl::{ControlConfig, ControlConnection, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (optional)
    tracing_subscriber::fmt::init();

    let config = ControlConfig::from_env()?;
    println!("Connecting to control port at {}...", config.address());

    let mut connection = ControlConnection::new(config);
    let reply = connection.connect().await?;
    println!("Authenticated: {} {}", reply.code, reply.message);

    let reply = connection.get_info("version").await?;
    println!("\nGETINFO version -> {} {}", reply.code, reply.message);

    // Any command can be sent as a raw line
    let reply = connection.send_command("GETINFO traffic/read").await?;
    if reply.is_success() {
        println!("Traffic read: {}", reply.message);
    } else {
        println!("Daemon answered {}: {}", reply.code, reply.message);
    }

    connection.quit().await?;
    println!("\nDisconnected.");

    Ok(())
}
