//! # torctl
//!
//! An async client for the Tor control protocol, focused on the part of the
//! protocol with real semantics: the password handshake and the exchange of
//! one single-line reply per command.
//!
//! - Authenticate with `AUTHENTICATE "<secret>"`
//! - Send any command line and get back its parsed [`Reply`]
//! - Thin helpers for GETCONF, SETCONF, SIGNAL, GETINFO, EXTENDCIRCUIT, ...
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use torctl::{ControlConfig, ControlConnection, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ControlConfig::new("localhost", 9051, "secret");
//!     let mut connection = ControlConnection::new(config);
//!
//!     let reply = connection.connect().await?;
//!     println!("Authenticated: {} {}", reply.code, reply.message);
//!
//!     let reply = connection.get_info("version").await?;
//!     println!("{}", reply.message);
//!
//!     connection.signal_newnym().await?;
//!     connection.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Replies
//!
//! Every command resolves with exactly one [`Reply`]: the status code, the
//! rest of the line, and the raw data received. The connection does not
//! decide which codes are failures; use [`Reply::into_result`] to turn
//! non-success codes into [`ControlError::CommandRejected`]:
//!
//! ```rust,no_run
//! # use torctl::ControlConnection;
//! # async fn example(connection: &mut ControlConnection) -> torctl::Result<()> {
//! let reply = connection.get_conf("SocksPort").await?.into_result()?;
//! println!("{}", reply.message);
//! # Ok(())
//! # }
//! ```
//!
//! ## One command at a time
//!
//! Replies are paired with commands purely by order, so a connection runs a
//! single exchange at a time. Every command method takes `&mut self`; share a
//! connection between tasks by wrapping it in a mutex.
//!
//! ## Feature Flags
//!
//! - `tokio-runtime` (default): the TCP connection, command helpers and
//!   test utilities, built on Tokio.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

#[cfg(feature = "tokio-runtime")]
mod commands;
#[cfg(feature = "tokio-runtime")]
pub mod connection;
#[cfg(feature = "tokio-runtime")]
pub mod test_utils;

// Re-export main types for convenience
pub use error::{ControlError, Result, StatusCode};

#[cfg(feature = "tokio-runtime")]
pub use connection::ControlConnection;

pub use config::ControlConfig;
pub use protocol::{parse_reply, Reply};
pub use types::{CircuitId, ConnectionState, Signal, StreamId};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default control port.
pub const DEFAULT_CONTROL_PORT: u16 = config::DEFAULT_PORT;
