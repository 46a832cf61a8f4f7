//! Core types used throughout the library.
//!
//! Identifiers passed to the command templates, the signal set accepted by
//! SIGNAL, and the lifecycle state of a control connection.

use crate::error::ControlError;
use std::fmt;
use std::str::FromStr;

/// A circuit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitId(pub u64);

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CircuitId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CircuitId(s.parse()?))
    }
}

/// A stream identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StreamId(s.parse()?))
    }
}

/// A signal that can be sent via the SIGNAL command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Reload: reload config items.
    Reload,
    /// Same as [`Signal::Reload`].
    Hup,
    /// Controlled shutdown.
    Shutdown,
    /// Same as [`Signal::Shutdown`].
    Int,
    /// Dump stats.
    Dump,
    /// Same as [`Signal::Dump`].
    Usr1,
    /// Switch all open logs to loglevel debug.
    Debug,
    /// Same as [`Signal::Debug`].
    Usr2,
    /// Immediate shutdown.
    Halt,
    /// Same as [`Signal::Halt`].
    Term,
    /// Switch to clean circuits.
    NewNym,
    /// Forget client-side cached IPs.
    ClearDnsCache,
    /// Dump an unscheduled heartbeat message.
    Heartbeat,
    /// Become "dormant".
    Dormant,
    /// Stop being "dormant".
    Active,
}

impl Signal {
    /// Every signal, in wire-name order of the control-spec.
    pub const ALL: [Signal; 15] = [
        Signal::Reload,
        Signal::Hup,
        Signal::Shutdown,
        Signal::Int,
        Signal::Dump,
        Signal::Usr1,
        Signal::Debug,
        Signal::Usr2,
        Signal::Halt,
        Signal::Term,
        Signal::NewNym,
        Signal::ClearDnsCache,
        Signal::Heartbeat,
        Signal::Dormant,
        Signal::Active,
    ];

    /// Get the signal name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Reload => "RELOAD",
            Signal::Hup => "HUP",
            Signal::Shutdown => "SHUTDOWN",
            Signal::Int => "INT",
            Signal::Dump => "DUMP",
            Signal::Usr1 => "USR1",
            Signal::Debug => "DEBUG",
            Signal::Usr2 => "USR2",
            Signal::Halt => "HALT",
            Signal::Term => "TERM",
            Signal::NewNym => "NEWNYM",
            Signal::ClearDnsCache => "CLEARDNSCACHE",
            Signal::Heartbeat => "HEARTBEAT",
            Signal::Dormant => "DORMANT",
            Signal::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Signal {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Signal::ALL
            .iter()
            .copied()
            .find(|signal| signal.as_str() == upper)
            .ok_or_else(|| ControlError::InvalidArgument(format!("Unknown signal '{}'", s)))
    }
}

/// Lifecycle state of a control connection.
///
/// Transitions only move forward:
/// `Unauthenticated -> Authenticated -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket yet, or the last connect attempt failed.
    Unauthenticated,
    /// Socket open and AUTHENTICATE accepted; commands may be sent.
    Authenticated,
    /// Quit, closed, or torn down after a transport failure.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Unauthenticated => "unauthenticated",
            ConnectionState::Authenticated => "authenticated",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}
