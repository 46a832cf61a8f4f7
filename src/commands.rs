//! Command helpers layered on [`ControlConnection::send_command`].
//!
//! Each helper builds one command line from its keyword and arguments and
//! returns the raw [`Reply`]; none of them interpret the status code.

use crate::connection::ControlConnection;
use crate::error::Result;
use crate::protocol::{format_command, Reply};
use crate::types::{CircuitId, Signal, StreamId};

impl ControlConnection {
    // ==================== Configuration ====================

    /// Set configuration values (`SETCONF <request>`).
    pub async fn set_conf(&mut self, request: &str) -> Result<Reply> {
        self.send_command(&format_command("SETCONF", &[request])).await
    }

    /// Reset configuration values to their defaults (`RESETCONF <request>`).
    pub async fn reset_conf(&mut self, request: &str) -> Result<Reply> {
        self.send_command(&format_command("RESETCONF", &[request])).await
    }

    /// Get configuration values (`GETCONF <request>`).
    pub async fn get_conf(&mut self, request: &str) -> Result<Reply> {
        self.send_command(&format_command("GETCONF", &[request])).await
    }

    /// `GETEVENTS <request>`.
    pub async fn get_events(&mut self, request: &str) -> Result<Reply> {
        self.send_command(&format_command("GETEVENTS", &[request])).await
    }

    /// Save configuration to disk (`SAVECONF <request>`).
    ///
    /// Pass `""` for a plain `SAVECONF` or `"FORCE"` to overwrite a torrc
    /// that includes other files.
    pub async fn save_conf(&mut self, request: &str) -> Result<Reply> {
        self.send_command(&format_command("SAVECONF", &[request])).await
    }

    // ==================== Signals ====================

    /// Send a signal (`SIGNAL <name>`).
    pub async fn signal(&mut self, signal: Signal) -> Result<Reply> {
        self.send_command(&format_command("SIGNAL", &[signal.as_str()])).await
    }

    /// `SIGNAL RELOAD`.
    pub async fn signal_reload(&mut self) -> Result<Reply> {
        self.signal(Signal::Reload).await
    }

    /// `SIGNAL HUP`.
    pub async fn signal_hup(&mut self) -> Result<Reply> {
        self.signal(Signal::Hup).await
    }

    /// `SIGNAL SHUTDOWN`.
    pub async fn signal_shutdown(&mut self) -> Result<Reply> {
        self.signal(Signal::Shutdown).await
    }

    /// `SIGNAL DUMP`.
    pub async fn signal_dump(&mut self) -> Result<Reply> {
        self.signal(Signal::Dump).await
    }

    /// `SIGNAL USR1`.
    pub async fn signal_usr1(&mut self) -> Result<Reply> {
        self.signal(Signal::Usr1).await
    }

    /// `SIGNAL DEBUG`.
    pub async fn signal_debug(&mut self) -> Result<Reply> {
        self.signal(Signal::Debug).await
    }

    /// `SIGNAL USR2`.
    pub async fn signal_usr2(&mut self) -> Result<Reply> {
        self.signal(Signal::Usr2).await
    }

    /// `SIGNAL HALT`.
    pub async fn signal_halt(&mut self) -> Result<Reply> {
        self.signal(Signal::Halt).await
    }

    /// `SIGNAL TERM`.
    pub async fn signal_term(&mut self) -> Result<Reply> {
        self.signal(Signal::Term).await
    }

    /// `SIGNAL INT`.
    pub async fn signal_int(&mut self) -> Result<Reply> {
        self.signal(Signal::Int).await
    }

    /// Request a new identity (`SIGNAL NEWNYM`).
    pub async fn signal_newnym(&mut self) -> Result<Reply> {
        self.signal(Signal::NewNym).await
    }

    /// Clear the DNS cache (`SIGNAL CLEARDNSCACHE`).
    pub async fn signal_clear_dns_cache(&mut self) -> Result<Reply> {
        self.signal(Signal::ClearDnsCache).await
    }

    // ==================== Information ====================

    /// Map an address (`MAPADDRESS <address>`), e.g. `"1.2.3.4=torproject.org"`.
    pub async fn map_address(&mut self, address: &str) -> Result<Reply> {
        self.send_command(&format_command("MAPADDRESS", &[address])).await
    }

    /// Get information from the daemon (`GETINFO <key>`).
    pub async fn get_info(&mut self, key: &str) -> Result<Reply> {
        self.get_info_multi(&[key]).await
    }

    /// Get several info values at once; keys are sent space-separated in order.
    pub async fn get_info_multi(&mut self, keys: &[&str]) -> Result<Reply> {
        self.send_command(&format_command("GETINFO", keys)).await
    }

    // ==================== Circuits and streams ====================

    /// Build or extend a circuit
    /// (`EXTENDCIRCUIT <id> [<superspec>] [<purpose>]`).
    ///
    /// Use `CircuitId(0)` to ask for a new circuit.
    pub async fn extend_circuit(
        &mut self,
        circuit_id: CircuitId,
        superspec: Option<&str>,
        purpose: Option<&str>,
    ) -> Result<Reply> {
        let id = circuit_id.to_string();
        let cmd = format_command(
            "EXTENDCIRCUIT",
            &[id.as_str(), superspec.unwrap_or_default(), purpose.unwrap_or_default()],
        );
        self.send_command(&cmd).await
    }

    /// Change a circuit's purpose (`SETCIRCUITPURPOSE <id> purpose=<purpose>`).
    pub async fn set_circuit_purpose(
        &mut self,
        circuit_id: CircuitId,
        purpose: &str,
    ) -> Result<Reply> {
        let id = circuit_id.to_string();
        let purpose = format!("purpose={}", purpose);
        let cmd = format_command("SETCIRCUITPURPOSE", &[id.as_str(), purpose.as_str()]);
        self.send_command(&cmd).await
    }

    /// Change a router's purpose (`SETROUTERPURPOSE <nickname|key> <purpose>`).
    pub async fn set_router_purpose(
        &mut self,
        nickname_or_key: &str,
        purpose: &str,
    ) -> Result<Reply> {
        let cmd = format_command("SETROUTERPURPOSE", &[nickname_or_key, purpose]);
        self.send_command(&cmd).await
    }

    /// Attach a stream to a circuit (`ATTACHSTREAM <stream> <circuit> [HOP=<n>]`).
    ///
    /// `hop` is passed through as given, e.g. `Some("HOP=2")`.
    pub async fn attach_stream(
        &mut self,
        stream_id: StreamId,
        circuit_id: CircuitId,
        hop: Option<&str>,
    ) -> Result<Reply> {
        let stream = stream_id.to_string();
        let circuit = circuit_id.to_string();
        let cmd = format_command(
            "ATTACHSTREAM",
            &[stream.as_str(), circuit.as_str(), hop.unwrap_or_default()],
        );
        self.send_command(&cmd).await
    }
}
