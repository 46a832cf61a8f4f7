//! Control connection: socket lifecycle, handshake and command exchange.
//!
//! A [`ControlConnection`] owns the TCP socket to the control port. It is
//! created unconnected, authenticates in [`ControlConnection::connect`], and
//! then exchanges exactly one reply line per command in
//! [`ControlConnection::send_command`].

use crate::config::ControlConfig;
use crate::error::{ControlError, Result};
use crate::protocol::{authenticate_command, encode_line, Reply, STATUS_OK};
use crate::types::ConnectionState;

use std::fmt;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Buffered halves of the control socket.
struct Transport {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

/// What a single line read produced.
enum ReadOutcome {
    /// A complete line, terminator included.
    Line(String),
    /// The peer closed the stream; holds whatever partial line arrived.
    Eof(String),
    /// The length limit was reached before a terminator.
    Overlong(String),
}

impl Transport {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        }
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }

    /// Read up to and including the next `\n`, across as many TCP
    /// deliveries as it takes. Bytes past the line stay buffered.
    async fn read_line(&mut self, limit: usize) -> io::Result<ReadOutcome> {
        let mut buf = Vec::new();
        let read = AsyncReadExt::take(&mut self.reader, limit as u64)
            .read_until(b'\n', &mut buf)
            .await?;

        let text = String::from_utf8_lossy(&buf).into_owned();
        Ok(if read > 0 && buf.ends_with(b"\n") {
            ReadOutcome::Line(text)
        } else if buf.len() >= limit {
            ReadOutcome::Overlong(text)
        } else {
            ReadOutcome::Eof(text)
        })
    }
}

/// Await `fut`, failing with [`ControlError::Timeout`] once `limit` elapses.
async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ControlError::Timeout)?,
        None => fut.await,
    }
}

/// A client connection to a control port.
///
/// Commands take `&mut self`, so at most one exchange is outstanding per
/// connection and each reply is paired with the command that caused it.
pub struct ControlConnection {
    config: ControlConfig,
    state: ConnectionState,
    transport: Option<Transport>,
    /// Set while a command is written but its reply not yet read.
    in_flight: bool,
}

impl ControlConnection {
    /// Create an unconnected control connection.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Unauthenticated,
            transport: None,
            in_flight: false,
        }
    }

    /// Create a connection from `config`, connect and authenticate it.
    pub async fn open(config: ControlConfig) -> Result<Self> {
        let mut connection = Self::new(config);
        connection.connect().await?;
        Ok(connection)
    }

    /// Connect to the default control port (localhost:9051) with an empty secret.
    pub async fn open_default() -> Result<Self> {
        Self::open(ControlConfig::default()).await
    }

    /// The configuration this connection was created with.
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether commands can be sent.
    pub fn is_authenticated(&self) -> bool {
        self.state == ConnectionState::Authenticated
    }

    /// Open the socket and perform the AUTHENTICATE handshake.
    ///
    /// Resolves with the daemon's `250` reply. A transport failure yields
    /// [`ControlError::Connection`]; any other handshake reply, garbage, or
    /// the daemon hanging up yields [`ControlError::Authentication`] with
    /// the raw data received. After a failure the connection stays
    /// unauthenticated and `connect` may be retried.
    pub async fn connect(&mut self) -> Result<Reply> {
        if self.state != ConnectionState::Unauthenticated {
            return Err(ControlError::InvalidState(self.state));
        }

        let line = encode_line(&authenticate_command(&self.config.password))?;
        let address = self.config.address();
        debug!("Connecting to control port at {}", address);

        let stream = with_timeout(Some(self.config.connect_timeout), async {
            TcpStream::connect((self.config.host.as_str(), self.config.port))
                .await
                .map_err(|source| connection_error(&address, source))
        })
        .await?;
        stream
            .set_nodelay(true)
            .map_err(|source| connection_error(&address, source))?;

        let mut transport = Transport::new(stream);
        let reply = self.handshake(&mut transport, &address, &line).await?;

        self.transport = Some(transport);
        self.state = ConnectionState::Authenticated;
        debug!("Authenticated with control port at {}", address);
        Ok(reply)
    }

    async fn handshake(
        &self,
        transport: &mut Transport,
        address: &str,
        line: &str,
    ) -> Result<Reply> {
        trace!("Sending command: AUTHENTICATE <redacted>");
        with_timeout(Some(self.config.write_timeout), async {
            transport
                .write_line(line)
                .await
                .map_err(|source| connection_error(address, source))
        })
        .await?;

        let outcome = with_timeout(self.config.read_timeout, async {
            transport
                .read_line(self.config.max_line_length)
                .await
                .map_err(|source| connection_error(address, source))
        })
        .await?;

        let raw = match outcome {
            ReadOutcome::Line(raw) => raw,
            ReadOutcome::Eof(raw) | ReadOutcome::Overlong(raw) => {
                return Err(ControlError::Authentication { raw });
            }
        };
        trace!("Received line: {}", raw.trim_end());

        match Reply::parse(&raw) {
            Ok(reply) if reply.code == STATUS_OK => Ok(reply),
            _ => Err(ControlError::Authentication { raw }),
        }
    }

    /// Send one command line and await its reply.
    ///
    /// `command` is sent as-is followed by CRLF. The reply's status code is
    /// not interpreted: a `552` reply is returned as `Ok`. Transport errors,
    /// timeouts, broken line framing and the daemon hanging up close the
    /// connection; [`ControlError::is_fatal`] is true for exactly those.
    pub async fn send_command(&mut self, command: &str) -> Result<Reply> {
        if self.in_flight {
            warn!("Previous command was interrupted before its reply; closing connection");
            self.close();
            return Err(ControlError::Interrupted);
        }
        if self.state != ConnectionState::Authenticated {
            return Err(ControlError::NotConnected);
        }
        let Some(transport) = self.transport.as_mut() else {
            return Err(ControlError::NotConnected);
        };
        let line = encode_line(command)?;

        trace!("Sending command: {}", command);
        self.in_flight = true;
        let outcome = exchange(transport, &self.config, &line).await;
        self.in_flight = false;

        match outcome {
            Ok(ReadOutcome::Line(raw)) => {
                trace!("Received line: {}", raw.trim_end());
                Reply::parse(&raw)
            }
            Ok(ReadOutcome::Eof(raw)) => {
                debug!("Control port closed the connection");
                self.close();
                if raw.is_empty() {
                    Err(ControlError::ConnectionClosed)
                } else {
                    Err(ControlError::MalformedStream { raw })
                }
            }
            Ok(ReadOutcome::Overlong(raw)) => {
                warn!(
                    "Reply line exceeds {} bytes; closing connection",
                    self.config.max_line_length
                );
                self.close();
                Err(ControlError::MalformedStream { raw })
            }
            Err(err) => {
                if matches!(err, ControlError::Timeout) {
                    warn!("Timed out waiting for reply to '{}'; closing connection", command);
                }
                self.close();
                Err(err)
            }
        }
    }

    /// Send QUIT, then close the connection whatever the reply.
    pub async fn quit(&mut self) -> Result<Reply> {
        let result = self.send_command("QUIT").await;
        if !matches!(result, Err(ControlError::NotConnected)) {
            self.close();
        }
        result
    }

    /// Drop the socket and move to [`ConnectionState::Closed`].
    ///
    /// Dropping the write half shuts the socket down for writing. Calling
    /// this more than once is harmless.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("Closed control connection to {}", self.config.address());
        }
        self.in_flight = false;
        self.state = ConnectionState::Closed;
    }
}

/// Write one framed command and read one line back.
async fn exchange(
    transport: &mut Transport,
    config: &ControlConfig,
    line: &str,
) -> Result<ReadOutcome> {
    with_timeout(Some(config.write_timeout), async {
        transport.write_line(line).await.map_err(ControlError::Transport)
    })
    .await?;

    with_timeout(config.read_timeout, async {
        transport
            .read_line(config.max_line_length)
            .await
            .map_err(ControlError::Transport)
    })
    .await
}

fn connection_error(address: &str, source: io::Error) -> ControlError {
    ControlError::Connection {
        address: address.to_string(),
        source,
    }
}

impl fmt::Debug for ControlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlConnection")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_is_unauthenticated() {
        let connection = ControlConnection::new(ControlConfig::default());
        assert_eq!(connection.state(), ConnectionState::Unauthenticated);
        assert!(!connection.is_authenticated());
    }

    #[tokio::test]
    async fn test_send_before_connect() {
        let mut connection = ControlConnection::new(ControlConfig::default());
        let result = connection.send_command("GETINFO version").await;
        assert!(matches!(result, Err(ControlError::NotConnected)));
        assert_eq!(connection.state(), ConnectionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_quit_before_connect_keeps_state() {
        let mut connection = ControlConnection::new(ControlConfig::default());
        assert!(matches!(
            connection.quit().await,
            Err(ControlError::NotConnected)
        ));
        assert_eq!(connection.state(), ConnectionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_close_is_final() {
        let mut connection = ControlConnection::new(ControlConfig::default());
        connection.close();
        connection.close();
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(matches!(
            connection.connect().await,
            Err(ControlError::InvalidState(ConnectionState::Closed))
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_elapses() {
        let result: Result<()> = with_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ControlError::Timeout)));
    }

    #[tokio::test]
    async fn test_with_timeout_none_waits() {
        let result = with_timeout(None, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_debug_hides_password() {
        let connection = ControlConnection::new(ControlConfig::default().password("hunter2"));
        assert!(!format!("{:?}", connection).contains("hunter2"));
    }
}
