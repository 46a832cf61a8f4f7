//! # Test Utilities
//!
//! Reply builders, fixtures and a scripted mock control port for testing
//! code that talks to a daemon through [`ControlConnection`](crate::ControlConnection).
//!
//! ## Mock Server
//!
//! ```rust,no_run
//! use torctl::test_utils::{MockAction, MockControlServer, MockReply};
//! use torctl::ControlConnection;
//!
//! # async fn example() -> std::io::Result<()> {
//! let server = MockControlServer::start(vec![
//!     MockReply::ok().into(),                     // AUTHENTICATE
//!     MockReply::new(250, "version=0.4.7").into(), // GETINFO version
//! ])
//! .await?;
//!
//! let mut connection = ControlConnection::new(server.config());
//! connection.connect().await.unwrap();
//! let reply = connection.get_info("version").await.unwrap();
//! assert_eq!(reply.message, "version=0.4.7");
//! assert_eq!(server.received().await[1], "GETINFO version\r\n");
//! # Ok(())
//! # }
//! ```

use crate::config::ControlConfig;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Pause between the chunks of a fragmented reply.
pub const CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Pre-built wire fixtures.
pub mod fixtures {
    /// Successful AUTHENTICATE reply.
    pub fn auth_ok_response() -> &'static str {
        "250 OK\r\n"
    }

    /// Rejected AUTHENTICATE reply.
    pub fn bad_auth_response() -> &'static str {
        "515 Bad authentication\r\n"
    }

    /// Single-line GETINFO version reply.
    pub fn version_response() -> &'static str {
        "250 version=0.4.7\r\n"
    }

    /// Sample error reply.
    pub fn error_response() -> &'static str {
        "552 Unrecognized key \"nonexistent\"\r\n"
    }
}

/// Builder for one reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    code: u16,
    message: String,
}

impl MockReply {
    /// A reply with the given code and message.
    pub fn new(code: u16, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    /// `250 OK`.
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// Build the wire line, CRLF included.
    pub fn build(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }

    /// Deliver this reply in two writes, split after `at` bytes.
    pub fn split_at(&self, at: usize) -> MockAction {
        let line = self.build().into_bytes();
        let at = at.min(line.len());
        MockAction::Reply(vec![line[..at].to_vec(), line[at..].to_vec()])
    }
}

impl From<MockReply> for MockAction {
    fn from(reply: MockReply) -> Self {
        MockAction::Reply(vec![reply.build().into_bytes()])
    }
}

/// What the mock server does after receiving one line.
#[derive(Debug, Clone)]
pub enum MockAction {
    /// Write these chunks, pausing [`CHUNK_DELAY`] between them.
    Reply(Vec<Vec<u8>>),
    /// Send nothing and keep the connection open.
    Silent,
    /// Close the connection cleanly.
    Close,
    /// Write these bytes, then close the connection cleanly.
    SendAndClose(Vec<u8>),
    /// Abort the connection with a TCP reset.
    Reset,
}

impl MockAction {
    /// Reply with raw text, sent in one write.
    pub fn raw(text: &str) -> Self {
        MockAction::Reply(vec![text.as_bytes().to_vec()])
    }
}

/// A one-connection mock control port on the loopback interface.
///
/// Each line the client sends is recorded and answered by the next action
/// of the script. Once the script runs out, lines are still recorded but
/// never answered.
pub struct MockControlServer {
    address: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl MockControlServer {
    /// Bind an ephemeral port and start serving `script`.
    pub async fn start(script: Vec<MockAction>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn(serve(listener, script, Arc::clone(&received)));

        Ok(Self {
            address,
            received,
            task,
        })
    }

    /// The bound address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// A client configuration pointing at this server, with an empty secret.
    pub fn config(&self) -> ControlConfig {
        ControlConfig::new(self.address.ip().to_string(), self.address.port(), "")
    }

    /// Every line received so far, terminators included.
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

impl Drop for MockControlServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    listener: TcpListener,
    script: Vec<MockAction>,
    received: Arc<Mutex<Vec<String>>>,
) {
    let Ok((stream, _)) = listener.accept().await else {
        return;
    };
    let _ = stream.set_nodelay(true);

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut script = script.into_iter();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => received.lock().await.push(line),
        }

        match script.next() {
            Some(MockAction::Reply(chunks)) => {
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(CHUNK_DELAY).await;
                    }
                    if write_half.write_all(chunk).await.is_err() {
                        return;
                    }
                    let _ = write_half.flush().await;
                }
            }
            Some(MockAction::Silent) | None => {}
            Some(MockAction::Close) => return,
            Some(MockAction::SendAndClose(bytes)) => {
                let _ = write_half.write_all(&bytes).await;
                let _ = write_half.shutdown().await;
                return;
            }
            Some(MockAction::Reset) => {
                if let Ok(stream) = reader.into_inner().reunite(write_half) {
                    reset(stream);
                }
                return;
            }
        }
    }
}

/// Drop `stream` with a zero linger so the kernel sends RST instead of FIN.
#[allow(deprecated)]
fn reset(stream: TcpStream) {
    let _ = stream.set_linger(Some(Duration::ZERO));
    drop(stream);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reply_ok() {
        assert_eq!(MockReply::ok().build(), "250 OK\r\n");
        assert_eq!(MockReply::ok().build(), fixtures::auth_ok_response());
    }

    #[test]
    fn test_mock_reply_error() {
        let reply = MockReply::new(515, "Bad authentication");
        assert_eq!(reply.build(), fixtures::bad_auth_response());
    }

    #[test]
    fn test_mock_reply_split() {
        match MockReply::ok().split_at(2) {
            MockAction::Reply(chunks) => {
                assert_eq!(chunks, vec![b"25".to_vec(), b"0 OK\r\n".to_vec()]);
            }
            other => panic!("Expected Reply, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_reply_split_past_end() {
        match MockReply::ok().split_at(100) {
            MockAction::Reply(chunks) => {
                assert_eq!(chunks[0], b"250 OK\r\n".to_vec());
                assert!(chunks[1].is_empty());
            }
            other => panic!("Expected Reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_records_lines() {
        let server = MockControlServer::start(vec![MockAction::raw("250 OK\r\n")])
            .await
            .unwrap();

        let stream = TcpStream::connect(server.address()).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        write_half.write_all(b"PING\r\n").await.unwrap();

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        assert_eq!(line, "250 OK\r\n");
        assert_eq!(server.received().await, vec!["PING\r\n".to_string()]);
    }
}
