//! Protocol message parsing and formatting.
//!
//! This module handles the low-level protocol details for communicating
//! with the control port: reply-line recognition, command formatting and
//! line framing.

use crate::error::{ControlError, Result, StatusCode};

/// Line terminator used in both directions.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Status code of a successful reply.
pub const STATUS_OK: u16 = 250;

/// One parsed reply, paired with the command (or handshake) that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The 1-3 digit status code.
    pub code: u16,
    /// The remainder of the reply line, without the terminator.
    pub message: String,
    /// The raw data received for this exchange.
    pub raw: String,
}

impl Reply {
    /// Parse a reply from raw inbound data.
    ///
    /// Fails with [`ControlError::InvalidResponse`] when no reply line is
    /// found anywhere in `raw`.
    pub fn parse(raw: &str) -> Result<Self> {
        match parse_reply(raw) {
            Some((code, message)) => Ok(Reply {
                code,
                message: message.to_string(),
                raw: raw.to_string(),
            }),
            None => Err(ControlError::InvalidResponse {
                raw: raw.to_string(),
            }),
        }
    }

    /// Get the status code as an enum.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code)
    }

    /// Check if this reply indicates success.
    pub fn is_success(&self) -> bool {
        self.status_code().is_success()
    }

    /// Convert this reply into a Result, returning an error if the reply indicates failure.
    ///
    /// The connection never does this on its own; it is up to the caller to
    /// decide which codes count as failures.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ControlError::CommandRejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// Find the first reply line in `chunk`.
///
/// A reply line is one to three ASCII digits, one whitespace character, a
/// message free of line breaks, and a CRLF terminator. CR, LF, U+2028 and
/// U+2029 all count as line breaks. The search is not anchored: start
/// positions are tried in order and the first match wins. Returns the
/// status code and the message text.
///
/// Runs in time linear in `chunk.len()`.
pub fn parse_reply(chunk: &str) -> Option<(u16, &str)> {
    // First line break at or after the latest message start. Message starts
    // never move backwards, so each byte is scanned for a break at most once.
    let mut line_break: Option<usize> = None;

    for start in 0..chunk.len() {
        let Some((code, message_start)) = match_status_at(chunk, start) else {
            continue;
        };
        if line_break.map_or(true, |at| at < message_start) {
            line_break = chunk[message_start..]
                .find(is_line_break)
                .map(|at| message_start + at);
        }
        // No break left means no later start can match either.
        let message_end = line_break?;
        if chunk[message_end..].starts_with(LINE_TERMINATOR) {
            return Some((code, &chunk[message_start..message_end]));
        }
    }
    None
}

/// Match a status code and its separator at `start`. Returns the code and
/// the offset where the message begins.
fn match_status_at(chunk: &str, start: usize) -> Option<(u16, usize)> {
    let digits = chunk.as_bytes()[start..]
        .iter()
        .take(4)
        .take_while(|b| b.is_ascii_digit())
        .count();
    // A fourth digit where the separator belongs rules this start out.
    if digits == 0 || digits > 3 {
        return None;
    }

    let code_end = start + digits;
    let separator = chunk[code_end..].chars().next()?;
    if !is_separator(separator) {
        return None;
    }

    let code = chunk[start..code_end].parse().ok()?;
    Some((code, code_end + separator.len_utf8()))
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{2028}' | '\u{2029}')
}

fn is_separator(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Quote the authentication secret as a protocol string.
///
/// Plain secrets are sent verbatim between double quotes; only `\` and `"`
/// are backslash-escaped so the secret cannot end the string early.
pub fn quote_secret(secret: &str) -> String {
    let mut result = String::with_capacity(secret.len() + 2);
    result.push('"');

    for c in secret.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            _ => result.push(c),
        }
    }

    result.push('"');
    result
}

/// Format the AUTHENTICATE command for `secret`.
pub fn authenticate_command(secret: &str) -> String {
    format_command("AUTHENTICATE", &[&quote_secret(secret)])
}

/// Format a command with arguments.
///
/// Arguments are joined with single spaces; empty arguments are skipped so
/// optional parts never leave trailing whitespace.
pub fn format_command(keyword: &str, args: &[&str]) -> String {
    let mut cmd = keyword.to_string();
    for arg in args.iter().filter(|a| !a.is_empty()) {
        cmd.push(' ');
        cmd.push_str(arg);
    }
    cmd
}

/// Frame a command as one wire line.
///
/// Fails with [`ControlError::InvalidArgument`] if the command contains CR
/// or LF, since it would be framed as several lines and each would draw its
/// own reply.
pub fn encode_line(command: &str) -> Result<String> {
    if command.contains(['\r', '\n']) {
        return Err(ControlError::InvalidArgument(format!(
            "Command contains a line break: {:?}",
            command
        )));
    }

    let mut line = String::with_capacity(command.len() + LINE_TERMINATOR.len());
    line.push_str(command);
    line.push_str(LINE_TERMINATOR);
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_reply() {
        assert_eq!(parse_reply("250 OK\r\n"), Some((250, "OK")));
        assert_eq!(
            parse_reply("250 version=0.4.7\r\n"),
            Some((250, "version=0.4.7"))
        );
        assert_eq!(
            parse_reply("515 Bad authentication\r\n"),
            Some((515, "Bad authentication"))
        );
    }

    #[test]
    fn test_parse_short_codes() {
        assert_eq!(parse_reply("5 short\r\n"), Some((5, "short")));
        assert_eq!(parse_reply("42 answer\r\n"), Some((42, "answer")));
        assert_eq!(parse_reply("007 agent\r\n"), Some((7, "agent")));
    }

    #[test]
    fn test_parse_all_code_widths() {
        for code in [0u16, 9, 10, 99, 100, 250, 999] {
            let line = format!("{} some message\r\n", code);
            assert_eq!(parse_reply(&line), Some((code, "some message")));
        }
    }

    #[test]
    fn test_parse_message_kept_verbatim() {
        assert_eq!(
            parse_reply("250  padded  message \r\n"),
            Some((250, " padded  message "))
        );
        assert_eq!(parse_reply("250 \r\n"), Some((250, "")));
    }

    #[test]
    fn test_parse_first_match_wins() {
        assert_eq!(
            parse_reply("250 first\r\n251 second\r\n"),
            Some((250, "first"))
        );
    }

    #[test]
    fn test_parse_unanchored() {
        assert_eq!(parse_reply("noise 250 OK\r\n"), Some((250, "OK")));
        // "1234 OK": no match at '1', but "234 OK" matches one byte later.
        assert_eq!(parse_reply("1234 OK\r\n"), Some((234, "OK")));
    }

    #[test]
    fn test_parse_other_whitespace_separator() {
        assert_eq!(parse_reply("250\tOK\r\n"), Some((250, "OK")));
    }

    #[test]
    fn test_parse_no_match() {
        assert_eq!(parse_reply(""), None);
        assert_eq!(parse_reply("garbage\r\n"), None);
        assert_eq!(parse_reply("OK\r\n"), None);
        assert_eq!(parse_reply("250-version=x"), None);
        // Missing CR.
        assert_eq!(parse_reply("250 OK\n"), None);
        // Missing terminator entirely.
        assert_eq!(parse_reply("250 OK"), None);
        // Split reply: only the first half arrived.
        assert_eq!(parse_reply("25"), None);
    }

    #[test]
    fn test_parse_non_ascii_message() {
        assert_eq!(parse_reply("250 caf\u{e9}\r\n"), Some((250, "caf\u{e9}")));
        assert_eq!(parse_reply("\u{e9}250 OK\r\n"), Some((250, "OK")));
    }

    #[test]
    fn test_parse_unicode_line_separators() {
        assert_eq!(parse_reply("250 a\u{2028}b\r\n"), None);
        assert_eq!(parse_reply("250 a\u{2029}b\r\n"), None);
        assert_eq!(
            parse_reply("250 a\u{2028}b\r\n251 c\r\n"),
            Some((251, "c"))
        );
    }

    #[test]
    fn test_parse_line_break_as_separator() {
        assert_eq!(parse_reply("250\n\r\n"), Some((250, "")));
        assert_eq!(parse_reply("250\r\n"), None);
    }

    #[test]
    fn test_parse_long_line_is_linear() {
        // Every other byte starts a candidate code; none can end in CRLF.
        let line = format!("{}\n", "1 ".repeat(32 * 1024 - 2));
        let started = std::time::Instant::now();
        assert_eq!(parse_reply(&line), None);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        let line = format!("{}\r\n", "1 ".repeat(32 * 1024 - 2));
        assert_eq!(parse_reply(&line).map(|(code, _)| code), Some(1));

        let digits = format!("{}\r\n", "9".repeat(64 * 1024));
        let started = std::time::Instant::now();
        assert_eq!(parse_reply(&digits), None);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_reply_parse() {
        let reply = Reply::parse("250 OK\r\n").unwrap();
        assert_eq!(reply.code, 250);
        assert_eq!(reply.message, "OK");
        assert_eq!(reply.raw, "250 OK\r\n");
        assert!(reply.is_success());
    }

    #[test]
    fn test_reply_parse_invalid() {
        let err = Reply::parse("hello\r\n").unwrap_err();
        match err {
            ControlError::InvalidResponse { raw } => assert_eq!(raw, "hello\r\n"),
            other => panic!("Expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_into_result() {
        let reply = Reply::parse("250 OK\r\n").unwrap();
        assert!(reply.into_result().is_ok());

        let reply = Reply::parse("552 Unrecognized key \"foo\"\r\n").unwrap();
        assert_eq!(reply.status_code(), StatusCode::UnrecognizedEntity);
        match reply.into_result() {
            Err(ControlError::CommandRejected { code, message }) => {
                assert_eq!(code, 552);
                assert_eq!(message, "Unrecognized key \"foo\"");
            }
            other => panic!("Expected CommandRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_quote_secret() {
        assert_eq!(quote_secret("secret"), "\"secret\"");
        assert_eq!(quote_secret(""), "\"\"");
        assert_eq!(quote_secret("with space"), "\"with space\"");
        assert_eq!(quote_secret("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_secret("C:\\tor"), "\"C:\\\\tor\"");
    }

    #[test]
    fn test_authenticate_command() {
        assert_eq!(authenticate_command("secret"), "AUTHENTICATE \"secret\"");
        assert_eq!(authenticate_command(""), "AUTHENTICATE \"\"");
    }

    #[test]
    fn test_command_formatting() {
        assert_eq!(format_command("GETINFO", &["a"]), "GETINFO a");
        assert_eq!(format_command("GETINFO", &["a", "b"]), "GETINFO a b");
        assert_eq!(format_command("SAVECONF", &[]), "SAVECONF");
        assert_eq!(format_command("SAVECONF", &[""]), "SAVECONF");
        assert_eq!(
            format_command("EXTENDCIRCUIT", &["0", "", "purpose=general"]),
            "EXTENDCIRCUIT 0 purpose=general"
        );
    }

    #[test]
    fn test_encode_line() {
        assert_eq!(encode_line("SIGNAL NEWNYM").unwrap(), "SIGNAL NEWNYM\r\n");
        assert_eq!(encode_line("").unwrap(), "\r\n");
    }

    #[test]
    fn test_encode_line_rejects_line_breaks() {
        assert!(matches!(
            encode_line("GETINFO version\r\nSIGNAL HALT"),
            Err(ControlError::InvalidArgument(_))
        ));
        assert!(matches!(
            encode_line("QUIT\n"),
            Err(ControlError::InvalidArgument(_))
        ));
    }
}
