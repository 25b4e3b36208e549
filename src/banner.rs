//! Banner grabbing for established TCP connections.
//!
//! Sends a bare line terminator to nudge line-oriented services into
//! talking, then reads whatever arrives first. Silence, a timeout, a reset
//! or a clean close all mean "no banner" and are never errors.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
pub const MAX_BANNER_SIZE: usize = 1024;

/// Maximum characters kept after sanitising.
const MAX_BANNER_CHARS: usize = 256;

/// Neutral trigger sent before reading.
const TRIGGER: &[u8] = b"\r\n";

/// Grab a banner from a connected stream.
///
/// The whole exchange (trigger write plus first read) is bounded by
/// `read_timeout`. Returns `None` when nothing printable came back.
pub async fn grab_banner<S>(stream: &mut S, read_timeout: Duration) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];

    let exchange = async {
        // A failed trigger still leaves a greeting possibly buffered
        if let Err(e) = stream.write_all(TRIGGER).await {
            tracing::trace!(error = %e, "banner trigger write failed");
        }
        stream.read(&mut buffer).await
    };

    let outcome = timeout(read_timeout, exchange).await;
    match outcome {
        Ok(Ok(n)) if n > 0 => {
            tracing::trace!(bytes = n, "banner bytes read");
            sanitize_banner(&buffer[..n])
        }
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::trace!(error = %e, "banner read failed");
            None
        }
        Err(_) => None,
    }
}

/// Decode as lossy UTF-8, flatten control characters and collapse whitespace.
fn sanitize_banner(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);

    let mut result = String::with_capacity(text.len().min(MAX_BANNER_CHARS));
    let mut prev_space = true;
    for c in text.chars() {
        let c = if c.is_control() || c.is_whitespace() {
            ' '
        } else {
            c
        };
        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    let trimmed: String = result.trim_end().chars().take(MAX_BANNER_CHARS).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_sanitize_banner() {
        let data = b"SSH-2.0-OpenSSH_8.9\r\n";
        assert_eq!(sanitize_banner(data).as_deref(), Some("SSH-2.0-OpenSSH_8.9"));
    }

    #[test]
    fn test_sanitize_multiline() {
        let data = b"220 mail.example.com ESMTP\r\n\r\n250 ok\r\n";
        assert_eq!(
            sanitize_banner(data).as_deref(),
            Some("220 mail.example.com ESMTP 250 ok")
        );
    }

    #[test]
    fn test_sanitize_binary_data() {
        let data = b"\x00\x01Hello\x02World\x03";
        assert_eq!(sanitize_banner(data).as_deref(), Some("Hello World"));
        assert_eq!(sanitize_banner(b"\r\n\t \x00"), None);
    }

    #[test]
    fn test_sanitize_caps_length() {
        let data = vec![b'A'; MAX_BANNER_SIZE];
        assert_eq!(sanitize_banner(&data).map(|s| s.len()), Some(256));
    }

    #[tokio::test]
    async fn test_grab_banner_after_trigger() {
        let (mut client, mut server) = duplex(4096);

        tokio::spawn(async move {
            let mut trigger = [0u8; 2];
            server.read_exact(&mut trigger).await.unwrap();
            assert_eq!(&trigger, b"\r\n");
            server.write_all(b"+OK POP3 ready\r\n").await.unwrap();
            // Keep the pipe open until the client is done
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let banner = grab_banner(&mut client, Duration::from_secs(1)).await;
        assert_eq!(banner.as_deref(), Some("+OK POP3 ready"));
    }

    #[tokio::test]
    async fn test_grab_banner_silent_service() {
        let (mut client, _server) = duplex(4096);
        let banner = grab_banner(&mut client, Duration::from_millis(50)).await;
        assert!(banner.is_none());
    }

    #[tokio::test]
    async fn test_grab_banner_closed_peer() {
        let (mut client, server) = duplex(4096);
        drop(server);
        let banner = grab_banner(&mut client, Duration::from_millis(50)).await;
        assert!(banner.is_none());
    }
}
