//! Transport connection — the bidirectional byte stream handed to the IDE.

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{ChildStdin, ChildStdout};

pub type ConnectionReader = Box<dyn AsyncRead + Send + Unpin>;
pub type ConnectionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A connected bidirectional channel to the editor-services host.
///
/// Opaque bytes in both directions; this crate never frames or interprets
/// them. The hosting IDE's LSP infrastructure owns the protocol.
pub struct Connection {
    reader: ConnectionReader,
    writer: ConnectionWriter,
}

impl Connection {
    #[must_use]
    pub fn new(reader: ConnectionReader, writer: ConnectionWriter) -> Self {
        Self { reader, writer }
    }

    /// Adopt a stdio-transport child's pipes as the connection.
    #[must_use]
    pub fn from_child_stdio(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
        }
    }

    #[must_use]
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }
}

/// Connect the client side of the endpoint named in the session descriptor.
#[cfg(unix)]
pub async fn connect_endpoint(endpoint: &str) -> Result<Connection> {
    let stream = tokio::net::UnixStream::connect(endpoint)
        .await
        .with_context(|| format!("connecting to socket {endpoint}"))?;
    tracing::info!(endpoint, "Connected to editor-services endpoint");
    let (read_half, write_half) = stream.into_split();
    Ok(Connection::new(Box::new(read_half), Box::new(write_half)))
}

/// Connect the client side of the endpoint named in the session descriptor.
#[cfg(windows)]
pub async fn connect_endpoint(endpoint: &str) -> Result<Connection> {
    use crate::session::bare_pipe_name;

    let path = format!(r"\\.\pipe\{}", bare_pipe_name(endpoint));
    let client = tokio::net::windows::named_pipe::ClientOptions::new()
        .open(&path)
        .with_context(|| format!("connecting to pipe {path}"))?;
    tracing::info!(endpoint = %path, "Connected to editor-services endpoint");
    let (read_half, write_half) = tokio::io::split(client);
    Ok(Connection::new(Box::new(read_half), Box::new(write_half)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_endpoint_reaches_exact_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("pses.sock");
        let listener = tokio::net::UnixListener::bind(&sock).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(b"pong").await.unwrap();
            buf
        });

        let conn = connect_endpoint(sock.to_str().unwrap()).await.unwrap();
        let (mut reader, mut writer) = conn.into_split();
        writer.write_all(b"ping").await.unwrap();
        writer.flush().await.unwrap();

        let mut reply = [0u8; 4];
        reader.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"pong");
        assert_eq!(&server.await.unwrap(), b"ping");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_endpoint_missing_socket_errors() {
        let result = connect_endpoint("/nonexistent/pscode-test.sock").await;
        assert!(result.is_err());
    }
}
