//! Session descriptor — the handshake file the host writes on startup.
//!
//! The descriptor is read exactly once: polled into existence, parsed, and
//! never consulted again. The poll carries an explicit deadline and an abort
//! path so a silently failing host can never hang activation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Fixed poll interval for descriptor appearance.
pub const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum SessionFileError {
    #[error("session descriptor did not appear within {0:?}")]
    TimedOut(Duration),
    #[error("host exited before writing the session descriptor: {0}")]
    HostExited(String),
    #[error("reading session descriptor: {0}")]
    Read(#[from] std::io::Error),
    #[error("parsing session descriptor: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parsed session descriptor.
///
/// Only the transport endpoint fields are modeled; the host writes more
/// (status, protocol versions) but nothing here consumes them.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetails {
    #[serde(rename = "languageServicePipeName")]
    language_service_pipe_name: String,
    #[serde(rename = "debugServicePipeName", default)]
    debug_service_pipe_name: Option<String>,
}

impl SessionDetails {
    pub fn parse(contents: &str) -> Result<Self, SessionFileError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Raw endpoint value as written by the host.
    ///
    /// On Windows this is a full pipe path (`\\.\pipe\name`); elsewhere an
    /// absolute Unix socket path.
    #[must_use]
    pub fn language_endpoint(&self) -> &str {
        &self.language_service_pipe_name
    }

    #[must_use]
    pub fn debug_endpoint(&self) -> Option<&str> {
        self.debug_service_pipe_name.as_deref()
    }
}

/// Strip a Windows pipe path down to its bare pipe name.
///
/// Endpoint values without backslashes (Unix socket paths) pass through
/// unchanged.
#[must_use]
pub fn bare_pipe_name(endpoint: &str) -> &str {
    endpoint.rsplit('\\').next().unwrap_or(endpoint)
}

/// Poll for the descriptor at fixed intervals until it parses, the deadline
/// passes, or `aborted` reports a reason (host exit, caller cancellation).
///
/// Never returns details before the file exists and has parsed successfully.
pub async fn await_session_file<F>(
    path: &Path,
    timeout: Duration,
    mut aborted: F,
) -> Result<SessionDetails, SessionFileError>
where
    F: FnMut() -> Option<String>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if path.exists() {
            let contents = tokio::fs::read_to_string(path).await?;
            let details = SessionDetails::parse(&contents)?;
            tracing::debug!(
                endpoint = %details.language_endpoint(),
                "Session descriptor parsed"
            );
            return Ok(details);
        }
        if let Some(reason) = aborted() {
            return Err(SessionFileError::HostExited(reason));
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(SessionFileError::TimedOut(timeout));
        }
        tokio::time::sleep(SESSION_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"{
        "status": "started",
        "languageServicePipeName": "\\\\.\\pipe\\PSES_abc123",
        "debugServicePipeName": "\\\\.\\pipe\\PSES_dbg456"
    }"#;

    #[test]
    fn test_parse_descriptor() {
        let details = SessionDetails::parse(DESCRIPTOR).unwrap();
        assert_eq!(details.language_endpoint(), r"\\.\pipe\PSES_abc123");
        assert_eq!(details.debug_endpoint(), Some(r"\\.\pipe\PSES_dbg456"));
    }

    #[test]
    fn test_parse_descriptor_without_debug_endpoint() {
        let details =
            SessionDetails::parse(r#"{"languageServicePipeName": "/tmp/pses.sock"}"#).unwrap();
        assert_eq!(details.language_endpoint(), "/tmp/pses.sock");
        assert!(details.debug_endpoint().is_none());
    }

    #[test]
    fn test_parse_rejects_missing_endpoint() {
        assert!(SessionDetails::parse(r#"{"status": "started"}"#).is_err());
        assert!(SessionDetails::parse("not json").is_err());
    }

    #[test]
    fn test_bare_pipe_name_strips_windows_path() {
        assert_eq!(bare_pipe_name(r"\\.\pipe\PSES_abc123"), "PSES_abc123");
    }

    #[test]
    fn test_bare_pipe_name_passes_socket_path_through() {
        assert_eq!(bare_pipe_name("/tmp/pses.sock"), "/tmp/pses.sock");
    }

    #[tokio::test]
    async fn test_await_times_out_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let result = await_session_file(&path, Duration::from_millis(250), || None).await;
        assert!(matches!(result, Err(SessionFileError::TimedOut(_))));
    }

    #[tokio::test]
    async fn test_await_returns_once_file_appears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            tokio::fs::write(
                &writer_path,
                r#"{"languageServicePipeName": "/tmp/late.sock"}"#,
            )
            .await
            .unwrap();
        });

        let details = await_session_file(&path, Duration::from_secs(5), || None)
            .await
            .unwrap();
        assert_eq!(details.language_endpoint(), "/tmp/late.sock");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_await_aborts_on_host_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut polls = 0;
        let result = await_session_file(&path, Duration::from_secs(30), || {
            polls += 1;
            (polls > 2).then(|| "exit code 1".to_string())
        })
        .await;

        match result {
            Err(SessionFileError::HostExited(reason)) => assert!(reason.contains("exit code 1")),
            other => panic!("expected HostExited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_await_malformed_descriptor_is_error_not_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{ truncated").await.unwrap();

        let result = await_session_file(&path, Duration::from_secs(1), || None).await;
        assert!(matches!(result, Err(SessionFileError::Parse(_))));
    }
}
