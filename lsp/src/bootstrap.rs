//! Activation — spawn the host, await the descriptor, connect the transport.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::connection::{Connection, connect_endpoint};
use crate::launch::{HostLaunchSpec, HostProcess, SessionPaths, TransportMode};
use crate::session::await_session_file;

/// Default budget for the whole spawn-to-connect handshake.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// A successfully activated host: the connection plus the child it belongs to.
///
/// The child is handed back rather than detached so the caller owns the exit
/// policy. Dropping the `ActiveHost` kills the child (`kill_on_drop`).
pub struct ActiveHost {
    pub host: HostProcess,
    pub connection: Connection,
    session: SessionPaths,
}

impl ActiveHost {
    #[must_use]
    pub fn session(&self) -> &SessionPaths {
        &self.session
    }
}

/// Produce a connected bidirectional stream to a freshly launched host.
///
/// Named-pipe transport: poll for the session descriptor (fixed interval,
/// explicit `timeout`), parse it once, connect to exactly the endpoint it
/// names. Stdio transport: adopt the child's pipes directly. Either way no
/// connection is returned unless the handshake completed.
pub async fn activate(spec: HostLaunchSpec, timeout: Duration) -> Result<ActiveHost> {
    let session = SessionPaths::unique()?;
    let mut host = spec.spawn(&session)?;

    let connection = match spec.transport() {
        TransportMode::Stdio => {
            let (stdin, stdout) = host
                .take_stdio()
                .context("stdio transport requested but child pipes are missing")?;
            Connection::from_child_stdio(stdin, stdout)
        }
        TransportMode::NamedPipe => {
            let details_file = session.details_file();
            let details = await_session_file(&details_file, timeout, || {
                match host.try_status() {
                    Ok(Some(status)) => Some(status.to_string()),
                    Ok(None) => None,
                    Err(e) => Some(format!("exit status unavailable: {e}")),
                }
            })
            .await
            .context("waiting for session descriptor")?;

            connect_endpoint(details.language_endpoint()).await?
        }
    };

    tracing::info!(session = %session.dir().display(), "Editor-services host activated");

    Ok(ActiveHost {
        host,
        connection,
        session,
    })
}
