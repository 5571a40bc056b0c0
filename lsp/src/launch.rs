//! Host process launch — command-line assembly and child lifecycle.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Transport the host is asked to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Host writes an endpoint name into the session descriptor and listens
    /// on a named pipe (Unix domain socket on non-Windows).
    NamedPipe,
    /// Host speaks the protocol on its own stdin/stdout.
    Stdio,
}

/// Filesystem layout of one host session.
///
/// Created fresh per activation; the host writes the descriptor and its log
/// into this directory. Nothing cleans it up beyond the OS temp policy,
/// matching the descriptor's throwaway lifecycle.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    dir: PathBuf,
}

impl SessionPaths {
    /// Compute and create a unique temporary session directory.
    pub fn unique() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("pscode-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating session directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Use an existing directory as the session root (tests).
    #[must_use]
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the host is told to write the session descriptor to.
    #[must_use]
    pub fn details_file(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    /// Path the host is told to write its own log to.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.dir.join("editor-services.log")
    }
}

/// Everything needed to spawn the editor-services host.
#[derive(Debug, Clone)]
pub struct HostLaunchSpec {
    pwsh: String,
    bundled_modules: PathBuf,
    host_name: String,
    host_profile_id: String,
    host_version: String,
    log_level: String,
    transport: TransportMode,
}

impl HostLaunchSpec {
    #[must_use]
    pub fn new(bundled_modules: PathBuf) -> Self {
        Self {
            pwsh: "pwsh".to_string(),
            bundled_modules,
            host_name: "PSCode".to_string(),
            host_profile_id: "pscode".to_string(),
            host_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "Normal".to_string(),
            transport: TransportMode::NamedPipe,
        }
    }

    #[must_use]
    pub fn with_pwsh(mut self, pwsh: impl Into<String>) -> Self {
        self.pwsh = pwsh.into();
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: TransportMode) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub fn transport(&self) -> TransportMode {
        self.transport
    }

    /// The `-Command` payload handed to the interpreter.
    ///
    /// Invokes the bundled `Start-EditorServices.ps1` with the session paths
    /// and host identity; `-Stdio` selects the stdio transport.
    #[must_use]
    pub fn command_argument(&self, session: &SessionPaths) -> String {
        let start_script = self
            .bundled_modules
            .join("PowerShellEditorServices")
            .join("Start-EditorServices.ps1");
        let mut cmd = format!(
            "& '{}' -BundledModulesPath '{}' -LogPath '{}' -SessionDetailsPath '{}' \
             -FeatureFlags @() -AdditionalModules @() -HostName '{}' -HostProfileId '{}' \
             -HostVersion {} -LogLevel {}",
            start_script.display(),
            self.bundled_modules.display(),
            session.log_file().display(),
            session.details_file().display(),
            self.host_name,
            self.host_profile_id,
            self.host_version,
            self.log_level,
        );
        if self.transport == TransportMode::Stdio {
            cmd.push_str(" -Stdio");
        }
        cmd
    }

    /// Spawn the host process against `session`.
    ///
    /// Stdio transport pipes the child's stdin/stdout so the connection can
    /// adopt them; named-pipe transport leaves them detached.
    pub fn spawn(&self, session: &SessionPaths) -> Result<HostProcess> {
        let resolved = which::which(&self.pwsh)
            .with_context(|| format!("{} not found in PATH", self.pwsh))?;

        let mut cmd = Command::new(&resolved);
        cmd.arg("-NoLogo")
            .arg("-NoProfile")
            .arg("-Command")
            .arg(self.command_argument(session))
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match self.transport {
            TransportMode::Stdio => {
                cmd.stdin(Stdio::piped()).stdout(Stdio::piped());
            }
            TransportMode::NamedPipe => {
                cmd.stdin(Stdio::null()).stdout(Stdio::null());
            }
        }

        tracing::info!(
            pwsh = %resolved.display(),
            session = %session.dir().display(),
            transport = ?self.transport,
            "Spawning editor-services host"
        );

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", resolved.display()))?;

        Ok(HostProcess { child })
    }
}

/// Handle to the running host.
///
/// Host exit is the caller's decision to act on — observable via
/// [`HostProcess::try_status`] / [`HostProcess::wait`], never a process-wide
/// abort of the embedding application.
pub struct HostProcess {
    child: Child,
}

impl HostProcess {
    /// Non-blocking exit check.
    pub fn try_status(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait for the host to exit.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Take the piped stdio handles (stdio transport only).
    pub fn take_stdio(&mut self) -> Option<(ChildStdin, ChildStdout)> {
        let stdin = self.child.stdin.take()?;
        let stdout = self.child.stdout.take()?;
        Some((stdin, stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> HostLaunchSpec {
        HostLaunchSpec::new(PathBuf::from("/opt/pscode/modules"))
    }

    #[test]
    fn test_command_argument_names_session_paths() {
        let session = SessionPaths::at(PathBuf::from("/tmp/pscode-test"));
        let arg = spec().command_argument(&session);

        assert!(arg.contains("Start-EditorServices.ps1"));
        assert!(arg.contains("-BundledModulesPath '/opt/pscode/modules'"));
        assert!(arg.contains("-SessionDetailsPath '/tmp/pscode-test/session.json'"));
        assert!(arg.contains("-LogPath '/tmp/pscode-test/editor-services.log'"));
        assert!(arg.contains("-HostName 'PSCode'"));
    }

    #[test]
    fn test_command_argument_default_is_named_pipe() {
        let session = SessionPaths::at(PathBuf::from("/tmp/s"));
        let arg = spec().command_argument(&session);
        assert!(!arg.contains("-Stdio"));
    }

    #[test]
    fn test_command_argument_stdio_flag() {
        let session = SessionPaths::at(PathBuf::from("/tmp/s"));
        let arg = spec()
            .with_transport(TransportMode::Stdio)
            .command_argument(&session);
        assert!(arg.ends_with("-Stdio"));
    }

    #[test]
    fn test_command_argument_log_level_override() {
        let session = SessionPaths::at(PathBuf::from("/tmp/s"));
        let arg = spec().with_log_level("Diagnostic").command_argument(&session);
        assert!(arg.contains("-LogLevel Diagnostic"));
    }

    #[test]
    fn test_unique_session_dirs_differ() {
        let a = SessionPaths::unique().unwrap();
        let b = SessionPaths::unique().unwrap();
        assert_ne!(a.dir(), b.dir());
        assert!(a.dir().exists());
        std::fs::remove_dir_all(a.dir()).unwrap();
        std::fs::remove_dir_all(b.dir()).unwrap();
    }
}
