//! pscode-lsp-proxy — stdio bridge between a hosting IDE and the
//! editor-services host.
//!
//! The IDE spawns this binary and speaks LSP on its stdio; the proxy
//! activates the host (named pipe by default) and pumps raw bytes both ways
//! until either side closes. No protocol logic lives here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;

use pscode_lsp::{DEFAULT_STARTUP_TIMEOUT, HostLaunchSpec, TransportMode, activate};

struct Args {
    bundled_modules: PathBuf,
    pwsh: Option<String>,
    log_level: Option<String>,
    stdio: bool,
    timeout: Duration,
}

fn parse_args() -> Result<Args> {
    let mut bundled_modules = None;
    let mut pwsh = None;
    let mut log_level = None;
    let mut stdio = false;
    let mut timeout = DEFAULT_STARTUP_TIMEOUT;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--bundled-modules" => {
                let value = argv.next().context("--bundled-modules requires a path")?;
                bundled_modules = Some(PathBuf::from(value));
            }
            "--pwsh" => pwsh = Some(argv.next().context("--pwsh requires a value")?),
            "--log-level" => {
                log_level = Some(argv.next().context("--log-level requires a value")?);
            }
            "--stdio" => stdio = true,
            "--timeout-secs" => {
                let value = argv.next().context("--timeout-secs requires a value")?;
                let secs: u64 = value.parse().context("--timeout-secs must be an integer")?;
                timeout = Duration::from_secs(secs);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(Args {
        bundled_modules: bundled_modules.context("--bundled-modules is required")?,
        pwsh,
        log_level,
        stdio,
        timeout,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr only: stdout carries the protocol stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;

    let mut spec = HostLaunchSpec::new(args.bundled_modules);
    if let Some(pwsh) = args.pwsh {
        spec = spec.with_pwsh(pwsh);
    }
    if let Some(level) = args.log_level {
        spec = spec.with_log_level(level);
    }
    if args.stdio {
        spec = spec.with_transport(TransportMode::Stdio);
    }

    let active = activate(spec, args.timeout).await?;
    let (mut host_reader, mut host_writer) = active.connection.into_split();
    let mut host = active.host;

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    // Pump until either direction closes, then let kill_on_drop reap the
    // child if it is still alive.
    let result = tokio::select! {
        up = tokio::io::copy(&mut stdin, &mut host_writer) => {
            up.map(|n| tracing::debug!(bytes = n, "IDE closed its end"))
        }
        down = tokio::io::copy(&mut host_reader, &mut stdout) => {
            down.map(|n| tracing::debug!(bytes = n, "Host closed its end"))
        }
        status = host.wait() => {
            match status {
                Ok(status) => {
                    tracing::warn!(%status, "Editor-services host exited");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    };

    stdout.flush().await.ok();
    result.context("transport pump failed")?;
    Ok(())
}
