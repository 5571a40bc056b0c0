//! End-to-end activation against a scripted stand-in for the editor-services
//! host: spawn, descriptor poll, endpoint connect.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;

use pscode_lsp::{HostLaunchSpec, activate};

/// Write an executable shell script standing in for `pwsh`.
///
/// The real interpreter receives `-NoLogo -NoProfile -Command <payload>`; the
/// stand-in digs the `-SessionDetailsPath` value out of the payload the same
/// way the bundled start script would consume it.
fn write_fake_host(dir: &Path, body: &str) -> std::path::PathBuf {
    let script = dir.join("fake-pwsh.sh");
    let contents = format!(
        "#!/bin/sh\n\
         details=$(printf '%s' \"$*\" | sed -n \"s/.*-SessionDetailsPath '\\([^']*\\)'.*/\\1/p\")\n\
         {body}\n"
    );
    std::fs::write(&script, contents).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[tokio::test]
async fn activate_connects_to_the_advertised_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("pses.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    // Descriptor appears only after a startup delay, exercising the poll loop.
    let script = write_fake_host(
        dir.path(),
        &format!(
            "sleep 0.3\n\
             printf '{{\"languageServicePipeName\":\"%s\"}}' '{}' > \"$details\"\n\
             sleep 10",
            socket.display()
        ),
    );

    let spec = HostLaunchSpec::new(dir.path().join("modules"))
        .with_pwsh(script.display().to_string());

    let serve = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        stream.write_all(b"pong").await.unwrap();
    });

    let active = activate(spec, Duration::from_secs(10)).await.unwrap();
    let (mut reader, mut writer) = active.connection.into_split();

    writer.write_all(b"ping").await.unwrap();
    writer.flush().await.unwrap();
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"pong");

    serve.await.unwrap();
}

#[tokio::test]
async fn activate_times_out_when_no_descriptor_appears() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_fake_host(dir.path(), "sleep 10");

    let spec = HostLaunchSpec::new(dir.path().join("modules"))
        .with_pwsh(script.display().to_string());

    let started = Instant::now();
    let result = activate(spec, Duration::from_millis(400)).await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn activate_reports_host_exit_before_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    // Host dies immediately without ever writing the descriptor.
    let script = write_fake_host(dir.path(), "exit 1");

    let spec = HostLaunchSpec::new(dir.path().join("modules"))
        .with_pwsh(script.display().to_string());

    let started = Instant::now();
    let result = activate(spec, Duration::from_secs(30)).await;
    let err = format!("{:#}", result.err().unwrap());
    assert!(err.contains("exited"), "unexpected error: {err}");
    // Exit is detected by the poll loop, long before the timeout.
    assert!(started.elapsed() < Duration::from_secs(5));
}
