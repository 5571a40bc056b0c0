//! Bootstrap for the external PowerShell Editor Services host.
//!
//! This crate contains no language-server logic of its own. It launches the
//! host process, waits for the session descriptor it writes, connects the
//! advertised transport endpoint, and hands the raw byte stream upward as a
//! [`Connection`]. Everything protocol-shaped happens on the other side of
//! that stream.

pub mod connection;
pub mod launch;
pub mod session;

mod bootstrap;

pub use bootstrap::{ActiveHost, DEFAULT_STARTUP_TIMEOUT, activate};
pub use connection::Connection;
pub use launch::{HostLaunchSpec, HostProcess, SessionPaths, TransportMode};
pub use session::{SessionDetails, SessionFileError, await_session_file};
