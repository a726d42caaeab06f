//! Subscriber set-up for hosts
//!
//! The library itself only emits `tracing` events. Binaries call [`init_logging`] once
//! to install a fmt subscriber filtered by `RUST_LOG`, or by the `-v` count when that
//! variable is unset.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Drop everything. Used while a full-screen UI owns the terminal.
    Discard,
}

/// Filter directive for a `-v` count
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,rubyle=debug",
        2 => "info,rubyle=trace",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8, target: LogTarget) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let builder = fmt().with_env_filter(filter).with_target(false);
    let installed = match target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::create(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogTarget::Discard => builder.with_writer(io::sink).try_init(),
    };
    installed.map_err(io::Error::other)
}
