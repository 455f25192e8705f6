// src/logging.rs
//! Diagnostický log do souboru. Stdout patří TUI, proto ne na terminál.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Nastaví `tracing` subscriber, který připisuje do `path`.
///
/// Filtr se bere z `RUST_LOG`, jinak `info`. Opakované volání nic nepřenastaví.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazyocredit.log");
        init_file_logging(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_file_logging(&dir.path().join("missing").join("x.log")).is_err());
    }
}
