use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

use crate::console::ActiveBar;

/// Send `tracing` events to stderr, hiding the fetch progress bar while each event is
/// written. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: u8, bar: ActiveBar) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pubmed_fetch={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || SuspendedStderr(bar.clone()))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))
}

/// Stderr with the progress bar suspended around every write.
struct SuspendedStderr(ActiveBar);

impl Write for SuspendedStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pass_through_without_a_bar() {
        let mut w = SuspendedStderr(ActiveBar::default());
        assert_eq!(w.write(b"").unwrap(), 0);
        w.write_all(b"").unwrap();
        w.flush().unwrap();
    }
}
