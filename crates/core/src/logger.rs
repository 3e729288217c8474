use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{
        format::{Format, Writer},
        MakeWriter,
    },
    EnvFilter,
};

static SHUTDOWN_IN_PROGRESS: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

/// Transport crates log every request at debug, keep them quiet unless asked for.
const NOISY_DEPENDENCIES: [&str; 3] = ["hyper=warn", "reqwest=warn", "tokio_postgres=warn"];

/// Buffers stdout while the relay runs and writes straight through once shutdown begins,
/// so the last lines before exit are never lost in the buffer.
struct RelayLogWriter {
    buffer: std::io::BufWriter<std::io::Stdout>,
}

impl Write for RelayLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if SHUTDOWN_IN_PROGRESS.load(Ordering::Relaxed) {
            std::io::stdout().lock().write(buf)
        } else {
            self.buffer.write(buf)
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if SHUTDOWN_IN_PROGRESS.load(Ordering::Relaxed) {
            std::io::stdout().lock().flush()
        } else {
            self.buffer.flush()
        }
    }
}

struct RelayLogWriterMaker;

impl<'a> MakeWriter<'a> for RelayLogWriterMaker {
    type Writer = RelayLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RelayLogWriter { buffer: std::io::BufWriter::new(std::io::stdout()) }
    }
}

/// "DD Month - HH:MM:SS.micros" while running, plain "HH:MM:SS" during shutdown.
struct RelayTimer;

impl tracing_subscriber::fmt::time::FormatTime for RelayTimer {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        if SHUTDOWN_IN_PROGRESS.load(Ordering::Relaxed) {
            write!(writer, "{}", now.format("%H:%M:%S"))
        } else {
            write!(writer, "{} - {}", now.format("%d %B"), now.format("%H:%M:%S%.6f"))
        }
    }
}

fn build_filter(log_level: LevelFilter) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(log_level.into());
    for directive in NOISY_DEPENDENCIES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global tracing subscriber. `RUST_LOG` still overrides per target.
///
/// Does nothing if a subscriber is already installed, which happens when the relay is
/// embedded in a host process that set up its own logging.
pub fn setup_logger(log_level: LevelFilter) {
    let format = Format::default().with_timer(RelayTimer).with_level(true).with_target(false);

    let subscriber = tracing_subscriber::fmt()
        .with_writer(RelayLogWriterMaker)
        .with_env_filter(build_filter(log_level))
        .event_format(format)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn setup_info_logger() {
    setup_logger(LevelFilter::INFO);
}

/// Switches the log writer to unbuffered output.
pub fn mark_shutdown_started() {
    SHUTDOWN_IN_PROGRESS.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_requested_level() {
        let filter = build_filter(LevelFilter::DEBUG);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
