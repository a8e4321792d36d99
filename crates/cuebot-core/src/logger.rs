//! Stderr logger for the frame loop.
//!
//! Lines look like `[  12.345s  INFO robot::controller] message`: seconds
//! since install, level, and the record target with the `cuebot_` crate prefix
//! dropped. `CUEBOT_LOG` (a level name) overrides the level passed in.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a level name that overrides the CLI choice.
pub const LOG_ENV: &str = "CUEBOT_LOG";

struct FrameLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{:8.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            short_target(record.target()),
            record.args()
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// Install the stderr logger at `level`, or at the `CUEBOT_LOG` level when
/// that variable parses. Only the first call has any effect.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let level = level_from_env().unwrap_or(level);
    let logger = LOGGER.get_or_init(|| FrameLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}

fn level_from_env() -> Option<LevelFilter> {
    std::env::var(LOG_ENV).ok()?.trim().parse().ok()
}

/// `cuebot_vision::pipeline` -> `vision::pipeline`; foreign targets pass through.
fn short_target(target: &str) -> &str {
    target.strip_prefix("cuebot_").unwrap_or(target)
}

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Span close events carry the per-stage detection timings. Returns `false`
/// when another subscriber was already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let installed = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_targets_lose_their_crate_prefix() {
        assert_eq!(short_target("cuebot_vision::pipeline"), "vision::pipeline");
        assert_eq!(short_target("cuebot"), "cuebot");
        assert_eq!(short_target("reqwest::connect"), "reqwest::connect");
    }

    #[test]
    fn second_install_is_a_no_op() {
        init_with_level(LevelFilter::Warn).expect("first");
        init_with_level(LevelFilter::Trace).expect("second");
        assert!(LOGGER.get().is_some());
    }
}
