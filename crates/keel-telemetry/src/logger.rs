use std::io::Write;
use std::sync::Mutex;

use keel_common::config::LoggingConfig;
use log::debug;

use crate::error::{TelemetryError, TelemetryResult};

enum LoggerStatus {
    Uninitialized,
    Initialized,
}

static LOGGER_STATUS: Mutex<LoggerStatus> = Mutex::new(LoggerStatus::Uninitialized);

/// Installs the global logger.
///
/// The filter is taken from `RUST_LOG` and falls back to the configured default filter.
/// Calling this function more than once is an error.
pub fn init_logger(config: &LoggingConfig) -> TelemetryResult<()> {
    let mut status = LOGGER_STATUS
        .lock()
        .map_err(|e| TelemetryError::internal(e.to_string()))?;

    match *status {
        LoggerStatus::Uninitialized => {
            let logger = build_logger(config);
            let max_level = logger.filter();
            log::set_boxed_logger(Box::new(logger))?;
            log::set_max_level(max_level);
            *status = LoggerStatus::Initialized;
            debug!("logger initialized with default filter: {}", config.default_filter);
            Ok(())
        }
        LoggerStatus::Initialized => Err(TelemetryError::internal("logger already initialized")),
    }
}

fn build_logger(config: &LoggingConfig) -> env_logger::Logger {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.default_filter.as_str()),
    )
    .format(move |buf, record| {
        let level = record.level();
        let target = record.target();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp();
        let args = record.args();
        writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
    })
    .build()
}
