//! `log` backend that writes every record to the serial port.

use log::{LevelFilter, Log, Metadata, Record};

use crate::kernel::InitError;
use crate::serial;

struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        serial::write_fmt(format_args!(
            "[{:<5} {}] {}\n",
            record.level(),
            record.target().trim_start_matches("bringup::"),
            record.args()
        ));
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Install the serial logger. Only the first call succeeds.
pub fn init(level: LevelFilter) -> Result<(), InitError> {
    log::set_logger(&LOGGER).map_err(|_| InitError::LoggerAlreadySet)?;
    log::set_max_level(level);
    Ok(())
}
