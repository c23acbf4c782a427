use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use std::io::Write;

/// Writes log records to stderr, keeping stdout free for device commands.
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Logger { level }))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stderr = std::io::stderr();
        let mut stderr = stderr.lock();
        // Nowhere left to report a failure to write to stderr.
        let _ = writeln!(
            stderr,
            "[{}] {}: {}",
            record.level(),
            record.module_path().unwrap_or("pinlock"),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
