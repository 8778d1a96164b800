use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;

pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    fn format(&self) -> String {
        format!(
            "{} {:<5} [{}] {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Writes timestamped log lines to stderr
#[derive(Clone, Copy)]
pub struct CliLogger {
    max_level: LevelFilter,
}

impl CliLogger {
    pub fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Level for the `-v` count and `--quiet` flag
    pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Warn;
        }
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let entry = LogEntry {
                timestamp: Local::now(),
                level: record.level(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            };

            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", entry.format());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
