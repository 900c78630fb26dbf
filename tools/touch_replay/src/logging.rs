use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;

/// Stderr lines plus an optional JSON-lines mirror.
struct Logger {
    level: LevelFilter,
    json_file: Option<Mutex<File>>,
}

pub fn init(level: LevelFilter, json_path: Option<PathBuf>) -> Result<()> {
    let json_file = match json_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(Mutex::new(file))
        }
        None => None,
    };
    log::set_boxed_logger(Box::new(Logger { level, json_file }))
        .context("logger already installed")?;
    log::set_max_level(level);
    Ok(())
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        eprintln!("{}", message);

        let Some(file) = &self.json_file else {
            return;
        };
        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let entry = json!({
            "ts_ms": ts_ms,
            "level": level_name(record.level()),
            "target": record.target(),
            "msg": message,
        });
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{}", entry);
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.json_file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}
