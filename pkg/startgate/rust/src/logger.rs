// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Line-oriented `log` backend writing every record to stdout and, optionally,
//! appending it to a file.

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use time::OffsetDateTime;
use time::macros::format_description;

const COMPONENT: &str = "STARTGATE";

/// Records from other crates are only shown from this level up.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

pub struct LifecycleEvent {
    pub timestamp: OffsetDateTime,
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self
            .timestamp
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(
            f,
            "{ts} UTC | {COMPONENT} | {} | {}",
            self.level, self.message
        )
    }
}

pub struct Logger {
    level: LevelFilter,
    file: Mutex<Option<File>>,
}

impl Logger {
    pub fn new(level: LevelFilter, log_file: Option<&Path>) -> Result<Self> {
        let file = match log_file {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?,
            ),
            None => None,
        };
        Ok(Self {
            level,
            file: Mutex::new(file),
        })
    }

    /// Install as the global `log` backend. Fails if one is already set.
    pub fn install(self) -> Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self)).context("installing logger")?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let limit = if metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
            self.level
        } else {
            self.level.min(DEPENDENCY_LEVEL)
        };
        metadata.level() <= limit
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let event = LifecycleEvent {
            timestamp: OffsetDateTime::now_utc(),
            level: record.level(),
            message: record.args().to_string(),
        };
        let line = format!("{event}\n");

        // One lock for both sinks keeps their ordering identical.
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = std::io::stdout().lock().write_all(line.as_bytes());
        if let Some(f) = file.as_mut() {
            let _ = f.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = std::io::stdout().lock().flush();
        if let Some(f) = file.as_mut() {
            let _ = f.flush();
        }
    }
}
