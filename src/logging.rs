// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Overrides `[log] filter` from the config file.
pub const LOG_ENV: &str = "FLOWDECK_LOG";
pub const DEFAULT_FILTER: &str = "info";
pub const LOG_FILE: &str = "flowdeck.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid log filter {directives:?}: {source}")]
    Filter {
        directives: String,
        source: ParseError,
    },
    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Picks the filter directives: environment first, then config, then [`DEFAULT_FILTER`].
pub fn filter_directives(env_value: Option<&str>, configured: Option<&str>) -> String {
    [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directives| !directives.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_owned()
}

pub fn build_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|source| LoggingError::Filter {
        directives: directives.to_owned(),
        source,
    })
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(target: &LogTarget, configured: Option<&str>) -> Result<(), LoggingError> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(&filter_directives(env_value.as_deref(), configured))?;

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .try_init()?,
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .try_init()?
        }
    }
    Ok(())
}
