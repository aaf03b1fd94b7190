// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line output including span open and close events
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    /// Filter directives used when `RUST_LOG` is not set
    pub default_log_levels: String,
    /// Format of STDERR output
    pub format: LogFormat,
    /// When set, events are written to this file as JSON instead of STDERR
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            default_log_levels: "info".to_string(),
            format: LogFormat::default(),
            log_file: None,
        }
    }

    pub fn with_default_log_levels(mut self, levels: impl Into<String>) -> Self {
        self.default_log_levels = levels.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Flushes buffered log sinks when dropped
#[must_use]
#[derive(Default)]
pub struct Guard {
    _appender: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Installs the global subscriber.
///
/// Does nothing if a subscriber was already installed, e.g. by a test harness.
pub fn init(config: &Config) -> std::io::Result<Guard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(Guard::default());
    }

    // RUST_LOG takes precedence over the configured levels
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_levels));

    if let Some(log_file) = &config.log_file {
        let (appender, appender_guard) =
            tracing_appender::non_blocking(std::fs::File::create(log_file)?);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(appender),
            )
            .init();

        tracing::debug!(service_name = %config.service_name, ?log_file, "Logging to file");

        return Ok(Guard {
            _appender: Some(appender_guard),
        });
    }

    match config.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
    }

    Ok(Guard::default())
}
