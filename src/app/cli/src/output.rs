// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use observability::init::LogFormat;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Single JSON document
    Json,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub verbosity_level: u8,
    /// Whether stderr, where logs go, is attended by a user
    pub is_tty: bool,
}

impl OutputConfig {
    const DEFAULT_LOG_LEVELS: &'static str = "info";
    const VERBOSE_LOG_LEVELS: &'static str = "debug";

    pub fn detect(verbosity_level: u8) -> Self {
        Self {
            verbosity_level,
            is_tty: console::Term::stderr().features().is_attended(),
        }
    }

    pub fn log_levels(&self) -> &'static str {
        match self.verbosity_level {
            0 => Self::DEFAULT_LOG_LEVELS,
            _ => Self::VERBOSE_LOG_LEVELS,
        }
    }

    /// Multi-line pretty logs only make sense on a terminal, redirected
    /// output stays one event per line
    pub fn log_format(&self) -> LogFormat {
        if self.verbosity_level > 0 && self.is_tty {
            LogFormat::Pretty
        } else {
            LogFormat::Compact
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
