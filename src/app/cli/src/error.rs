// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::error::Error as StdError;
use std::fmt::Write as _;

use internal_error::{BoxedError, InternalError};
use replag::{ConfigurationError, LagStorageError, MonitorError, ThrottleError};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum CLIError {
    /// Invalid arguments or configuration, retrying will not help
    #[error("{msg}")]
    UsageError {
        msg: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("{source}")]
    Failure {
        #[source]
        source: BoxedError,
    },
}

impl CLIError {
    pub const EXIT_CODE_FAILURE: i32 = 1;
    pub const EXIT_CODE_USAGE: i32 = 2;

    pub fn usage_error(msg: impl Into<String>) -> Self {
        Self::UsageError {
            msg: msg.into(),
            source: None,
        }
    }

    pub fn usage_error_from(e: impl Into<BoxedError>) -> Self {
        let source = e.into();
        Self::UsageError {
            msg: source.to_string(),
            source: None,
        }
    }

    pub fn usage_error_with_source(msg: impl Into<String>, e: impl Into<BoxedError>) -> Self {
        Self::UsageError {
            msg: msg.into(),
            source: Some(e.into()),
        }
    }

    pub fn failure(e: impl Into<BoxedError>) -> Self {
        Self::Failure { source: e.into() }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UsageError { .. } => Self::EXIT_CODE_USAGE,
            Self::Failure { .. } => Self::EXIT_CODE_FAILURE,
        }
    }

    /// Formats the error together with its chain of causes for display to the
    /// user
    pub fn pretty(&self) -> String {
        let (head, mut cause): (String, Option<&(dyn StdError + 'static)>) = match self {
            Self::UsageError { msg, source } => (
                msg.clone(),
                source
                    .as_deref()
                    .map(|e| e as &(dyn StdError + 'static)),
            ),
            Self::Failure { source } => (source.to_string(), source.source()),
        };

        let mut out = format!("{}: {head}", console::style("Error").red().bold());

        let mut last = head;
        while let Some(e) = cause {
            let msg = e.to_string();
            // Transparent wrappers repeat the message of their source
            if msg != last {
                let _ = write!(out, "\n  {} {msg}", console::style("Caused by:").dim());
            }

            last = msg;
            cause = e.source();
        }

        out
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl From<ConfigurationError> for CLIError {
    fn from(e: ConfigurationError) -> Self {
        Self::usage_error_from(e)
    }
}

impl From<InternalError> for CLIError {
    fn from(e: InternalError) -> Self {
        Self::failure(e)
    }
}

impl From<dill::InjectionError> for CLIError {
    fn from(e: dill::InjectionError) -> Self {
        Self::failure(e)
    }
}

impl From<MonitorError> for CLIError {
    fn from(e: MonitorError) -> Self {
        Self::failure(e)
    }
}

impl From<ThrottleError> for CLIError {
    fn from(e: ThrottleError) -> Self {
        Self::failure(e)
    }
}

impl From<LagStorageError> for CLIError {
    fn from(e: LagStorageError) -> Self {
        Self::failure(e)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
