// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;
use std::time::Duration;

use duration_string::DurationString;

use crate::OutputFormat;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Monitors MySQL replication lag and throttles writers proportionally to it
#[derive(Debug, clap::Parser)]
#[command(name = crate::BINARY_NAME, version = crate::VERSION)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(
        long,
        global = true,
        env = "REPLAG_CONFIG",
        default_value = "replag.yaml"
    )]
    pub config: PathBuf,

    /// Sets the level of verbosity (repeat for more)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs as JSON into this file instead of STDERR
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    Monitor(Monitor),
    Stats(Stats),
    Throttle(Throttle),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Samples replica lag and updates the stored history and average
#[derive(Debug, clap::Args)]
pub struct Monitor {
    /// Keep sampling until interrupted
    #[arg(long)]
    pub daemon: bool,

    /// Pause between rounds in daemon mode [default: monitor.interval from
    /// config]
    #[arg(long, requires = "daemon", value_parser = parse_duration)]
    pub interval: Option<Duration>,
}

/// Prints the stored lag statistics of the primary
#[derive(Debug, clap::Args)]
pub struct Stats {
    /// Format of the output
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,
}

/// Applies the write throttle once and prints the pause
#[derive(Debug, clap::Args)]
pub struct Throttle {
    /// Compute the pause without sleeping
    #[arg(long)]
    pub dry_run: bool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn parse_duration(s: &str) -> Result<Duration, String> {
    let duration = DurationString::try_from(s.to_string()).map_err(|e| e.to_string())?;
    Ok(duration.into())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
