// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::Catalog;

use crate::commands::*;
use crate::config::ReplagConfig;
use crate::{CLIError, cli};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn get_command(
    catalog: &Catalog,
    config: &ReplagConfig,
    command: cli::Command,
) -> Result<Box<dyn Command>, CLIError> {
    let command: Box<dyn Command> = match command {
        cli::Command::Monitor(c) => Box::new(MonitorCommand::new(
            catalog.get_one()?,
            catalog.get_one()?,
            c.daemon
                .then(|| c.interval.unwrap_or_else(|| config.monitor.interval())),
        )),
        cli::Command::Stats(c) => Box::new(StatsCommand::new(
            catalog.get_one()?,
            catalog.get_one()?,
            c.output_format,
        )),
        cli::Command::Throttle(c) => Box::new(ThrottleCommand::new(
            catalog.get_one()?,
            catalog.get_one()?,
            c.dry_run,
        )),
    };

    Ok(command)
}
