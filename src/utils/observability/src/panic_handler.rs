// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Reports panics as error events in addition to the default hook output, so
/// they end up in the log file when logging is redirected
pub fn set_hook_trace_panics(binary_name: &'static str) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        default_hook(info);

        let backtrace = Backtrace::force_capture();
        let error_msg = panic_message(info.payload());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));

        tracing::error!(
            binary_name,
            error_msg,
            location,
            error_backtrace = %backtrace,
            "Unhandled panic caught"
        );
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Unknown panic payload"
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
