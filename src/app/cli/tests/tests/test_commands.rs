// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use internal_error::InternalError;
use replag::*;
use replag_cli::commands::*;
use replag_cli::{CLIError, OutputFormat};
use replag_inmem::InMemoryLagStorage;
use time_source::SystemTimeSourceStub;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn replica_set() -> Arc<ReplicaSet> {
    let mut replica = MockReplicaStatusSource::new();
    replica
        .expect_describe()
        .return_const("db-replica-1:3306".to_string());

    Arc::new(
        ReplicaSet::try_new(
            PrimaryHost::try_new("db-primary").unwrap(),
            vec![Arc::new(replica)],
        )
        .unwrap(),
    )
}

fn round(sample: LagSample, average: u64, history_len: usize) -> LagRound {
    LagRound {
        sample,
        average_lag: AverageLag::new(average),
        history_len,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Monitor
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_daemon_survives_failed_rounds() {
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut monitor = MockLagMonitor::new();
    monitor.expect_monitor().times(3).returning({
        let shutdown = shutdown.clone();
        let calls = calls.clone();
        move || match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(round(4, 4, 1)),
            1 => Err(MonitorError::Internal(InternalError::new(
                "replica unreachable",
            ))),
            _ => {
                shutdown.notify_one();
                Ok(round(2, 3, 2))
            }
        }
    });

    let time_source = SystemTimeSourceStub::new();
    let command = MonitorCommand::new(
        Arc::new(monitor),
        Arc::new(time_source.clone()),
        Some(Duration::from_secs(5)),
    );

    command
        .run_daemon(Duration::from_secs(5), async move {
            shutdown.notified().await;
        })
        .await
        .unwrap();

    pretty_assertions::assert_eq!(calls.load(Ordering::SeqCst), 3);
    pretty_assertions::assert_eq!(time_source.sleeps(), vec![Duration::from_secs(5); 2]);
}

#[test_log::test(tokio::test)]
async fn test_single_round_failure_is_reported() {
    let mut monitor = MockLagMonitor::new();
    monitor.expect_monitor().times(1).returning(|| {
        Err(MonitorError::Validation(LagValidationError {
            replica: "db-replica-1:3306".to_string(),
            reason: LagValidationReason::NullField,
        }))
    });

    let mut command = MonitorCommand::new(
        Arc::new(monitor),
        Arc::new(SystemTimeSourceStub::new()),
        None,
    );

    let err = command.run().await.unwrap_err();
    assert!(matches!(err, CLIError::Failure { .. }), "{err:?}");
    pretty_assertions::assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_describe_round() {
    pretty_assertions::assert_eq!(
        MonitorCommand::describe_round(&round(12, 5, 3)),
        "Lag 12s, average 5s over 3 samples"
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Stats
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_stats_of_unmonitored_primary() {
    let command = StatsCommand::new(
        replica_set(),
        Arc::new(InMemoryLagStorage::new()),
        OutputFormat::Text,
    );

    let stats = command.collect().await.unwrap();
    pretty_assertions::assert_eq!(
        stats,
        LagStats {
            primary_host: "db-primary".to_string(),
            average_lag: 0,
            history: vec![],
        }
    );
}

#[test_log::test(tokio::test)]
async fn test_stats_render() {
    let replica_set = replica_set();
    let storage = Arc::new(InMemoryLagStorage::new());

    let host = replica_set.primary_host();
    storage
        .set_history(host, &LagHistory::from_samples([4, 0, 7]))
        .await
        .unwrap();
    storage
        .set_average_lag(host, AverageLag::new(4))
        .await
        .unwrap();

    let command = StatsCommand::new(replica_set.clone(), storage, OutputFormat::Text);
    let stats = command.collect().await.unwrap();

    pretty_assertions::assert_eq!(
        stats.render(OutputFormat::Text).unwrap(),
        "Primary host: db-primary\nAverage lag:  4s\nHistory:      [4, 0, 7] (3 of 30 samples)"
    );

    let json: serde_json::Value =
        serde_json::from_str(&stats.render(OutputFormat::Json).unwrap()).unwrap();
    pretty_assertions::assert_eq!(
        json,
        serde_json::json!({
            "primaryHost": "db-primary",
            "averageLag": 4,
            "history": [4, 0, 7],
        })
    );
}

#[test_log::test(tokio::test)]
async fn test_stats_storage_failure() {
    let mut storage = MockLagStorage::new();
    storage.expect_get_average_lag().returning(|_| {
        Err(LagStorageError::Internal(InternalError::new(
            "connection refused",
        )))
    });

    let command = StatsCommand::new(replica_set(), Arc::new(storage), OutputFormat::Json);

    let err = command.collect().await.unwrap_err();
    pretty_assertions::assert_eq!(err.exit_code(), 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Throttle
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_throttle_dry_run_does_not_pause() {
    let mut throttle = MockThrottle::new();
    throttle
        .expect_current_delay()
        .times(1)
        .returning(|| Ok(Duration::from_micros(367)));
    throttle.expect_throttle().never();

    let command = ThrottleCommand::new(Arc::new(throttle), replica_set(), true);

    let delay = command.apply().await.unwrap();
    pretty_assertions::assert_eq!(delay, Duration::from_micros(367));
    pretty_assertions::assert_eq!(
        command.describe(delay),
        "Writes to db-primary would pause for 367µs"
    );
}

#[test_log::test(tokio::test)]
async fn test_throttle_pauses() {
    let mut throttle = MockThrottle::new();
    throttle.expect_current_delay().never();
    throttle
        .expect_throttle()
        .times(1)
        .returning(|| Ok(Duration::from_secs(1)));

    let command = ThrottleCommand::new(Arc::new(throttle), replica_set(), false);

    let delay = command.apply().await.unwrap();
    pretty_assertions::assert_eq!(
        command.describe(delay),
        "Writes to db-primary paused for 1s"
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
