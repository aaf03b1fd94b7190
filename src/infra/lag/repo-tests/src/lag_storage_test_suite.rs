// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::Catalog;
use pretty_assertions::assert_eq;
use replag::{AverageLag, LagHistory, LagSample, LagStorage, PrimaryHost};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_missing_host_reads_as_empty(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host = PrimaryHost::try_new("db-unknown").unwrap();

    let average = storage.get_average_lag(&host).await.unwrap();
    assert_eq!(average, AverageLag::ZERO);

    let history = storage.get_history(&host).await.unwrap();
    assert!(history.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_store_average_lag(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host = PrimaryHost::try_new("db-primary").unwrap();

    storage
        .set_average_lag(&host, AverageLag::new(42))
        .await
        .unwrap();

    let average = storage.get_average_lag(&host).await.unwrap();
    assert_eq!(average, AverageLag::new(42));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_store_history(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host = PrimaryHost::try_new("db-primary").unwrap();

    let history = LagHistory::from_samples([0, 3, 1, 0, 17, 5]);
    storage.set_history(&host, &history).await.unwrap();

    let stored = storage.get_history(&host).await.unwrap();
    assert_eq!(stored.to_vec(), vec![0, 3, 1, 0, 17, 5]);
    assert_eq!(stored.average(), history.average());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_store_full_history(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host = PrimaryHost::try_new("db-primary").unwrap();

    let samples: Vec<LagSample> = (100..100 + LagHistory::CAPACITY as u64).collect();
    let history = LagHistory::from_samples(samples.clone());
    storage.set_history(&host, &history).await.unwrap();

    let stored = storage.get_history(&host).await.unwrap();
    assert_eq!(stored.len(), LagHistory::CAPACITY);
    assert_eq!(stored.to_vec(), samples);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_overwrite_replaces_values(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host = PrimaryHost::try_new("db-primary").unwrap();

    storage
        .set_average_lag(&host, AverageLag::new(10))
        .await
        .unwrap();
    storage
        .set_average_lag(&host, AverageLag::new(3))
        .await
        .unwrap();
    assert_eq!(
        storage.get_average_lag(&host).await.unwrap(),
        AverageLag::new(3)
    );

    storage
        .set_history(&host, &LagHistory::from_samples([9, 9, 9]))
        .await
        .unwrap();
    storage
        .set_history(&host, &LagHistory::from_samples([1]))
        .await
        .unwrap();
    assert_eq!(storage.get_history(&host).await.unwrap().to_vec(), vec![1]);

    // An empty history is a value too
    storage
        .set_history(&host, &LagHistory::new())
        .await
        .unwrap();
    assert!(storage.get_history(&host).await.unwrap().is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_hosts_are_isolated(catalog: &Catalog) {
    let storage = catalog.get_one::<dyn LagStorage>().unwrap();
    let host_a = PrimaryHost::try_new("db-a").unwrap();
    let host_b = PrimaryHost::try_new("db-b").unwrap();

    storage
        .set_average_lag(&host_a, AverageLag::new(7))
        .await
        .unwrap();
    storage
        .set_history(&host_a, &LagHistory::from_samples([7, 7]))
        .await
        .unwrap();

    assert_eq!(
        storage.get_average_lag(&host_b).await.unwrap(),
        AverageLag::ZERO
    );
    assert!(storage.get_history(&host_b).await.unwrap().is_empty());

    storage
        .set_average_lag(&host_b, AverageLag::new(1))
        .await
        .unwrap();

    assert_eq!(
        storage.get_average_lag(&host_a).await.unwrap(),
        AverageLag::new(7)
    );
    assert_eq!(
        storage.get_history(&host_a).await.unwrap().to_vec(),
        vec![7, 7]
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
