// ABOUTME: Integration tests for the core metrics aggregator
// ABOUTME: Covers check-in filtering, rounding, and empty-history behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{Duration, Utc};
use fitledger::database::test_utils::create_test_db;
use fitledger::models::{CoreMetrics, NewFitnessRecord, RecordAnnotations, SummaryPeriod};
use fitledger::service::FitnessService;

async fn create_test_service() -> FitnessService {
    FitnessService::new(create_test_db().await.unwrap())
}

async fn register(service: &FitnessService, username: &str) -> i64 {
    service
        .register_account(username, "secret123")
        .await
        .unwrap()
}

/// Insert a record `offset` days back, optionally annotated
async fn add_record(
    service: &FitnessService,
    account_id: i64,
    offset: i64,
    annotations: Option<RecordAnnotations>,
) -> i64 {
    let record_id = service
        .add_record(&NewFitnessRecord {
            account_id,
            date: Utc::now().date_naive() - Duration::days(offset),
            exercise_type: "run".to_owned(),
            duration_minutes: 30.0,
            distance_km: None,
            calories: None,
            is_official: false,
            notes: None,
        })
        .await
        .unwrap();

    if let Some(annotations) = annotations {
        assert!(service
            .annotate_record(record_id, account_id, &annotations)
            .await
            .unwrap());
    }
    record_id
}

fn full_checkin(intensity: f64, recovery: f64) -> RecordAnnotations {
    RecordAnnotations {
        is_checkin: Some(true),
        intensity: Some(intensity),
        recovery_quality: Some(recovery),
        notes: None,
    }
}

#[tokio::test]
async fn empty_history_yields_all_zero_metrics() {
    let service = create_test_service().await;
    let account_id = register(&service, "quiet").await;

    let metrics = service.core_metrics(account_id).await.unwrap();
    assert_eq!(metrics, CoreMetrics::default());
}

#[tokio::test]
async fn checkins_missing_scores_are_excluded_entirely() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    // Two fully annotated check-ins
    add_record(&service, account_id, 1, Some(full_checkin(7.0, 8.0))).await;
    add_record(&service, account_id, 2, Some(full_checkin(6.0, 9.0))).await;

    // Checked in but missing a recovery score: excluded from everything
    add_record(
        &service,
        account_id,
        3,
        Some(RecordAnnotations {
            is_checkin: Some(true),
            intensity: Some(10.0),
            recovery_quality: None,
            notes: None,
        }),
    )
    .await;

    // Not checked in at all
    add_record(&service, account_id, 4, None).await;

    let metrics = service.core_metrics(account_id).await.unwrap();
    assert_eq!(metrics.total_checkin_days, 2);
    assert!((metrics.avg_intensity - 6.5).abs() < f64::EPSILON);
    assert!((metrics.avg_recovery_quality - 8.5).abs() < f64::EPSILON);
    // 2 of 4 records qualify
    assert!((metrics.checkin_rate_percent - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn averages_and_rate_round_to_one_decimal() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    add_record(&service, account_id, 1, Some(full_checkin(7.0, 5.0))).await;
    add_record(&service, account_id, 2, Some(full_checkin(8.0, 6.0))).await;
    add_record(&service, account_id, 3, Some(full_checkin(7.0, 6.0))).await;

    // 2 plain records make the rate 3/5 = 60.0%
    add_record(&service, account_id, 4, None).await;
    add_record(&service, account_id, 5, None).await;

    let metrics = service.core_metrics(account_id).await.unwrap();
    assert_eq!(metrics.total_checkin_days, 3);
    // 22/3 = 7.333... -> 7.3, 17/3 = 5.666... -> 5.7
    assert!((metrics.avg_intensity - 7.3).abs() < f64::EPSILON);
    assert!((metrics.avg_recovery_quality - 5.7).abs() < f64::EPSILON);
    assert!((metrics.checkin_rate_percent - 60.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn duplicate_same_day_checkins_both_count() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    add_record(&service, account_id, 1, Some(full_checkin(6.0, 6.0))).await;
    add_record(&service, account_id, 1, Some(full_checkin(8.0, 8.0))).await;

    let metrics = service.core_metrics(account_id).await.unwrap();
    // One record = one day unit, without same-day deduplication
    assert_eq!(metrics.total_checkin_days, 2);
    assert!((metrics.avg_intensity - 7.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn records_without_scores_still_count_toward_the_rate_denominator() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    add_record(&service, account_id, 1, Some(full_checkin(9.0, 9.0))).await;
    add_record(&service, account_id, 2, None).await;
    add_record(&service, account_id, 3, None).await;

    let metrics = service.core_metrics(account_id).await.unwrap();
    assert_eq!(metrics.total_checkin_days, 1);
    // 1/3 -> 33.333... -> 33.3
    assert!((metrics.checkin_rate_percent - 33.3).abs() < f64::EPSILON);
}

#[tokio::test]
async fn activity_summary_returns_window_rows_oldest_first() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    for offset in [1, 3, 5] {
        add_record(&service, account_id, offset, None).await;
    }
    // Outside the trailing week
    add_record(&service, account_id, 20, None).await;

    let summary = service
        .activity_summary(account_id, SummaryPeriod::Week)
        .await
        .unwrap();
    assert_eq!(summary.len(), 3);
    assert!(summary.windows(2).all(|w| w[0].date <= w[1].date));

    let month = service
        .activity_summary(account_id, SummaryPeriod::Month)
        .await
        .unwrap();
    assert_eq!(month.len(), 4);
}
