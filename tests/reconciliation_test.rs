// ABOUTME: Integration tests for the goal-progress reconciliation engine
// ABOUTME: Pins path equivalence, idempotency, clamping, and window matching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{Duration, NaiveDate, Utc};
use fitledger::database::test_utils::create_test_db;
use fitledger::models::{GoalType, NewFitnessGoal, NewFitnessRecord};
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

fn run_record(account_id: i64, date: NaiveDate, minutes: f64) -> NewFitnessRecord {
    NewFitnessRecord {
        account_id,
        date,
        exercise_type: "run".to_owned(),
        duration_minutes: minutes,
        distance_km: Some(minutes / 6.0),
        calories: None,
        is_official: false,
        notes: None,
    }
}

/// The 30/45/20-minute scenario: progress grows with each insert, completes
/// at the target, and stays clamped there afterwards.
#[tokio::test]
async fn incremental_progress_clamps_and_latches_completion() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyTotalDuration,
            target_value: 60.0,
            start_date: today - Duration::days(6),
            end_date: today,
        })
        .await
        .unwrap();

    service
        .add_record(&run_record(account_id, today - Duration::days(2), 30.0))
        .await
        .unwrap();
    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 30.0).abs() < f64::EPSILON);
    assert!(!goal.is_completed);

    service
        .add_record(&run_record(account_id, today - Duration::days(1), 45.0))
        .await
        .unwrap();
    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 60.0).abs() < f64::EPSILON);
    assert!(goal.is_completed);

    // A further record neither overshoots the clamp nor reopens the goal
    service
        .add_record(&run_record(account_id, today, 20.0))
        .await
        .unwrap();
    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 60.0).abs() < f64::EPSILON);
    assert!(goal.is_completed);
}

#[tokio::test]
async fn reconcile_all_is_idempotent() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    for goal_type in [GoalType::WeeklyTotalDuration, GoalType::WeeklyRunCount] {
        service
            .add_goal(&NewFitnessGoal {
                account_id,
                goal_type,
                target_value: 500.0,
                start_date: today - Duration::days(14),
                end_date: today + Duration::days(14),
            })
            .await
            .unwrap();
    }

    for offset in [1, 3, 5] {
        service
            .add_record(&run_record(account_id, today - Duration::days(offset), 40.0))
            .await
            .unwrap();
    }

    service.reconcile_goals(account_id).await.unwrap();
    let first: Vec<(GoalType, f64)> = service
        .goals(account_id, true)
        .await
        .unwrap()
        .iter()
        .map(|g| (g.goal_type, g.current_value))
        .collect();

    service.reconcile_goals(account_id).await.unwrap();
    let second: Vec<(GoalType, f64)> = service
        .goals(account_id, true)
        .await
        .unwrap()
        .iter()
        .map(|g| (g.goal_type, g.current_value))
        .collect();

    assert_eq!(first, second);
    for (goal_type, value) in first {
        let expected = match goal_type {
            GoalType::WeeklyTotalDuration => 120.0,
            _ => 3.0,
        };
        assert!((value - expected).abs() < f64::EPSILON);
    }
}

/// The incremental path applied after every insert must land on the same
/// progress as one authoritative recompute at the end.
#[tokio::test]
async fn incremental_and_full_recompute_agree() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let duration_goal = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyTotalDuration,
            target_value: 1000.0,
            start_date: today - Duration::days(14),
            end_date: today + Duration::days(1),
        })
        .await
        .unwrap();
    let count_goal = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyRunCount,
            target_value: 50.0,
            start_date: today - Duration::days(14),
            end_date: today + Duration::days(1),
        })
        .await
        .unwrap();

    // add_record reconciles incrementally after each insert
    for (offset, minutes) in [(9, 30.0), (7, 55.0), (4, 25.0), (1, 60.0)] {
        service
            .add_record(&run_record(account_id, today - Duration::days(offset), minutes))
            .await
            .unwrap();
    }

    let incremental_duration = service
        .goal(duration_goal, account_id)
        .await
        .unwrap()
        .unwrap()
        .current_value;
    let incremental_count = service
        .goal(count_goal, account_id)
        .await
        .unwrap()
        .unwrap()
        .current_value;

    // One authoritative recompute over the full history
    service.reconcile_goals(account_id).await.unwrap();

    let full_duration = service
        .goal(duration_goal, account_id)
        .await
        .unwrap()
        .unwrap()
        .current_value;
    let full_count = service
        .goal(count_goal, account_id)
        .await
        .unwrap()
        .unwrap()
        .current_value;

    assert!((incremental_duration - full_duration).abs() < f64::EPSILON);
    assert!((incremental_count - full_count).abs() < f64::EPSILON);
    assert!((full_duration - 170.0).abs() < f64::EPSILON);
    assert!((full_count - 4.0).abs() < f64::EPSILON);
}

/// Window bounds are inclusive on both ends; a record one day past the end
/// date contributes nothing.
#[tokio::test]
async fn goal_window_excludes_records_outside_inclusive_bounds() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;

    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyRunCount,
            target_value: 10.0,
            start_date: start,
            end_date: end,
        })
        .await
        .unwrap();

    // On both inclusive edges, and one day outside each
    for date in [
        start,
        end,
        start - Duration::days(1),
        end + Duration::days(1),
    ] {
        service
            .add_record(&run_record(account_id, date, 30.0))
            .await
            .unwrap();
    }

    service.reconcile_goals(account_id).await.unwrap();

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn distance_goal_ignores_runs_without_distance() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::MonthlyRunDistance,
            target_value: 100.0,
            start_date: today - Duration::days(30),
            end_date: today + Duration::days(1),
        })
        .await
        .unwrap();

    let mut with_distance = run_record(account_id, today - Duration::days(2), 30.0);
    with_distance.distance_km = Some(5.5);
    service.add_record(&with_distance).await.unwrap();

    let mut without_distance = run_record(account_id, today - Duration::days(1), 30.0);
    without_distance.distance_km = None;
    service.add_record(&without_distance).await.unwrap();

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 5.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn strength_goal_counts_only_strength_vocabulary() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::StrengthSessionCount,
            target_value: 10.0,
            start_date: today - Duration::days(7),
            end_date: today + Duration::days(1),
        })
        .await
        .unwrap();

    for (offset, exercise_type) in [(1, "strength"), (2, "Weightlifting"), (3, "swim")] {
        let mut record = run_record(account_id, today - Duration::days(offset), 25.0);
        record.exercise_type = exercise_type.to_owned();
        record.distance_km = None;
        service.add_record(&record).await.unwrap();
    }

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn goal_with_no_matching_records_reconciles_to_zero() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyRunCount,
            target_value: 5.0,
            start_date: today - Duration::days(7),
            end_date: today,
        })
        .await
        .unwrap();

    let summary = service.reconcile_goals(account_id).await.unwrap();
    assert_eq!(summary.examined, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 0);

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!((goal.current_value - 0.0).abs() < f64::EPSILON);
    assert!(!goal.is_completed);
}

/// A completed goal is outside the reconciliation engine's reach: stale
/// history changes can no longer reopen or move it.
#[tokio::test]
async fn completed_goals_are_not_reconciled_again() {
    let service = create_test_service().await;
    let account_id = register(&service, "athlete").await;
    let today = Utc::now().date_naive();

    let goal_id = service
        .add_goal(&NewFitnessGoal {
            account_id,
            goal_type: GoalType::WeeklyTotalDuration,
            target_value: 30.0,
            start_date: today - Duration::days(7),
            end_date: today,
        })
        .await
        .unwrap();

    service
        .add_record(&run_record(account_id, today, 30.0))
        .await
        .unwrap();

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!(goal.is_completed);

    let summary = service.reconcile_goals(account_id).await.unwrap();
    assert_eq!(summary.examined, 0);

    let goal = service.goal(goal_id, account_id).await.unwrap().unwrap();
    assert!(goal.is_completed);
    assert!((goal.current_value - 30.0).abs() < f64::EPSILON);
}
