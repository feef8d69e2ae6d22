// ABOUTME: Derived metrics computed straight from the record set
// ABOUTME: Check-in counts, intensity/recovery averages, and activity summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! # Metrics Aggregator
//!
//! Read-time statistics over the record history. Nothing here is cached:
//! every call pulls straight from the record store, so the results can never
//! drift from the facts.

use chrono::{Duration, Utc};

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{CoreMetrics, DailyActivity, FitnessRecord, SummaryPeriod};

/// Compute the core check-in metrics for an account
///
/// Only records that are checked in AND carry both an intensity and a
/// recovery-quality score enter the averages; a checked-in record missing
/// either score is excluded entirely. One qualifying record counts as one
/// day unit, without same-day deduplication. Averages and the check-in rate
/// are rounded to one decimal.
///
/// # Errors
///
/// Returns an error if the record query fails.
pub async fn compute_core_metrics(db: &Database, account_id: i64) -> AppResult<CoreMetrics> {
    if account_id <= 0 {
        return Err(AppError::invalid_input("account id must be positive"));
    }

    let records = db.query_records(account_id, None, None, None).await?;
    if records.is_empty() {
        return Ok(CoreMetrics::default());
    }

    let qualifying: Vec<&FitnessRecord> = records
        .iter()
        .filter(|r| r.is_checkin && r.intensity.is_some() && r.recovery_quality.is_some())
        .collect();

    let total_checkin_days = qualifying.len() as u64;
    let avg_intensity = round1(mean(qualifying.iter().filter_map(|r| r.intensity)));
    let avg_recovery_quality = round1(mean(qualifying.iter().filter_map(|r| r.recovery_quality)));
    let checkin_rate_percent = round1(qualifying.len() as f64 / records.len() as f64 * 100.0);

    Ok(CoreMetrics {
        total_checkin_days,
        avg_intensity,
        avg_recovery_quality,
        checkin_rate_percent,
    })
}

/// Per-record activity rows for the trailing summary window ending today,
/// oldest first
///
/// # Errors
///
/// Returns an error if the record query fails.
pub async fn activity_summary(
    db: &Database,
    account_id: i64,
    period: SummaryPeriod,
) -> AppResult<Vec<DailyActivity>> {
    if account_id <= 0 {
        return Err(AppError::invalid_input("account id must be positive"));
    }

    let end = Utc::now().date_naive();
    let start = end - Duration::days(period.days());

    let mut records = db
        .query_records(account_id, Some(start), Some(end), None)
        .await?;
    records.reverse();

    Ok(records
        .into_iter()
        .map(|r| DailyActivity {
            date: r.date,
            exercise_type: r.exercise_type,
            duration_minutes: r.duration_minutes,
            distance_km: r.distance_km,
            calories: r.calories,
        })
        .collect())
}

/// Mean of an iterator of values, 0.0 when empty
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u64;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
