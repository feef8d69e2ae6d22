// ABOUTME: Demo data seeder for the fitledger store
// ABOUTME: Generates accounts, records, and goals for dashboard and manual testing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fitledger Project

//! Demo data seeder for fitledger.
//!
//! Populates a database with demo accounts, a spread of activity records,
//! and one goal of each type, then runs a full reconciliation and prints the
//! resulting core metrics.
//!
//! Usage:
//! ```bash
//! # Seed with default settings
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific database with 60 days of history
//! cargo run --bin seed-demo-data -- --database-url sqlite:demo.db --days 60
//!
//! # Verbose output
//! cargo run --bin seed-demo-data -- -v
//! ```

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use fitledger::config::FitledgerConfig;
use fitledger::database::Database;
use fitledger::logging::LoggingConfig;
use fitledger::models::{GoalType, NewFitnessGoal, NewFitnessRecord, RecordAnnotations};
use fitledger::service::FitnessService;

/// Default password for all demo accounts - allows login for testing.
const DEMO_PASSWORD: &str = "DemoUser123";

const DEMO_EXERCISE_TYPES: [&str; 6] = ["run", "cycle", "swim", "strength", "squat", "yoga"];

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "Fitledger demo data seeder",
    long_about = "Populate the database with demo accounts, records, and goals"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Number of demo accounts to create
    #[arg(long, default_value = "3")]
    accounts: u32,

    /// Number of days of historical data to generate
    #[arg(long, default_value = "30")]
    days: u32,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let mut logging = LoggingConfig::from_env();
    if args.verbose {
        logging.level = "debug".into();
    }
    logging.init()?;

    let database_url = match args.database_url {
        Some(ref url) => url.clone(),
        None => FitledgerConfig::from_env()?
            .database_url
            .to_connection_string(),
    };

    info!(%database_url, accounts = args.accounts, days = args.days, "seeding demo data");

    let db = Database::new(&database_url).await?;
    let service = FitnessService::new(db);

    for index in 0..args.accounts {
        seed_account(&service, index, args.days).await?;
    }

    info!("demo data seeded");
    Ok(())
}

/// Seed one demo account: goals first, then records (which reconcile as they
/// land), then a final full reconciliation and a metrics printout.
async fn seed_account(service: &FitnessService, index: u32, days: u32) -> Result<()> {
    let username = format!("demo_user_{}", index + 1);
    let account_id = match service.register_account(&username, DEMO_PASSWORD).await {
        Ok(id) => id,
        Err(err) => {
            info!(%username, error = %err, "account exists, skipping registration");
            match service.login(&username, DEMO_PASSWORD).await? {
                Some(id) => id,
                None => anyhow::bail!("demo account {username} exists with a different password"),
            }
        }
    };

    // Deterministic per-account stream so reseeding is reproducible
    let mut rng = StdRng::seed_from_u64(u64::from(index) + 42);

    let today = Utc::now().date_naive();
    let window_start = today - Duration::days(i64::from(days));

    for (goal_type, target) in [
        (GoalType::WeeklyRunCount, 8.0),
        (GoalType::WeeklyTotalDuration, 600.0),
        (GoalType::MonthlyRunDistance, 40.0),
        (GoalType::StrengthSessionCount, 6.0),
    ] {
        service
            .add_goal(&NewFitnessGoal {
                account_id,
                goal_type,
                target_value: target,
                start_date: window_start,
                end_date: today + Duration::days(1),
            })
            .await?;
    }

    for day_offset in 0..days {
        if rng.gen_bool(0.35) {
            continue; // rest day
        }

        let exercise_type = DEMO_EXERCISE_TYPES[rng.gen_range(0..DEMO_EXERCISE_TYPES.len())];
        let duration_minutes = f64::from(rng.gen_range(20..90));
        let distance_km =
            (exercise_type == "run" || exercise_type == "cycle").then(|| {
                let tenths: f64 = f64::from(rng.gen_range(30..150));
                tenths / 10.0
            });

        let record_id = service
            .add_record(&NewFitnessRecord {
                account_id,
                date: today - Duration::days(i64::from(day_offset)),
                exercise_type: exercise_type.to_owned(),
                duration_minutes,
                distance_km,
                calories: Some(i64::from(rng.gen_range(120..700))),
                is_official: rng.gen_bool(0.2),
                notes: None,
            })
            .await?;

        if rng.gen_bool(0.7) {
            service
                .annotate_record(
                    record_id,
                    account_id,
                    &RecordAnnotations {
                        is_checkin: Some(true),
                        intensity: Some(f64::from(rng.gen_range(3..10))),
                        recovery_quality: Some(f64::from(rng.gen_range(4..10))),
                        notes: None,
                    },
                )
                .await?;
        }
    }

    let summary = service.reconcile_goals(account_id).await?;
    let metrics = service.core_metrics(account_id).await?;

    info!(
        %username,
        account_id,
        goals_updated = summary.updated,
        checkin_days = metrics.total_checkin_days,
        avg_intensity = metrics.avg_intensity,
        avg_recovery = metrics.avg_recovery_quality,
        checkin_rate = metrics.checkin_rate_percent,
        "demo account seeded"
    );

    Ok(())
}
