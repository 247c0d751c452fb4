//! Solarsync command line tool.
//!
//! Manual dispatch for the jobs the daemon runs on a schedule: one-day
//! pulls, the historic backfills, and database schema setup. Exit code is
//! zero iff the invoked operation succeeded.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solar_tools::jobs::{backfill, daily};
use solar_tools::report::{self, Period};
use solar_tools::{time, GrowattClient, SolarStore, SyncConfig};

#[derive(Parser)]
#[command(name = "solarctl")]
#[command(version, about = "Solarsync command line tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull one day's power and energy data
    Pull {
        /// The date to pull (YYYY-MM-DD). Defaults to today in plant time.
        #[arg(long)]
        date: Option<String>,
    },
    /// Back-fill daily energy totals, newest first, in 7-day windows
    BackfillEnergy,
    /// Back-fill 5-minute power readings, newest first, one day at a time
    BackfillPower,
    /// Summarize ingested data for a day, week, month, or year
    Report {
        /// Period to summarize.
        #[arg(long, value_enum, default_value = "day")]
        period: PeriodArg,
        /// A date inside the period (YYYY-MM-DD). Defaults to today in
        /// plant time.
        #[arg(long)]
        date: Option<String>,
    },
    /// Create the MongoDB collections and indexes
    SetupDb,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Day,
    Week,
    Month,
    Year,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Day => Period::Day,
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
            PeriodArg::Year => Period::Year,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pull { date } => {
            let date = parse_date_arg(date)?;
            let (config, client, store) = provision().await?;
            let report = daily::run(&config, &client, &store, date).await?;
            tracing::info!(
                date = %date,
                energy_kwh = ?report.energy_kwh,
                power_readings = report.power_readings,
                "Pull complete"
            );
        }
        Commands::BackfillEnergy => {
            let (config, client, store) = provision().await?;
            let report = backfill::energy(&config, &client, &store).await?;
            tracing::info!(
                windows = report.windows,
                rows = report.rows_written,
                "Energy backfill complete"
            );
        }
        Commands::BackfillPower => {
            let (config, client, store) = provision().await?;
            let report = backfill::power(&config, &client, &store).await?;
            tracing::info!(
                days = report.windows,
                rows = report.rows_written,
                "Power backfill complete"
            );
        }
        Commands::Report { period, date } => {
            let date = parse_date_arg(date)?;

            // Reading back the store needs no API credentials.
            let plant_id: i64 = std::env::var("GROWATT_PLANT_ID")
                .context("GROWATT_PLANT_ID missing")?
                .parse()
                .context("GROWATT_PLANT_ID is not a number")?;
            let uri = std::env::var("MONGODB_URI").context("MONGODB_URI missing")?;
            let store = SolarStore::connect(&uri).await?;

            let summary = report::generate(&store, plant_id, period.into(), date).await?;
            print_report(&summary);
        }
        Commands::SetupDb => {
            // Schema setup only touches the database, so only the
            // connection string is required.
            let uri = std::env::var("MONGODB_URI").context("MONGODB_URI missing")?;
            let store = SolarStore::connect(&uri).await?;
            store.ensure_schema().await?;
        }
    }

    Ok(())
}

fn parse_date_arg(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {raw} (expected YYYY-MM-DD)")),
        None => Ok(time::today_ist()),
    }
}

fn print_report(summary: &report::Report) {
    println!(
        "{} -> {}  ({} day(s) with data)",
        summary.window.first_day,
        summary.window.last_day,
        summary.days.len()
    );
    println!("Total energy: {:.2} kWh", summary.total_kwh);
    if let Some(peak) = &summary.peak {
        println!(
            "Peak power:   {:.0} W at {}",
            peak.power_w,
            peak.timestamp.with_timezone(&time::ist()).format("%H:%M")
        );
    }
    for day in &summary.days {
        println!(
            "  {}  {:>8.2} kWh",
            day.date.with_timezone(&time::ist()).date_naive(),
            day.energy_kwh
        );
    }
}

/// One provisioning sequence per run: load the environment, build the API
/// client and the store.
async fn provision() -> Result<(SyncConfig, GrowattClient, SolarStore)> {
    let config = SyncConfig::from_env()?;
    let client = GrowattClient::with_base_url(&config.api_token, &config.api_base);
    let store = SolarStore::connect(&config.mongo_uri).await?;
    Ok((config, client, store))
}
