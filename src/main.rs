use std::path::PathBuf;

use anyhow::{Context, Result};
use ccb_booker::{
    AppConfig, BookingFilter, BookingOutcome, CcbSite, PageAutomation, RunSummary, SystemClock,
    book_day, parse_day, select_day,
};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "ccb-booker")]
#[command(about = "Books the configured gym classes when a place is free")]
struct Args {
    /// Day to process (dd/mm/yyyy); defaults to the next configured day
    #[arg(long, value_parser = parse_day_arg)]
    day: Option<NaiveDate>,

    /// Extra configuration file, applied over the default locations
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_day_arg(token: &str) -> Result<NaiveDate, String> {
    parse_day(token).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("ccb_booker=debug");

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = match args.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path)),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;
    tracing::info!("Config file read");

    let booking_filter =
        BookingFilter::from_days(&config.days).context("Invalid 'days' configuration")?;
    let day = select_day(&booking_filter, args.day, &SystemClock)?;
    tracing::info!(
        "Looking for {} on {}",
        booking_filter
            .wanted_classes()
            .map(|tag| tag.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        day
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let summary = rt.block_on(run(&config, &booking_filter, day))?;
    report(&summary);

    Ok(())
}

/// Log in, book the day and always close the browser afterwards.
async fn run(config: &AppConfig, filter: &BookingFilter, day: NaiveDate) -> Result<RunSummary> {
    let mut site = CcbSite::connect(config).await?;

    let result: Result<RunSummary> = async {
        site.login(&config.credentials).await?;
        book_day(&mut site, filter, day).await
    }
    .await;

    if let Err(e) = site.close().await {
        tracing::warn!("Failed to close browser session: {:#}", e);
    }
    result
}

fn report(summary: &RunSummary) {
    for attempt in &summary.attempts {
        tracing::info!("{} -> {}", attempt.record, attempt.outcome);
    }
    if !summary.unregistered.is_empty() {
        tracing::warn!("Unregistered activities: {}", summary.unregistered.join(", "));
    }
    if !summary.skipped.is_empty() {
        tracing::warn!("{} rows could not be read", summary.skipped.len());
    }
    if summary.count(BookingOutcome::BookFailed) > 0 {
        tracing::error!(
            "{} bookings failed on {}",
            summary.count(BookingOutcome::BookFailed),
            summary.day
        );
    }
    if summary.attempts.is_empty() {
        tracing::info!("No wanted activity found on {}", summary.day);
    }
}
