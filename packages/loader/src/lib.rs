#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads every configured table and produces one frozen
//! [`AreaCollection`].
//!
//! The US states, US counties, world and population loads run concurrently;
//! the first failure aborts the whole load and no partial collection is
//! returned. Everything after the fetches is synchronous: areas are
//! concatenated (states, counties, world), decorated with daily
//! differences and moving averages, joined with population, and frozen.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use covid_tracker_analytics::decorate;
use covid_tracker_analytics::population::{PopulationIndex, join_population};
use covid_tracker_scraper::{CsvTable, ScrapeError, TableSource};
use covid_tracker_series_models::{Area, AreaCollection, AreaCollectionBuilder};
use covid_tracker_source::config::{LoadConfig, TableLocation};
use covid_tracker_source::population::population_entries;
use covid_tracker_source::progress::{ProgressCallback, null_progress};
use covid_tracker_source::{SourceError, us, world};

/// Errors that abort a load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A table could not be fetched or parsed.
    #[error("Fetch failed: {0}")]
    Scrape(#[from] ScrapeError),

    /// A table could not be normalized, or the config is unusable.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Runs a full load without progress reporting.
///
/// # Errors
///
/// Returns [`LoadError`] if any fetch fails, any table cannot be
/// normalized, or the config is invalid.
pub async fn load_data(
    source: &impl TableSource,
    config: &LoadConfig,
) -> Result<AreaCollection, LoadError> {
    load_data_with_progress(source, config, &null_progress()).await
}

/// Runs a full load, reporting one progress step per fetched table.
///
/// # Errors
///
/// Returns [`LoadError`] if any fetch fails, any table cannot be
/// normalized, or the config is invalid.
pub async fn load_data_with_progress(
    source: &impl TableSource,
    config: &LoadConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<AreaCollection, LoadError> {
    config.validate()?;
    let start = Instant::now();

    let window = moving_average_window(config)?;
    let table_count = if config.derive.include_population { 5 } else { 4 };
    progress.set_total(table_count);

    let (states, counties, world, population) = tokio::try_join!(
        load_states(source, config, progress),
        load_counties(source, config, progress),
        load_world(source, config, progress),
        load_population(source, config, progress),
    )?;

    progress.finish(format!("fetched {table_count} tables"));
    log::info!("Fetched all tables in {:.1}s", start.elapsed().as_secs_f64());

    let mut builder = AreaCollectionBuilder::new();
    builder.extend(states);
    builder.extend(counties);
    builder.extend(world);

    builder.map_areas(|area| decorate(area, window));

    if let Some(index) = population {
        let (areas, report) = join_population(builder.take_areas(), &index);
        builder.extend(areas);
        log::info!(
            "Population joined onto {} areas ({} without a match)",
            report.matched,
            report.unmatched
        );
    }

    warn_unordered(builder.areas());

    let collection = builder.freeze();
    log::info!(
        "Loaded {} areas in {:.1}s",
        collection.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(collection)
}

fn moving_average_window(config: &LoadConfig) -> Result<Option<NonZeroUsize>, SourceError> {
    if !config.derive.include_moving_average {
        return Ok(None);
    }
    NonZeroUsize::new(config.derive.moving_average_window)
        .map(Some)
        .ok_or_else(|| {
            SourceError::InvalidConfig("moving_average_window must be at least 1".to_owned())
        })
}

fn warn_unordered(areas: &[Area]) {
    for area in areas.iter().filter(|a| !a.is_chronological()) {
        log::warn!(
            "[{}] dates are out of order or repeated, deltas are unreliable",
            area.key
        );
    }
}

async fn fetch(
    source: &impl TableSource,
    label: &str,
    location: &TableLocation,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CsvTable, ScrapeError> {
    log::info!("[{label}] Fetching {}", location.url);
    let table = source.fetch_table(&location.request()).await?;
    progress.inc(1);
    progress.set_message(format!("fetched {label}"));
    log::info!("[{label}] {} rows", table.len());
    Ok(table)
}

async fn load_states(
    source: &impl TableSource,
    config: &LoadConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<Area>, LoadError> {
    let table = fetch(source, "us_states", &config.sources.us_states, progress).await?;
    Ok(us::state_areas(
        &table,
        "us_states",
        config.derive.key_format,
        config.derive.malformed_rows,
    )?)
}

async fn load_counties(
    source: &impl TableSource,
    config: &LoadConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<Area>, LoadError> {
    let table = fetch(source, "us_counties", &config.sources.us_counties, progress).await?;
    Ok(us::county_areas(
        &table,
        "us_counties",
        config.derive.key_format,
        config.derive.malformed_rows,
    )?)
}

async fn load_world(
    source: &impl TableSource,
    config: &LoadConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<Area>, LoadError> {
    let (confirmed, deaths) = tokio::try_join!(
        fetch(
            source,
            "world_confirmed",
            &config.sources.world_confirmed,
            progress
        ),
        fetch(source, "world_deaths", &config.sources.world_deaths, progress),
    )?;
    Ok(world::world_areas(
        &confirmed,
        &deaths,
        "world",
        config.derive.malformed_rows,
    )?)
}

async fn load_population(
    source: &impl TableSource,
    config: &LoadConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Option<PopulationIndex>, LoadError> {
    if !config.derive.include_population {
        return Ok(None);
    }
    let Some(location) = &config.sources.population else {
        return Err(SourceError::InvalidConfig(
            "include_population is set but [sources.population] is missing".to_owned(),
        )
        .into());
    };

    let table = fetch(source, "population", location, progress).await?;
    let index = population_entries(&table, "population")?
        .into_iter()
        .map(|entry| (entry.combined_key, entry.population))
        .collect::<PopulationIndex>();

    Ok(Some(index))
}
