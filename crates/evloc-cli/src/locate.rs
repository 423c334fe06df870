use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use evloc_core::{AppConfig, Point};
use evloc_render::{ArtifactStore, LocateOutcome, StationLocator, StationResult};

fn build_locator(config: &AppConfig) -> anyhow::Result<StationLocator> {
    let catalog = evloc_core::load_catalog(&config.catalog_path)
        .with_context(|| format!("loading catalog {}", config.catalog_path.display()))?;
    let store = Arc::new(ArtifactStore::new(config.artifact_dir.clone()));
    Ok(StationLocator::new(catalog, store))
}

fn print_result(locator: &StationLocator, result: &StationResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.station)?);
    eprintln!(
        "{} plot saved to {}",
        result.kind,
        locator.slot_path().display()
    );
    Ok(())
}

/// Print the closest station as JSON and save its plot.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, is empty, or the plot
/// cannot be written.
pub(crate) fn run_nearest(config: &AppConfig, lat: f64, lng: f64) -> anyhow::Result<()> {
    let locator = build_locator(config)?;
    let result = locator.locate_nearest(Point::new(lat, lng))?;
    print_result(&locator, &result)
}

/// Print the highest-power station within `range` as JSON and save its plot.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the radius is invalid,
/// no station lies within range, or the plot cannot be written.
pub(crate) fn run_best(config: &AppConfig, lat: f64, lng: f64, range: f64) -> anyhow::Result<()> {
    let locator = build_locator(config)?;
    match locator.locate_best_in_range(Point::new(lat, lng), range)? {
        LocateOutcome::Found(result) => print_result(&locator, &result),
        LocateOutcome::NotFound => {
            anyhow::bail!("no charging station within range {range} of ({lat}, {lng})")
        }
    }
}

/// Write the document built from the current plot slot to `out`.
///
/// Does not need the catalog; an empty slot yields a header-only document.
///
/// # Errors
///
/// Returns an error if the slot cannot be read or `out` cannot be written.
pub(crate) fn run_export(config: &AppConfig, out: &Path) -> anyhow::Result<()> {
    let document = ArtifactStore::new(config.artifact_dir.clone()).package_as_document()?;
    std::fs::write(out, &document.bytes)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {} ({} bytes)", out.display(), document.bytes.len());
    Ok(())
}
