//! Query entry points: select a station, render the result, persist the plot.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use evloc_core::{Catalog, Point, RangeSelection, SelectionKind, Station};

use crate::document::ExportedDocument;
use crate::error::{LocateError, RenderError};
use crate::scene::{RenderedPlot, ResultRenderer};
use crate::store::ArtifactStore;

/// A successful query: the full selected record plus its rendered plot.
#[derive(Debug, Clone)]
pub struct StationResult {
    pub station: Station,
    pub kind: SelectionKind,
    pub plot: RenderedPlot,
}

#[derive(Debug, Clone)]
pub enum LocateOutcome {
    Found(StationResult),
    /// No catalog station lies within the requested radius.
    NotFound,
}

/// Ties the read-only catalog to the renderer and its artifact store.
///
/// Selection is lock-free; only the final slot write is serialized.
#[derive(Debug, Clone)]
pub struct StationLocator {
    catalog: Catalog,
    renderer: ResultRenderer,
}

impl StationLocator {
    #[must_use]
    pub fn new(catalog: Catalog, store: Arc<ArtifactStore>) -> Self {
        Self {
            catalog,
            renderer: ResultRenderer::new(store),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Where each successful query's plot is written.
    #[must_use]
    pub fn slot_path(&self) -> &Path {
        self.renderer.store().slot_path()
    }

    /// # Errors
    ///
    /// `LocateError::Query` for an empty catalog or non-finite coordinates;
    /// `LocateError::Render` if the plot cannot be encoded or saved.
    pub fn locate_nearest(&self, point: Point) -> Result<StationResult, LocateError> {
        self.locate_nearest_cancellable(point, &AtomicBool::new(false))
    }

    /// [`locate_nearest`](Self::locate_nearest) that skips the slot write
    /// once `cancelled` is set.
    ///
    /// # Errors
    ///
    /// As for `locate_nearest`, plus `LocateError::Cancelled`.
    pub fn locate_nearest_cancellable(
        &self,
        point: Point,
        cancelled: &AtomicBool,
    ) -> Result<StationResult, LocateError> {
        let station = self.catalog.nearest(point)?;
        self.finish(point, station, SelectionKind::Nearest, cancelled)
    }

    /// # Errors
    ///
    /// `LocateError::Query` for an invalid radius or non-finite coordinates;
    /// `LocateError::Render` if the plot cannot be encoded or saved.
    pub fn locate_best_in_range(
        &self,
        point: Point,
        radius: f64,
    ) -> Result<LocateOutcome, LocateError> {
        self.locate_best_in_range_cancellable(point, radius, &AtomicBool::new(false))
    }

    /// [`locate_best_in_range`](Self::locate_best_in_range) that skips the
    /// slot write once `cancelled` is set.
    ///
    /// # Errors
    ///
    /// As for `locate_best_in_range`, plus `LocateError::Cancelled`.
    pub fn locate_best_in_range_cancellable(
        &self,
        point: Point,
        radius: f64,
        cancelled: &AtomicBool,
    ) -> Result<LocateOutcome, LocateError> {
        match self.catalog.best_in_range(point, radius)? {
            RangeSelection::Found(station) => self
                .finish(point, station, SelectionKind::HighestPower, cancelled)
                .map(LocateOutcome::Found),
            RangeSelection::NotFound => {
                tracing::warn!(
                    lat = point.lat,
                    lon = point.lon,
                    radius,
                    "no charging station within range"
                );
                Ok(LocateOutcome::NotFound)
            }
        }
    }

    /// Package whatever plot was saved last, regardless of which query made it.
    ///
    /// # Errors
    ///
    /// See [`ArtifactStore::package_as_document`].
    pub fn export_document(&self) -> Result<ExportedDocument, RenderError> {
        self.renderer.store().package_as_document()
    }

    fn finish(
        &self,
        point: Point,
        station: &Station,
        kind: SelectionKind,
        cancelled: &AtomicBool,
    ) -> Result<StationResult, LocateError> {
        let plot = self
            .renderer
            .render(point, station, kind, self.catalog.stations(), cancelled)?
            .ok_or(LocateError::Cancelled)?;
        Ok(StationResult {
            station: station.clone(),
            kind,
            plot,
        })
    }
}
