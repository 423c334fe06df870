pub mod document;
pub mod error;
pub mod locate;
pub mod scene;
pub mod store;

pub use document::{build_document, ExportedDocument, DOCUMENT_TITLE};
pub use error::{LocateError, RenderError};
pub use locate::{LocateOutcome, StationLocator, StationResult};
pub use scene::{render_png, RenderedPlot, ResultRenderer, PLOT_HEIGHT, PLOT_WIDTH};
pub use store::ArtifactStore;
