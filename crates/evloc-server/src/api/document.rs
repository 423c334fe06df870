use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};

use crate::middleware::RequestId;

use super::{run_blocking, ApiError, AppState};

/// Serve the last rendered plot as a PDF attachment. Works before any query
/// has run; the document then carries only its header.
pub(super) async fn download(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let locator = state.locator.clone();
    let document = run_blocking(state.render_timeout, &req_id.0, move |_| {
        locator.export_document()
    })
    .await?
    .map_err(|e| {
        tracing::error!(error = %e, "document export failed");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to build document")
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, document.media_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.bytes,
    )
        .into_response())
}
