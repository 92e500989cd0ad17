//! File routes: list, download and the upload exchange.

use axum::{
    Json, Router,
    body::Body,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::stream::{self, SplitStream, Stream};
use futures::{SinkExt, StreamExt};
use localcloud_core::access::CallerIdentity;
use localcloud_core::files::FileSummary;
use localcloud_core::transfer::{FileMeta, TransferError, UploadMessage};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::auth::Caller;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing files.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    /// `internal` or `external`. Missing is treated as invalid.
    #[serde(default)]
    pub storage_class: String,
    /// Logical path prefix; empty matches everything.
    #[serde(default)]
    pub path_prefix: String,
}

/// Response for listing files.
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    /// Visible files, newest first.
    pub files: Vec<FileSummary>,
}

/// Text frames a client may send during an upload.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlFrame {
    Meta(FileMeta),
    End,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/files?storage_class=..&path_prefix=..`
async fn list_files(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let records = state
        .file_service()
        .list(caller.identity(), &query.storage_class, &query.path_prefix)
        .await?;

    debug!(
        storage_class = %query.storage_class,
        path_prefix = %query.path_prefix,
        count = records.len(),
        "Files listed"
    );

    Ok(Json(ListFilesResponse {
        files: records.into_iter().map(FileSummary::from).collect(),
    }))
}

/// GET `/files/{id}/download`
///
/// Errors found before the first chunk are JSON responses; the body itself
/// is the raw content.
async fn download_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let chunks = state
        .file_service()
        .download(caller.identity(), &id)
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(chunks),
    )
        .into_response())
}

/// GET `/files/upload` (WebSocket)
async fn upload_file(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_upload(socket, state, caller))
}

/// Drives one upload over an open socket, replies once, then closes.
async fn run_upload(socket: WebSocket, state: AppState, caller: Option<CallerIdentity>) {
    let (mut sender, receiver) = socket.split();

    let reply = match state
        .file_service()
        .upload(caller.as_ref(), upload_messages(receiver))
        .await
    {
        Ok(file_id) => {
            debug!(file_id = %file_id, "Upload accepted");
            json!({ "file_id": file_id })
        }
        Err(e) => ApiError::from(e).body(),
    };

    if let Err(e) = sender.send(Message::Text(reply.to_string().into())).await {
        debug!(error = %e, "Upload reply not delivered");
        return;
    }
    if let Err(e) = sender.send(Message::Close(None)).await {
        debug!(error = %e, "Upload close frame not delivered");
    }
}

/// Turns socket frames into upload messages.
///
/// The `end` frame ends the stream. A close frame, a socket error or the
/// socket ending first yields `Cancelled`. Nothing is yielded after an error.
fn upload_messages(
    receiver: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<UploadMessage, TransferError>> + Send {
    stream::unfold(Some(receiver), |receiver| async move {
        let mut receiver = receiver?;
        loop {
            let item = match receiver.next().await {
                None | Some(Ok(Message::Close(_))) => Err(TransferError::cancelled(
                    "connection closed before end of input",
                )),
                Some(Err(e)) => Err(TransferError::cancelled(e.to_string())),
                Some(Ok(Message::Binary(data))) => Ok(UploadMessage::Chunk(data)),
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ControlFrame>(text.as_str()) {
                        Ok(ControlFrame::Meta(meta)) => Ok(UploadMessage::Meta(meta)),
                        Ok(ControlFrame::End) => return None,
                        Err(e) => Err(TransferError::malformed(e.to_string())),
                    }
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            };

            let next = item.is_ok().then_some(receiver);
            return Some((item, next));
        }
    })
}

/// Creates file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(list_files))
        .route("/files/upload", get(upload_file))
        .route("/files/{id}/download", get(download_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_frame_parses() {
        let frame: ControlFrame = serde_json::from_str(
            r#"{"type":"meta","id":"f1","owner_id":"alice","storage_class":"internal","logical_path":"docs/a.txt"}"#,
        )
        .unwrap();

        let ControlFrame::Meta(meta) = frame else {
            panic!("expected meta frame");
        };
        assert_eq!(meta.id, "f1");
        assert_eq!(meta.owner_id, "alice");
        assert_eq!(meta.storage_class, "internal");
        assert_eq!(meta.logical_path, "docs/a.txt");
    }

    #[test]
    fn test_end_frame_parses() {
        let frame: ControlFrame = serde_json::from_str(r#"{"type":"end"}"#).unwrap();
        assert!(matches!(frame, ControlFrame::End));
    }

    #[test]
    fn test_unknown_frame_type_is_rejected() {
        assert!(serde_json::from_str::<ControlFrame>(r#"{"type":"chunk"}"#).is_err());
        assert!(serde_json::from_str::<ControlFrame>(r#"{"id":"f1"}"#).is_err());
    }

    #[test]
    fn test_logical_path_defaults_to_empty() {
        let frame: ControlFrame = serde_json::from_str(
            r#"{"type":"meta","id":"f1","owner_id":"alice","storage_class":"external"}"#,
        )
        .unwrap();
        let ControlFrame::Meta(meta) = frame else {
            panic!("expected meta frame");
        };
        assert_eq!(meta.logical_path, "");
    }
}
