//! Request handlers.

use crate::error::{Result, TailError};
use crate::extract::{ChannelTransport, Frame, LineFilter, StreamingExtractor};
use crate::server::body::TailBody;
use crate::server::envelope;
use crate::server::AppState;
use crate::tail::ReverseChunkReader;
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Raw query string of `/log/tail`
#[derive(Debug, Default, Deserialize)]
pub struct TailQuery {
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    pub search: Option<String>,
    pub count: Option<String>,
}

/// Validated `/log/tail` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailRequest {
    pub file_name: PathBuf,
    pub search: Option<String>,
    pub count: Option<usize>,
}

impl TryFrom<TailQuery> for TailRequest {
    type Error = TailError;

    fn try_from(query: TailQuery) -> Result<Self> {
        let file_name = query
            .file_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TailError::validation("fileName parameter is missing or invalid"))?;

        let count = match query.count.as_deref() {
            None | Some("") => None,
            Some(raw) => match raw.parse::<usize>() {
                Ok(count) if count > 0 => Some(count),
                _ => {
                    return Err(TailError::validation(format!(
                        "count must be a positive integer, got {raw:?}"
                    )))
                }
            },
        };

        Ok(Self {
            file_name: PathBuf::from(file_name),
            search: query.search.filter(|search| !search.is_empty()),
            count,
        })
    }
}

/// `GET /logs/list`
pub async fn list_logs(State(state): State<AppState>) -> Result<Response> {
    let registry = state.registry.clone();
    let files = tokio::task::spawn_blocking(move || registry.list_accessible())
        .await
        .map_err(|e| TailError::invalid_location(PathBuf::new(), e.to_string()))??;

    let data: Vec<String> = files.iter().map(|path| path.display().to_string()).collect();
    Ok(envelope::success("list_logs", data))
}

/// `GET /log/tail`
pub async fn tail_log(
    State(state): State<AppState>,
    query: std::result::Result<Query<TailQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|rejection| TailError::validation(rejection.body_text()))?;
    let request = TailRequest::try_from(query)?;

    let registry = state.registry.clone();
    let path = request.file_name.clone();
    tokio::task::spawn_blocking(move || registry.check(&path))
        .await
        .map_err(|e| TailError::invalid_location(PathBuf::new(), e.to_string()))??;

    log::info!(
        "tail {} (search: {:?}, count: {:?})",
        request.file_name.display(),
        request.search,
        request.count
    );

    let cancel = state.shutdown.child_token();
    let guard = cancel.clone().drop_guard();
    let (transport, rx) = ChannelTransport::channel(state.stream_capacity);
    let filter = LineFilter::new(request.search, request.count);
    let mut sink = StreamingExtractor::new(transport, filter, state.settings.delimiter, cancel.clone())
        .with_debug(state.debug);
    let reader = ReverseChunkReader::new(request.file_name, state.settings);

    tokio::spawn(async move {
        if let Ok(summary) = reader.tail(&mut sink, &cancel).await {
            log::info!(
                "tail {} done: {:?}, {} chunks, {} lines forwarded",
                reader.path().display(),
                summary.outcome,
                summary.chunks_read,
                sink.lines_forwarded()
            );
        }
    });

    Ok(respond(rx, guard).await)
}

/// Pick the response from the first frame of the scan.
///
/// A failure before any output becomes a 500 envelope. Otherwise the status
/// is 200 and the rest of the frames are streamed; a later failure aborts the
/// body instead of finishing it.
async fn respond(mut rx: mpsc::Receiver<Frame>, guard: DropGuard) -> Response {
    match rx.recv().await {
        Some(Frame::Data(first)) => {
            let body = TailBody::new(first, rx, guard);
            text_response(Body::from_stream(body))
        }
        Some(Frame::Failed(message)) => envelope::error(message, serde_json::Value::Null),
        None => text_response(Body::empty()),
    }
}

fn text_response(body: Body) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
