//! `preview://` URI scheme: streams the selected video to the webview's
//! `<video>` element while its preview handle is live.

use std::io::SeekFrom;

use actionlens_core::{MediaSource, PreviewSource};
use tauri::http::{header, Request, Response, StatusCode};
use tauri::{Manager, Runtime, UriSchemeContext, UriSchemeResponder};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use crate::state::AnalysisState;

/// Largest slice served for an open-ended range request.
const MAX_CHUNK: u64 = 4 * 1024 * 1024;

/// A byte range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a single-range `Range` header against a body of `total` bytes.
///
/// Returns `None` when the range cannot be satisfied. Multi-range requests
/// are answered with the first range only.
pub fn parse_range(value: &str, total: u64) -> Option<ByteRange> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let first = spec.split(',').next()?.trim();
    let (start, end) = first.split_once('-')?;

    if total == 0 {
        return None;
    }

    let range = match (start.trim(), end.trim()) {
        ("", suffix) => {
            let suffix: u64 = suffix.parse().ok()?;
            if suffix == 0 {
                return None;
            }
            ByteRange {
                start: total.saturating_sub(suffix),
                end: total - 1,
            }
        }
        (start, "") => {
            let start: u64 = start.parse().ok()?;
            ByteRange {
                start,
                end: (start + MAX_CHUNK - 1).min(total - 1),
            }
        }
        (start, end) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if end < start {
                return None;
            }
            ByteRange {
                start,
                end: end.min(total - 1),
            }
        }
    };

    (range.start < total).then_some(range)
}

pub fn handle<R: Runtime>(
    ctx: UriSchemeContext<'_, R>,
    request: Request<Vec<u8>>,
    responder: UriSchemeResponder,
) {
    let Some(state) = ctx.app_handle().try_state::<AnalysisState>() else {
        responder.respond(status_only(StatusCode::SERVICE_UNAVAILABLE));
        return;
    };

    let path = request.uri().path().to_string();
    let source = state.previews.resolve_path(&path);
    let range = request
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    tauri::async_runtime::spawn(async move {
        let response = match source {
            Some(source) => serve(source, range.as_deref()).await,
            None => {
                debug!("No live preview at {}", path);
                status_only(StatusCode::NOT_FOUND)
            }
        };
        responder.respond(response);
    });
}

async fn serve(preview: PreviewSource, range: Option<&str>) -> Response<Vec<u8>> {
    let total = match source_len(&preview.source).await {
        Ok(total) => total,
        Err(e) => {
            warn!("Preview source unavailable: {}", e);
            return status_only(StatusCode::NOT_FOUND);
        }
    };

    let Some(range) = range else {
        let whole = ByteRange {
            start: 0,
            end: total.saturating_sub(1),
        };
        return match read_slice(&preview.source, whole, total).await {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, preview.mime)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, body.len())
                .body(body)
                .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR)),
            Err(e) => {
                warn!("Failed to read preview: {}", e);
                status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
    };

    let Some(range) = parse_range(range, total) else {
        return Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{}", total))
            .body(Vec::new())
            .unwrap_or_else(|_| status_only(StatusCode::RANGE_NOT_SATISFIABLE));
    };

    match read_slice(&preview.source, range, total).await {
        Ok(body) => Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, preview.mime)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, total),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(body)
            .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR)),
        Err(e) => {
            warn!("Failed to read preview range: {}", e);
            status_only(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn source_len(source: &MediaSource) -> std::io::Result<u64> {
    match source {
        MediaSource::Path(path) => Ok(tokio::fs::metadata(path).await?.len()),
        MediaSource::Memory(bytes) => Ok(bytes.len() as u64),
    }
}

async fn read_slice(
    source: &MediaSource,
    range: ByteRange,
    total: u64,
) -> std::io::Result<Vec<u8>> {
    if total == 0 {
        return Ok(Vec::new());
    }
    match source {
        MediaSource::Path(path) => {
            let mut file = tokio::fs::File::open(path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;
            let mut body = Vec::with_capacity(range.len() as usize);
            file.take(range.len()).read_to_end(&mut body).await?;
            Ok(body)
        }
        MediaSource::Memory(bytes) => {
            Ok(bytes[range.start as usize..=range.end as usize].to_vec())
        }
    }
}

fn status_only(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}
