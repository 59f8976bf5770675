//! Response recording.
//!
//! The origin's body is teed: every chunk goes to the client as soon as the
//! origin produces it, and a copy is kept. Once the body ends, the copy is
//! handed over as a [`RecordedResponse`] so the cache can decide whether to
//! store it.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::{Body, BodyDataStream, HttpBody};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::rules::parse_max_age;

// == Recorded Response ==
/// What the origin handler produced on a cache miss.
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RecordedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The recorded `Content-Type`, empty when missing or not visible ASCII.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    /// The `max-age` of the recorded `Cache-Control`, if any.
    pub fn max_age(&self) -> Option<u64> {
        self.headers
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_max_age)
    }
}

// == Record ==
/// Returns `response` with a body that streams through unchanged while being
/// recorded.
///
/// `on_complete` runs once the client has pulled the whole body. It never runs
/// when the body fails, is dropped early or grows past `limit` bytes; a body
/// whose size hint already exceeds `limit` is not recorded at all.
pub fn record_response<F>(response: Response, limit: usize, on_complete: F) -> Response
where
    F: FnOnce(RecordedResponse) + Send + 'static,
{
    let (parts, body) = response.into_parts();
    if body.size_hint().lower() > limit as u64 {
        debug!(limit, "response body over the recording limit, not recorded");
        return Response::from_parts(parts, body);
    }

    let recording = Recording {
        status: parts.status,
        headers: parts.headers.clone(),
        buffer: BytesMut::new(),
        limit,
        on_complete: Box::new(on_complete),
    };
    let tee = TeeBody {
        inner: body.into_data_stream(),
        recording: Some(recording),
    };
    Response::from_parts(parts, Body::from_stream(tee))
}

struct Recording {
    status: StatusCode,
    headers: HeaderMap,
    buffer: BytesMut,
    limit: usize,
    on_complete: Box<dyn FnOnce(RecordedResponse) + Send>,
}

impl Recording {
    fn finish(self) {
        let recorded = RecordedResponse::new(self.status, self.headers, self.buffer.freeze());
        (self.on_complete)(recorded);
    }
}

/// Forwards every chunk of the origin body and keeps a copy.
struct TeeBody {
    inner: BodyDataStream,
    recording: Option<Recording>,
}

impl Stream for TeeBody {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match ready!(this.inner.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                if let Some(recording) = this.recording.as_mut() {
                    if recording.buffer.len() + chunk.len() > recording.limit {
                        debug!(limit = recording.limit, "response body over the recording limit, not recorded");
                        this.recording = None;
                    } else {
                        recording.buffer.extend_from_slice(&chunk);
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(err)) => {
                if this.recording.take().is_some() {
                    debug!(error = %err, "origin body failed, not recorded");
                }
                Poll::Ready(Some(Err(err)))
            }
            None => {
                if let Some(recording) = this.recording.take() {
                    recording.finish();
                }
                Poll::Ready(None)
            }
        }
    }
}
