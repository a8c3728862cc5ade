//! Upload progress measurement for multipart request bodies.
//!
//! File parts are streamed to the transport in fixed-size chunks. Every chunk
//! the transport pulls advances a shared byte counter, and each advance
//! reports `round(loaded * 100 / total)` to the caller's callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use catalog_core::ImageFile;
use futures::StreamExt;
use reqwest::multipart::Part;

use super::ApiError;

/// Size of the chunks file parts are streamed in.
const CHUNK_SIZE: usize = 64 * 1024;

/// Percentage of `total` covered by `loaded`, rounded half up.
///
/// Returns `None` when the total is unknown (zero), matching the rule that no
/// progress is reported without a total.
#[must_use]
pub fn upload_percent(loaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let loaded = u128::from(loaded.min(total));
    let total = u128::from(total);
    let percent = (loaded * 200 + total) / (total * 2);
    u8::try_from(percent).ok()
}

/// Shared byte counter for one request body.
#[derive(Clone)]
pub(super) struct ProgressCounter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    loaded: AtomicU64,
    total: u64,
    on_progress: Box<dyn Fn(u8) + Send + Sync>,
}

impl ProgressCounter {
    pub(super) fn new<F>(total: u64, on_progress: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(CounterInner {
                loaded: AtomicU64::new(0),
                total,
                on_progress: Box::new(on_progress),
            }),
        }
    }

    /// Record `bytes` more bytes handed to the transport.
    fn advance(&self, bytes: u64) {
        let loaded = self.inner.loaded.fetch_add(bytes, Ordering::AcqRel) + bytes;
        if let Some(percent) = upload_percent(loaded, self.inner.total) {
            (self.inner.on_progress)(percent);
        }
    }

    /// Wrap a file as a multipart part whose bytes are counted as they are
    /// sent.
    pub(super) fn file_part(&self, file: &ImageFile) -> Result<Part, ApiError> {
        let chunks: Vec<Vec<u8>> = file.data.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let counter = self.clone();
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            counter.advance(chunk.len() as u64);
            Ok::<_, std::io::Error>(chunk)
        });

        let content_type = if file.content_type.is_empty() {
            "application/octet-stream"
        } else {
            file.content_type.as_str()
        };

        Part::stream_with_length(reqwest::Body::wrap_stream(stream), file.len() as u64)
            .file_name(file.file_name.clone())
            .mime_str(content_type)
            .map_err(ApiError::Http)
    }
}

/// Total number of file bytes in a request.
pub(super) fn total_bytes<'a>(files: impl IntoIterator<Item = &'a ImageFile>) -> u64 {
    files.into_iter().map(|file| file.len() as u64).sum()
}
