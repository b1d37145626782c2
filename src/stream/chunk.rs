use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::search::SearchMetadata;

/// One framed unit of output. Clients concatenate chunks in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Placeholder sent before any upstream call resolves.
    Status(String),
    Content(String),
    /// Fixed apology; always the last chunk when present.
    Error(String),
}

impl StreamChunk {
    pub fn text(&self) -> &str {
        match self {
            StreamChunk::Status(text) | StreamChunk::Content(text) | StreamChunk::Error(text) => {
                text
            }
        }
    }
}

/// Producing half of a response stream.
///
/// `close` and `fail` consume the writer, so nothing can be written after the
/// stream ends. Dropping the writer also ends the stream.
pub struct ChunkWriter {
    tx: mpsc::UnboundedSender<StreamChunk>,
    metadata: Arc<OnceLock<SearchMetadata>>,
}

impl ChunkWriter {
    pub fn status(&self, text: &str) {
        self.send(StreamChunk::Status(text.to_string()));
    }

    /// Emits `text` as one content chunk per line. Empty text still yields
    /// one empty chunk.
    pub fn content_lines(&self, text: &str) {
        let mut sent = false;
        for line in text.lines() {
            self.send(StreamChunk::Content(line.replace('\r', "")));
            sent = true;
        }
        if !sent {
            self.send(StreamChunk::Content(String::new()));
        }
    }

    /// Attaches search metadata. Only the first call has an effect.
    pub fn set_metadata(&self, metadata: SearchMetadata) {
        if self.metadata.set(metadata).is_err() {
            debug!("search metadata already attached, keeping the first");
        }
    }

    /// Second handle on the same stream, for a supervisor that reports a
    /// run which died without closing. The stream ends once both are gone.
    pub(crate) fn fallback(&self) -> ChunkWriter {
        ChunkWriter {
            tx: self.tx.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn close(self) {}

    pub fn fail(self, message: &str) {
        self.send(StreamChunk::Error(message.to_string()));
    }

    fn send(&self, chunk: StreamChunk) {
        // A gone receiver means the client disconnected; the run still finishes.
        if self.tx.send(chunk).is_err() {
            debug!("stream receiver dropped, discarding chunk");
        }
    }
}

/// Consuming half of a response stream.
pub struct ResponseStream {
    rx: mpsc::UnboundedReceiver<StreamChunk>,
    metadata: Arc<OnceLock<SearchMetadata>>,
}

impl ResponseStream {
    pub fn channel() -> (ChunkWriter, ResponseStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let metadata = Arc::new(OnceLock::new());
        (
            ChunkWriter {
                tx,
                metadata: metadata.clone(),
            },
            ResponseStream { rx, metadata },
        )
    }

    /// Next chunk, or `None` once the writer closed.
    pub async fn next_chunk(&mut self) -> Option<StreamChunk> {
        self.rx.recv().await
    }

    /// Search metadata, if a search ran. Set before the first content chunk
    /// is sent, so it is visible once that chunk has been received.
    pub fn metadata(&self) -> Option<&SearchMetadata> {
        self.metadata.get()
    }

    /// Drains the stream to its close.
    pub async fn collect(mut self) -> (Vec<StreamChunk>, Option<SearchMetadata>) {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            chunks.push(chunk);
        }
        (chunks, self.metadata.get().cloned())
    }
}
