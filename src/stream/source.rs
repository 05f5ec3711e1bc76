//! Byte sources feeding a transfer.
//!
//! # Responsibilities
//! - Produce ordered binary chunks from a buffer, file, or push queue
//! - Suspend cooperatively when a push-driven source has no chunk yet
//! - Track the consumed flag (a body is read at most once)
//!
//! # Design Decisions
//! - Pull interface regardless of how chunks actually arrive; the push
//!   variant hides its queue behind the same `next_chunk` call
//! - Only one chunk is buffered at a time
//! - Reading a consumed source is a hard error, never a silent no-op

use std::io;
use std::path::Path;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Default chunk size for re-chunked buffers and file reads (64KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Error produced while reading from a [`ByteSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Underlying I/O failure (file read, etc.).
    #[error("source I/O error: {0}")]
    Io(#[from] io::Error),

    /// The external controller aborted the push source.
    #[error("source aborted: {0}")]
    Aborted(String),

    /// The source was already drained by a previous reader.
    #[error("source already consumed")]
    AlreadyConsumed,
}

/// Events a [`PushHandle`] feeds into a push-driven source.
#[derive(Debug)]
enum PushEvent {
    Chunk(Bytes),
    Abort(String),
}

/// Producer side of a push-driven source.
///
/// Chunks are enqueued out-of-band by an external controller; the reading
/// side picks them up on its next `next_chunk` call. Dropping the handle
/// (or calling [`PushHandle::close`]) ends the stream normally, while
/// [`PushHandle::abort`] turns a pending read into an error.
#[derive(Debug, Clone)]
pub struct PushHandle {
    tx: mpsc::UnboundedSender<PushEvent>,
}

impl PushHandle {
    /// Enqueue one chunk. Returns `false` if the reader is gone.
    pub fn push(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.send(PushEvent::Chunk(chunk.into())).is_ok()
    }

    /// End the stream normally.
    pub fn close(self) {
        // Dropping the sender closes the channel.
        drop(self);
    }

    /// Abort the stream; a pending or future read resolves into
    /// [`SourceError::Aborted`].
    pub fn abort(self, reason: impl Into<String>) {
        let _ = self.tx.send(PushEvent::Abort(reason.into()));
    }
}

type DynStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

enum SourceKind {
    /// Finite in-memory buffer, sliced into `chunk_size` pieces.
    Buffer {
        data: Bytes,
        position: usize,
        chunk_size: usize,
    },
    /// Open file handle, read incrementally.
    File { file: File, chunk_size: usize },
    /// Externally driven queue (see [`PushHandle`]).
    Push(mpsc::UnboundedReceiver<PushEvent>),
    /// Adapter over any fallible byte stream.
    Stream(DynStream),
}

/// A single-use producer of ordered binary chunks.
///
/// Created per response body and consumed at most once. After the final
/// chunk has been read (or [`ByteSource::mark_consumed`] was called), any
/// further read attempt fails with [`SourceError::AlreadyConsumed`].
pub struct ByteSource {
    kind: SourceKind,
    consumed: bool,
}

impl ByteSource {
    /// A source yielding the whole buffer as one chunk.
    pub fn buffer(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len().max(1);
        Self::chunked(data, len)
    }

    /// A source slicing an in-memory buffer into fixed-size chunks.
    pub fn chunked(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            kind: SourceKind::Buffer {
                data: data.into(),
                position: 0,
                chunk_size: chunk_size.max(1),
            },
            consumed: false,
        }
    }

    /// Open a file for incremental reading.
    pub async fn file(path: impl AsRef<Path>, chunk_size: usize) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            kind: SourceKind::File {
                file,
                chunk_size: chunk_size.max(1),
            },
            consumed: false,
        })
    }

    /// A push-driven source plus the handle that feeds it.
    pub fn push() -> (PushHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PushHandle { tx },
            Self {
                kind: SourceKind::Push(rx),
                consumed: false,
            },
        )
    }

    /// Adapt any fallible byte stream into a source.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self {
            kind: SourceKind::Stream(Box::pin(stream)),
            consumed: false,
        }
    }

    /// Whether the body behind this source has already been drained.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Mark the source as drained. Idempotent only in the sense that the
    /// transition happens once; readers observing the flag must fail.
    pub fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    /// Pull the next chunk, suspending if a push-driven source has no
    /// chunk available yet. `Ok(None)` means the source is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        if self.consumed {
            return Err(SourceError::AlreadyConsumed);
        }

        match &mut self.kind {
            SourceKind::Buffer {
                data,
                position,
                chunk_size,
            } => {
                if *position >= data.len() {
                    return Ok(None);
                }
                let end = (*position + *chunk_size).min(data.len());
                let chunk = data.slice(*position..end);
                *position = end;
                Ok(Some(chunk))
            }
            SourceKind::File { file, chunk_size } => {
                let mut buf = BytesMut::with_capacity(*chunk_size);
                let n = file.read_buf(&mut buf).await?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(buf.freeze()))
                }
            }
            SourceKind::Push(rx) => match rx.recv().await {
                Some(PushEvent::Chunk(chunk)) => Ok(Some(chunk)),
                Some(PushEvent::Abort(reason)) => {
                    rx.close();
                    Err(SourceError::Aborted(reason))
                }
                None => Ok(None),
            },
            SourceKind::Stream(stream) => match stream.next().await {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(e)) => Err(SourceError::Io(e)),
                None => Ok(None),
            },
        }
    }

    /// Drain the remaining chunks into one buffer and mark the source
    /// consumed.
    pub async fn collect(&mut self) -> Result<Bytes, SourceError> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        self.mark_consumed();
        Ok(out.freeze())
    }
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            SourceKind::Buffer { data, position, .. } => {
                return f
                    .debug_struct("ByteSource")
                    .field("kind", &"buffer")
                    .field("len", &data.len())
                    .field("position", position)
                    .field("consumed", &self.consumed)
                    .finish();
            }
            SourceKind::File { .. } => "file",
            SourceKind::Push(_) => "push",
            SourceKind::Stream(_) => "stream",
        };
        f.debug_struct("ByteSource")
            .field("kind", &kind)
            .field("consumed", &self.consumed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunked_buffer_respects_boundaries() {
        let mut source = ByteSource::chunked(&b"Hello, World!"[..], 5);

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"Hello"[..]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b", Wor"[..]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"ld!"[..]);
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_buffer_is_immediately_exhausted() {
        let mut source = ByteSource::buffer(Bytes::new());
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn consumed_source_fails_on_read() {
        let mut source = ByteSource::buffer(&b"data"[..]);
        source.mark_consumed();

        let err = source.next_chunk().await.unwrap_err();
        assert!(matches!(err, SourceError::AlreadyConsumed));
    }

    #[tokio::test]
    async fn push_source_delivers_in_order() {
        let (handle, mut source) = ByteSource::push();
        handle.push(&b"one"[..]);
        handle.push(&b"two"[..]);
        handle.close();

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"one"[..]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"two"[..]);
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn push_source_suspends_until_chunk_arrives() {
        let (handle, mut source) = ByteSource::push();

        let producer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.push(&b"late"[..]);
            handle.close();
        });

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"late"[..]);
        assert!(source.next_chunk().await.unwrap().is_none());
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn aborted_push_source_surfaces_error() {
        let (handle, mut source) = ByteSource::push();
        handle.push(&b"partial"[..]);
        handle.abort("deadline exceeded");

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"partial"[..]);
        let err = source.next_chunk().await.unwrap_err();
        assert!(matches!(err, SourceError::Aborted(reason) if reason == "deadline exceeded"));
    }

    #[tokio::test]
    async fn stream_adapter_yields_and_ends() {
        let chunks: Vec<Result<Bytes, io::Error>> =
            vec![Ok(Bytes::from_static(b"a")), Ok(Bytes::from_static(b"b"))];
        let mut source = ByteSource::from_stream(futures_util::stream::iter(chunks));

        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"a"[..]);
        assert_eq!(source.next_chunk().await.unwrap().unwrap(), &b"b"[..]);
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collect_drains_and_marks_consumed() {
        let mut source = ByteSource::chunked(&b"0123456789"[..], 3);
        let all = source.collect().await.unwrap();
        assert_eq!(all, &b"0123456789"[..]);
        assert!(source.is_consumed());
        assert!(matches!(
            source.next_chunk().await.unwrap_err(),
            SourceError::AlreadyConsumed
        ));
    }

    #[tokio::test]
    async fn file_source_reads_whole_file() {
        let path = std::env::temp_dir().join("reply_stream_source_test.bin");
        tokio::fs::write(&path, b"file contents here").await.unwrap();

        let mut source = ByteSource::file(&path, 4).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = source.next_chunk().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        assert_eq!(out, b"file contents here");

        let _ = tokio::fs::remove_file(path).await;
    }
}
