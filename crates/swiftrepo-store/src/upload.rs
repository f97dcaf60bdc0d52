//! Streaming uploads.
//!
//! Swift's client consumes an upload from a reader it pulls on; callers of the
//! blob store push bytes through a writer. [`UploadSink`] bridges the two with
//! a bounded in-memory pipe and one worker thread per upload:
//!
//! ```text
//! caller --write--> UploadSink --Bytes chunks--> PipeReader --read--> StoredObject::upload
//!                   (sync_channel, PIPE_CAPACITY deep)            (worker thread)
//! ```
//!
//! At most `CHUNK_SIZE * (PIPE_CAPACITY + 1)` bytes are buffered; a writer
//! that outpaces the upload blocks. [`UploadSink::close`] signals end of
//! stream and joins the worker, so a successful close means the object is
//! stored. Upload failures are reported by `close` (or by the write that
//! discovers the worker has gone).

use std::io::{self, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use bytes::{Buf, Bytes, BytesMut};
use swiftrepo_client::{ClientResult, StoredObject};
use tracing::{debug, warn};

use crate::error::{BlobStoreError, StoreResult};
use crate::traits::BlobSink;

/// Bytes collected before a chunk is handed to the worker.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks that may sit in the pipe before writers block.
pub const PIPE_CAPACITY: usize = 16;

/// Lifecycle of an upload. `Started` and `Writing` accept bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    Started,
    Writing,
    Closing,
    Closed,
    Failed,
}

/// Read end of the pipe, owned by the upload worker.
pub struct PipeReader {
    chunks: Receiver<Bytes>,
    current: Bytes,
}

impl PipeReader {
    fn new(chunks: Receiver<Bytes>) -> Self {
        Self {
            chunks,
            current: Bytes::new(),
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.chunks.recv() {
                Ok(chunk) => self.current = chunk,
                // Sender dropped: the writer closed the sink.
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

/// Write end of one streaming upload.
pub struct UploadSink {
    key: String,
    sender: Option<SyncSender<Bytes>>,
    worker: Option<JoinHandle<ClientResult<()>>>,
    pending: BytesMut,
    state: UploadState,
    failure: Option<String>,
}

impl UploadSink {
    /// Spawn the upload worker for `object` and return the sink feeding it.
    pub fn start(object: StoredObject) -> StoreResult<Self> {
        let key = object.key().to_string();
        let (sender, receiver) = sync_channel(PIPE_CAPACITY);
        let reader = PipeReader::new(receiver);

        let worker = thread::Builder::new()
            .name("swift-upload".into())
            .spawn(move || object.upload(reader))
            .map_err(|source| BlobStoreError::Io {
                op: "create_output",
                key: key.clone(),
                source,
            })?;
        debug!(key = %key, "upload started");

        Ok(Self {
            key,
            sender: Some(sender),
            worker: Some(worker),
            pending: BytesMut::with_capacity(CHUNK_SIZE),
            state: UploadState::Started,
            failure: None,
        })
    }

    /// Object key being written.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UploadState {
        self.state
    }

    fn ensure_open(&self) -> io::Result<()> {
        match self.state {
            UploadState::Started | UploadState::Writing => Ok(()),
            UploadState::Failed => Err(io::Error::other(format!(
                "upload of {} failed: {}",
                self.key,
                self.failure.as_deref().unwrap_or("unknown error")
            ))),
            UploadState::Closing | UploadState::Closed => {
                Err(io::Error::other(format!("upload sink for {} already closed", self.key)))
            }
        }
    }

    /// Hand the pending chunk to the worker, blocking while the pipe is full.
    fn send_pending(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let chunk = self.pending.split().freeze();
        let sent = match &self.sender {
            Some(sender) => sender.send(chunk).is_ok(),
            None => false,
        };
        if sent {
            return Ok(());
        }
        // The worker dropped its reader, so the upload is over. Find out why.
        self.sender = None;
        let reason = match self.join_worker() {
            Err(reason) => reason,
            Ok(()) => "upload finished before all bytes were written".to_string(),
        };
        self.fail(io::ErrorKind::BrokenPipe, reason)
    }

    fn join_worker(&mut self) -> Result<(), String> {
        match self.worker.take() {
            Some(worker) => match worker.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("upload worker panicked".to_string()),
            },
            None => Ok(()),
        }
    }

    fn fail(&mut self, kind: io::ErrorKind, reason: String) -> io::Result<()> {
        warn!(key = %self.key, error = %reason, "upload failed");
        let err = io::Error::new(kind, format!("upload of {} failed: {reason}", self.key));
        self.state = UploadState::Failed;
        self.failure = Some(reason);
        Err(err)
    }

    /// Flush buffered bytes, signal end of stream and wait for the upload to
    /// finish.
    pub fn close(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.state = UploadState::Closing;
        self.send_pending()?;

        // Dropping the sender is the end-of-stream marker.
        self.sender = None;
        match self.join_worker() {
            Ok(()) => {
                self.state = UploadState::Closed;
                debug!(key = %self.key, "upload completed");
                Ok(())
            }
            Err(reason) => self.fail(io::ErrorKind::Other, reason),
        }
    }
}

impl Write for UploadSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.state = UploadState::Writing;
        let n = buf.len().min(CHUNK_SIZE - self.pending.len());
        self.pending.extend_from_slice(&buf[..n]);
        if self.pending.len() == CHUNK_SIZE {
            self.send_pending()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.send_pending()
    }
}

impl BlobSink for UploadSink {
    fn close(&mut self) -> io::Result<()> {
        UploadSink::close(self)
    }
}

impl Drop for UploadSink {
    fn drop(&mut self) {
        if matches!(self.state, UploadState::Started | UploadState::Writing) {
            if let Err(e) = self.close() {
                warn!(key = %self.key, error = %e, "upload sink dropped without close");
            }
        }
    }
}

impl std::fmt::Debug for UploadSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSink")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}
