//! Keeps the typed error of a pipeline stream that a collaborator reads.
//!
//! Repositories only see `io::Error` when an encrypting stream fails underneath
//! them; the capture lets the use case report the original failure instead.

use std::io::{self, Read};
use std::sync::{Arc, Mutex, PoisonError};

use ss_core::content::ByteStream;
use ss_core::error::StorageError;

#[derive(Clone, Default)]
pub(crate) struct StreamErrorSlot(Arc<Mutex<Option<StorageError>>>);

impl StreamErrorSlot {
    /// Wraps `inner` so the first read error is recorded in this slot.
    pub(crate) fn wrap(&self, inner: ByteStream) -> ByteStream {
        Box::new(CapturingReader {
            inner,
            slot: self.clone(),
        })
    }

    pub(crate) fn take(&self) -> Option<StorageError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn record(&self, err: StorageError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

struct CapturingReader {
    inner: ByteStream,
    slot: StreamErrorSlot,
}

impl Read for CapturingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                let err = StorageError::from_stream_error(e);
                self.slot.record(err.clone());
                Err(io::Error::other(err))
            }
            other => other,
        }
    }
}
