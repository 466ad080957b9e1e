use crate::document::Document;
use crate::sink::{DocumentSink, SinkError};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every stored document. Can be switched to fail writes.
#[derive(Default)]
pub struct RecordingSink {
    documents: Mutex<Vec<Document>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn last(&self) -> Option<Document> {
        self.documents.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.documents.lock().len()
    }
}

impl DocumentSink for RecordingSink {
    fn store(&self, document: &Document) -> Result<(), SinkError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(SinkError::Io(io::Error::other("disk full")));
        }
        self.documents.lock().push(document.clone());
        Ok(())
    }
}
