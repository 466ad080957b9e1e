//! Sinks receive every rebuilt document in full and replace whatever they held
//! before. The engine never hands a sink a partial document.
use crate::document::Document;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_yaml::Error),
}

pub trait DocumentSink: Send + Sync {
    fn store(&self, document: &Document) -> Result<(), SinkError>;
}

// Discards documents. Used for dry runs.
pub struct NoopSink;

impl DocumentSink for NoopSink {
    fn store(&self, _document: &Document) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes the document as YAML, replacing the target file atomically.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Document, SinkError> {
        let file = File::open(&self.path)?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl DocumentSink for FileSink {
    fn store(&self, document: &Document) -> Result<(), SinkError> {
        let encoded = serde_yaml::to_string(document)?;

        // Write next to the target so the rename stays on one filesystem
        let mut tmp = tempfile::NamedTempFile::new_in(self.dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }
        tmp.write_all(encoded.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = encoded.len(),
            groups = document.groups.len(),
            "Stored dashboard document"
        );

        Ok(())
    }
}
