//! One-shot rendering from a file of label maps instead of a live Docker host.
//!
//! The file is a YAML list with one label map per container:
//!
//! ```yaml
//! - homer.items.torrent.name: qbittorrent
//!   homer.items.torrent.service: warez
//! - traefik.http.routers.gluetun-torrent.rule: Host(`torrent.example.com`)
//! ```
use crate::docker::LabelSet;
use engine::{Document, Engine, EngineError};
use std::fs::File;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("could not read labels: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse labels: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

pub fn load_label_sets(path: &Path) -> Result<Vec<LabelSet>, RenderError> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}

/// Replays the label file through a single rescan and returns the document.
pub fn render(engine: &Engine, path: &Path) -> Result<Document, RenderError> {
    let label_sets = load_label_sets(path)?;
    let summary = engine.rescan(label_sets.into_iter().flatten())?;
    if !summary.unassigned.is_empty() {
        tracing::warn!(
            unassigned = ?summary.unassigned,
            "Some entries have no group and were left out"
        );
    }
    Ok(engine.document())
}
