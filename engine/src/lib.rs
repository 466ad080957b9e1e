//! Turns container labels into a grouped dashboard document.
//!
//! Labels are classified ([`classifier`]), accumulated into per-identifier
//! fragments ([`store`]), reconciled across identifier spaces ([`reconciler`])
//! and regrouped into a [`document::Document`] ([`builder`]) that is handed to a
//! [`sink::DocumentSink`]. [`engine::Engine`] ties the steps together.

pub mod builder;
pub mod classifier;
pub mod document;
pub mod engine;
pub mod metrics_defs;
pub mod reconciler;
pub mod sink;
pub mod store;

#[cfg(test)]
mod testutils;

pub use classifier::Namespaces;
pub use document::{Document, DocumentMeta};
pub use engine::{Engine, EngineError, LabelEvent, Outcome, Summary};
pub use sink::{DocumentSink, FileSink, NoopSink, SinkError};
