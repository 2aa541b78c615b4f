#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch splitting of payroll PDFs.
//!
//! For every page of the source document and every configured
//! [`CutRegion`](paysplit_document_models::CutRegion), the
//! [`pipeline`] crops a fragment, asks the name engine who it belongs to,
//! names the file ([`filename`]), drops repeated names ([`registry`]) and
//! finally packs the admitted fragments into one archive ([`archive`]).
//! Pages are processed in order and regions in order within a page, which
//! makes "first occurrence wins" deterministic.

pub mod archive;
pub mod filename;
pub mod geometry;
pub mod pipeline;
pub mod progress;
pub mod registry;

pub use archive::{Archiver, ZipArchiver};
pub use pipeline::{DocumentProcessor, InvalidRegionPolicy, ProcessedDocument};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use registry::DedupRegistry;

use paysplit_names::NameError;
use paysplit_pdf::PdfError;

/// Errors that abort a batch.
///
/// Text-layer and name-extraction failures are not represented here: they
/// downgrade to "no name found" and the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// A cut region is unusable. `index` is one-based.
    #[error("Invalid cut region {index} ({start_top_mm}-{end_top_mm}mm): {reason}")]
    InvalidRegion {
        index: usize,
        start_top_mm: f64,
        end_top_mm: f64,
        reason: String,
    },

    /// Loading or cropping the source document failed.
    #[error("Splitter error: {0}")]
    Pdf(#[from] PdfError),

    /// The document profile could not be turned into a name engine.
    #[error("Name engine error: {0}")]
    Name(#[from] NameError),

    /// Writing the archive failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
