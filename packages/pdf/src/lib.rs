#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF collaborators for the payroll splitter.
//!
//! Two concerns live here, each behind a trait so the batch pipeline can
//! be exercised without real documents:
//!
//! - [`TextLayerReader`] turns a PDF into positioned text runs using
//!   pure-Rust text extraction ([`pdf_extract`]).
//! - [`PageSplitter`] crops one page of a source document to a horizontal
//!   band and serialises it as a standalone single-page PDF, working on
//!   the `lopdf` object model that [`pdf_extract`] re-exports.

pub mod splitter;
pub mod text_layer;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use splitter::{PageSize, PageSplitter, PdfPageSplitter};
pub use text_layer::{PdfTextLayer, TextLayerReader};

/// Errors specific to reading and cropping PDFs.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The document could not be parsed, or its object graph is malformed.
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_extract::Error),

    /// Text-layer processing failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// Serialising a cropped page failed.
    #[error("PDF write error: {0}")]
    Save(String),

    /// A page index past the end of the document was requested.
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Zero-based page index that was requested.
        index: usize,
        /// Number of pages in the document.
        count: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
