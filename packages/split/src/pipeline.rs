//! The splitting batch: pages outer, regions inner, strictly in order.

use std::sync::Arc;

use paysplit_document_models::{ArtifactSummary, CutRegion, PixelBand, ResolvedArtifact};
use paysplit_names::{DocumentProfile, NameEngine};
use paysplit_pdf::{PageSplitter, PdfPageSplitter, PdfTextLayer, TextLayerReader};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::SplitError;
use crate::archive::{Archiver, ZipArchiver};
use crate::filename::{is_fallback_name, resolve_file_name};
use crate::geometry::to_pixel_band;
use crate::progress::{ProgressCallback, null_progress};
use crate::registry::DedupRegistry;

/// What to do with a cut region that fails validation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvalidRegionPolicy {
    /// Stop the batch with an error naming the region. No archive is
    /// produced.
    #[default]
    Abort,
    /// Log the region and leave it out of the batch.
    Skip,
}

/// Result of a completed batch.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// The archive holding every admitted fragment.
    pub archive: Vec<u8>,
    /// Admitted fragments, in discovery order.
    pub artifacts: Vec<ResolvedArtifact>,
    /// Number of pages in the source document.
    pub page_count: usize,
    /// Fragments dropped because their name was already taken.
    pub duplicates: usize,
}

impl ProcessedDocument {
    #[must_use]
    pub fn summaries(&self) -> Vec<ArtifactSummary> {
        self.artifacts.iter().map(ResolvedArtifact::summary).collect()
    }

    /// Artifacts carrying an extracted name, the ones offered as
    /// individual downloads.
    pub fn named_artifacts(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.artifacts.iter().filter(|a| a.is_named_result)
    }
}

/// Runs splitting batches for one document profile.
pub struct DocumentProcessor {
    engine: NameEngine,
    fallback_prefix: String,
    page_height_mm: f64,
    policy: InvalidRegionPolicy,
    text_layer: Box<dyn TextLayerReader>,
    archiver: Box<dyn Archiver>,
    progress: Arc<dyn ProgressCallback>,
}

impl DocumentProcessor {
    /// Builds a processor with the PDF text layer, a deflating ZIP
    /// archiver and no progress reporting.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Name`] if the profile's strategies do not
    /// compile.
    pub fn new(profile: &DocumentProfile) -> Result<Self, SplitError> {
        Ok(Self {
            engine: NameEngine::from_profile(profile)?,
            fallback_prefix: profile.fallback_prefix.clone(),
            page_height_mm: profile.page_height_mm,
            policy: InvalidRegionPolicy::default(),
            text_layer: Box::new(PdfTextLayer),
            archiver: Box::new(ZipArchiver::default()),
            progress: null_progress(),
        })
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: InvalidRegionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_text_layer(mut self, text_layer: impl TextLayerReader + 'static) -> Self {
        self.text_layer = Box::new(text_layer);
        self
    }

    #[must_use]
    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Splits `pdf_bytes` along `cuts` on every page, names and
    /// deduplicates the fragments, and archives them.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError`] if a region is invalid (under
    /// [`InvalidRegionPolicy::Abort`]), the document cannot be loaded or
    /// cropped, or the archive cannot be written. Nothing is returned for
    /// a failed batch.
    pub fn process_document(
        &self,
        pdf_bytes: &[u8],
        cuts: &[CutRegion],
    ) -> Result<ProcessedDocument, SplitError> {
        let splitter = PdfPageSplitter::from_bytes(pdf_bytes).inspect_err(|e| {
            self.progress.abandon(e.to_string());
        })?;
        self.process_pages(&splitter, cuts)
    }

    /// Same as [`Self::process_document`], for an already loaded source.
    ///
    /// # Errors
    ///
    /// See [`Self::process_document`].
    pub fn process_pages(
        &self,
        splitter: &dyn PageSplitter,
        cuts: &[CutRegion],
    ) -> Result<ProcessedDocument, SplitError> {
        self.run(splitter, cuts).inspect_err(|e| {
            log::debug!("Batch aborted: {e}");
            self.progress.abandon(e.to_string());
        })
    }

    /// Validates `cuts` in order, applying the invalid-region policy.
    ///
    /// # Errors
    ///
    /// Returns the first [`SplitError::InvalidRegion`] under
    /// [`InvalidRegionPolicy::Abort`].
    pub fn plan_regions(
        &self,
        cuts: &[CutRegion],
    ) -> Result<Vec<(CutRegion, PixelBand)>, SplitError> {
        let mut planned = Vec::with_capacity(cuts.len());

        for (i, cut) in cuts.iter().enumerate() {
            match to_pixel_band(i + 1, cut, self.page_height_mm) {
                Ok(band) => planned.push((*cut, band)),
                Err(e) if self.policy == InvalidRegionPolicy::Skip => {
                    log::warn!("Skipping region: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(planned)
    }

    fn run(
        &self,
        splitter: &dyn PageSplitter,
        cuts: &[CutRegion],
    ) -> Result<ProcessedDocument, SplitError> {
        let regions = self.plan_regions(cuts)?;
        let page_count = splitter.page_count();
        let total = page_count * regions.len();

        log::info!(
            "Splitting {page_count} pages into {} regions each ({total} fragments)",
            regions.len()
        );
        self.progress.set_total(total as u64);

        let mut registry = DedupRegistry::new(&self.fallback_prefix);
        let mut processed = 0_u64;

        for page in 0..page_count {
            for (cut, band) in &regions {
                let bytes = splitter.split_region(page, *band)?;
                let name = self.extract_name(&bytes, page, cut);
                let file_name = resolve_file_name(
                    name.as_deref(),
                    &self.fallback_prefix,
                    cut,
                    page + 1,
                );
                let is_named_result = !is_fallback_name(&file_name, &self.fallback_prefix);

                let artifact = ResolvedArtifact {
                    file_name,
                    bytes,
                    source_page: page,
                    cut: *cut,
                    is_named_result,
                };
                let key = artifact.name_key().to_owned();

                if registry.admit(artifact) && is_named_result {
                    self.progress.name_discovered(&key);
                }

                processed += 1;
                self.progress.set_processed(processed, registry.unique_names());
            }
        }

        let duplicates = registry.duplicates();
        let artifacts = registry.into_artifacts();
        let entries = artifacts
            .iter()
            .map(|a| (a.file_name.as_str(), a.bytes.as_slice()))
            .collect::<Vec<_>>();
        let archive = self.archiver.pack(&entries)?;

        let named = artifacts.iter().filter(|a| a.is_named_result).count();
        let summary = format!(
            "{} fragments archived ({named} named, {} unnamed, {duplicates} duplicates skipped)",
            artifacts.len(),
            artifacts.len() - named,
        );
        log::info!("{summary}");
        self.progress.finish(summary);

        Ok(ProcessedDocument {
            archive,
            artifacts,
            page_count,
            duplicates,
        })
    }

    /// Reads the fragment's text layer and runs the name engine. Any
    /// failure along the way means "no name".
    fn extract_name(&self, fragment: &[u8], page: usize, cut: &CutRegion) -> Option<String> {
        match self.text_layer.read_runs(fragment) {
            Ok(runs) => self.engine.extract_unordered(&runs).map(|c| c.value),
            Err(e) => {
                log::warn!(
                    "Could not read text of page {} ({cut}), using fallback name: {e}",
                    page + 1
                );
                None
            }
        }
    }
}
