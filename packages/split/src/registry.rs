//! One archived fragment per employee name.

use std::collections::BTreeSet;

use paysplit_document_models::ResolvedArtifact;

use crate::filename::is_fallback_name;

/// Admits artifacts in discovery order, keeping the first artifact per
/// extracted name and every fallback-named artifact.
///
/// Fallback names are unique per (page, region) within one document, but
/// two identical regions would collide; such collisions get a `_2`, `_3`,
/// ... suffix so every archive entry keeps a distinct name.
#[derive(Debug, Clone)]
pub struct DedupRegistry {
    fallback_prefix: String,
    names: BTreeSet<String>,
    file_names: BTreeSet<String>,
    artifacts: Vec<ResolvedArtifact>,
    duplicates: usize,
}

impl DedupRegistry {
    #[must_use]
    pub fn new(fallback_prefix: &str) -> Self {
        Self {
            fallback_prefix: fallback_prefix.to_owned(),
            names: BTreeSet::new(),
            file_names: BTreeSet::new(),
            artifacts: Vec::new(),
            duplicates: 0,
        }
    }

    /// Offers an artifact. Returns `false` when an artifact with the same
    /// extracted name was admitted before; the new one is dropped.
    pub fn admit(&mut self, mut artifact: ResolvedArtifact) -> bool {
        if is_fallback_name(&artifact.file_name, &self.fallback_prefix) {
            artifact.file_name = self.unique_file_name(&artifact.file_name);
            artifact.is_named_result = false;
            log::debug!("Archiving unnamed fragment as {}", artifact.file_name);
        } else {
            let key = artifact.name_key().to_owned();
            if self.names.contains(&key) {
                self.duplicates += 1;
                log::warn!(
                    "Duplicate name {key} on page {} ({}), skipping",
                    artifact.source_page + 1,
                    artifact.cut
                );
                return false;
            }
            log::info!("Found {key} on page {}", artifact.source_page + 1);
            self.names.insert(key);
            artifact.is_named_result = true;
        }

        self.file_names.insert(artifact.file_name.clone());
        self.artifacts.push(artifact);
        true
    }

    fn unique_file_name(&self, file_name: &str) -> String {
        if !self.file_names.contains(file_name) {
            return file_name.to_owned();
        }

        let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
        (2..)
            .map(|n| format!("{stem}_{n}.pdf"))
            .find(|candidate| !self.file_names.contains(candidate))
            .unwrap_or_else(|| unreachable!())
    }

    /// Admitted artifacts, in discovery order.
    #[must_use]
    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        &self.artifacts
    }

    #[must_use]
    pub fn into_artifacts(self) -> Vec<ResolvedArtifact> {
        self.artifacts
    }

    /// Number of distinct extracted names admitted.
    #[must_use]
    pub fn unique_names(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.artifacts.len() - self.names.len()
    }

    /// Number of artifacts rejected as repeated names.
    #[must_use]
    pub const fn duplicates(&self) -> usize {
        self.duplicates
    }
}
