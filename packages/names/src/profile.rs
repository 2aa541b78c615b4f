//! Document profiles: per-document-type strategy chains, denylists and
//! default cut layouts.
//!
//! Built-in profiles are embedded TOML files under `profiles/`. Adding a
//! document type means adding a TOML file there and an entry in
//! [`PROFILE_TOMLS`]. Profiles can also be loaded from a TOML file at
//! runtime with [`load_profile`].

use std::path::Path;
use std::sync::LazyLock;

use paysplit_document_models::{A4_HEIGHT_MM, CutRegion};
use serde::{Deserialize, Serialize};

use crate::NameError;
use crate::layout::{DEFAULT_LINE_TOLERANCE, LineGrouping};
use crate::strategy::StrategyConfig;

/// Number of built-in profiles. Enforced by a test.
#[cfg(test)]
const EXPECTED_PROFILE_COUNT: usize = 2;

/// Embedded TOML profile definitions.
const PROFILE_TOMLS: &[(&str, &str)] = &[
    ("recibo", include_str!("../profiles/recibo.toml")),
    ("contracheque", include_str!("../profiles/contracheque.toml")),
];

const fn default_page_height_mm() -> f64 {
    A4_HEIGHT_MM
}

const fn default_line_tolerance() -> f64 {
    DEFAULT_LINE_TOLERANCE
}

/// Everything that distinguishes one payroll document type from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProfile {
    /// Short identifier used on the command line (e.g. `recibo`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Prefix of fallback file names, e.g. `recibo` in
    /// `recibo_topo_p1_20-106mm.pdf`.
    pub fallback_prefix: String,
    /// Suffix of the archive name: `<stem>_<archive_suffix>.zip`.
    pub archive_suffix: String,
    /// Page height the cut regions are measured against.
    #[serde(default = "default_page_height_mm")]
    pub page_height_mm: f64,
    /// Baseline distance under which two runs share a line, in PDF units.
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f64,
    #[serde(default)]
    pub line_grouping: LineGrouping,
    /// Boilerplate words never taken for part of a name.
    #[serde(default)]
    pub denylist: Vec<String>,
    /// Strategy chain, in priority order.
    pub strategies: Vec<StrategyConfig>,
    /// Regions used when the caller does not supply any.
    pub default_cuts: Vec<CutRegion>,
}

impl DocumentProfile {
    /// Checks the parts of a profile that are not covered by parsing.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Profile`] describing the first problem found.
    pub fn validate(&self) -> Result<(), NameError> {
        let invalid = |reason: String| Err(NameError::Profile(format!("{}: {reason}", self.id)));

        if self.id.trim().is_empty() {
            return Err(NameError::Profile("profile id must not be empty".to_owned()));
        }
        if self.fallback_prefix.trim().is_empty() {
            return invalid("fallback_prefix must not be empty".to_owned());
        }
        if self
            .fallback_prefix
            .chars()
            .chain(self.archive_suffix.chars())
            .any(|c| matches!(c, '/' | '\\') || c.is_whitespace())
        {
            return invalid(
                "fallback_prefix and archive_suffix must not contain separators or whitespace"
                    .to_owned(),
            );
        }
        if !(self.page_height_mm.is_finite() && self.page_height_mm > 0.0) {
            return invalid(format!("page_height_mm must be positive, got {}", self.page_height_mm));
        }
        if !(self.line_tolerance.is_finite() && self.line_tolerance >= 0.0) {
            return invalid(format!(
                "line_tolerance must not be negative, got {}",
                self.line_tolerance
            ));
        }
        if self.strategies.is_empty() {
            return invalid("at least one strategy is required".to_owned());
        }
        if self.default_cuts.is_empty() {
            return invalid("at least one default cut is required".to_owned());
        }

        Ok(())
    }
}

static PROFILES: LazyLock<Vec<DocumentProfile>> = LazyLock::new(|| {
    PROFILE_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            parse_profile_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse built-in profile '{id}': {e}"))
        })
        .collect()
});

/// Returns all built-in profiles.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse or validate. These are
/// compile-time constants, so a failure is a development error caught by
/// the tests below.
#[must_use]
pub fn all_profiles() -> &'static [DocumentProfile] {
    &PROFILES
}

/// Looks up a built-in profile by id.
#[must_use]
pub fn find_profile(id: &str) -> Option<&'static DocumentProfile> {
    all_profiles().iter().find(|p| p.id == id)
}

/// Parses and validates a profile from TOML text.
///
/// # Errors
///
/// Returns [`NameError::Toml`] if the text is not a valid profile, or
/// [`NameError::Profile`] if it fails validation.
pub fn parse_profile_toml(toml_str: &str) -> Result<DocumentProfile, NameError> {
    let profile: DocumentProfile = toml::de::from_str(toml_str)?;
    profile.validate()?;
    Ok(profile)
}

/// Resolves a built-in profile id, or otherwise reads a profile TOML file
/// from `id_or_path`.
///
/// # Errors
///
/// Returns [`NameError::Profile`] if `id_or_path` is neither a built-in id
/// nor an existing file, or the error from reading or parsing the file.
pub fn load_profile(id_or_path: &str) -> Result<DocumentProfile, NameError> {
    if let Some(profile) = find_profile(id_or_path) {
        return Ok(profile.clone());
    }

    let path = Path::new(id_or_path);
    if !path.is_file() {
        let known = all_profiles()
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(NameError::Profile(format!(
            "Unknown profile '{id_or_path}' (built-in profiles: {known})"
        )));
    }

    log::info!("Loading profile from {}", path.display());
    parse_profile_toml(&std::fs::read_to_string(path)?)
}
