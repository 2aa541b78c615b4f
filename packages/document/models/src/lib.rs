#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data model for splitting payroll documents into per-person
//! fragments.
//!
//! Text layer readers produce [`PositionedTextRun`]s, the name engine turns
//! them into a [`NameCandidate`], and the batch pipeline emits one
//! [`ResolvedArtifact`] per admitted (page, [`CutRegion`]) pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Height of an A4 page in millimeters.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Width of an A4 page in millimeters.
pub const A4_WIDTH_MM: f64 = 210.0;

/// PDF points (72 DPI "pixels") per millimeter.
pub const PX_PER_MM: f64 = 2.834_645_669;

/// A trimmed piece of text at a position in PDF user space (origin
/// bottom-left, y grows upward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedTextRun {
    /// The run's text, trimmed. May be empty for whitespace-only runs.
    pub text: String,
    /// Horizontal position of the run's origin.
    pub x: f64,
    /// Vertical position of the run's baseline.
    pub y: f64,
}

impl PositionedTextRun {
    /// Creates a run, trimming surrounding whitespace from `text`.
    #[must_use]
    pub fn new(text: &str, x: f64, y: f64) -> Self {
        Self {
            text: text.trim().to_owned(),
            x,
            y,
        }
    }

    /// Whether the run carries no visible text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Runs judged to sit on the same visual line, sorted left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLine {
    /// Runs in ascending `x` order.
    pub runs: Vec<PositionedTextRun>,
}

impl NormalizedLine {
    /// Highest baseline among the line's runs, or `None` for an empty line.
    #[must_use]
    pub fn y(&self) -> Option<f64> {
        self.runs.iter().map(|r| r.y).reduce(f64::max)
    }

    /// Texts of the line joined with single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which name-extraction strategy produced a candidate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    /// Label phrase followed by an uppercase run in the joined text.
    LabeledField,
    /// Keyword anchor followed by a bounded forward scan.
    AnchorScan,
    /// Three-digit code followed by uppercase words.
    CodePrefixed,
    /// Consecutive uppercase words glued together.
    Greedy,
    /// A single run that is already a full uppercase name.
    Standalone,
    /// Code / name / number pattern over the joined text.
    FullTextRegex,
}

/// A proposed personal name and the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameCandidate {
    /// Normalised name, internal whitespace collapsed to `_`.
    pub value: String,
    /// Zero-based position of the winning strategy in the engine's chain.
    pub strategy_rank: usize,
    /// The winning strategy.
    pub strategy: StrategyKind,
}

/// Vertical third of the page a cut region sits in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RegionPosition {
    /// Midpoint within the upper 33% of the page.
    #[serde(rename = "topo")]
    #[strum(serialize = "topo")]
    Top,
    /// Midpoint between 33% and 66% of the page.
    #[serde(rename = "meio")]
    #[strum(serialize = "meio")]
    Middle,
    /// Midpoint below 66% of the page.
    #[serde(rename = "base")]
    #[strum(serialize = "base")]
    Bottom,
}

impl RegionPosition {
    /// Classifies a region by where its midpoint falls on an A4 page.
    ///
    /// Boundaries are inclusive: a midpoint at exactly 33% is still
    /// [`Self::Top`].
    #[must_use]
    pub fn classify(start_top_mm: f64, end_top_mm: f64) -> Self {
        let center_mm = (start_top_mm + end_top_mm) / 2.0;
        let percentage = center_mm / A4_HEIGHT_MM * 100.0;

        if percentage <= 33.0 {
            Self::Top
        } else if percentage <= 66.0 {
            Self::Middle
        } else {
            Self::Bottom
        }
    }
}

/// A vertical slice of a page, measured in millimeters from the page top.
///
/// Regions are user-authored and validated when the batch reaches them,
/// not on construction. The [`RegionPosition`] is always derived from the
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutRegion {
    /// Distance of the region's upper edge from the page top.
    pub start_top_mm: f64,
    /// Distance of the region's lower edge from the page top.
    pub end_top_mm: f64,
}

impl CutRegion {
    #[must_use]
    pub const fn new(start_top_mm: f64, end_top_mm: f64) -> Self {
        Self {
            start_top_mm,
            end_top_mm,
        }
    }

    /// Position of the region's midpoint on the page.
    #[must_use]
    pub fn position(&self) -> RegionPosition {
        RegionPosition::classify(self.start_top_mm, self.end_top_mm)
    }

    /// Height of the region in millimeters. Negative for inverted bounds.
    #[must_use]
    pub fn height_mm(&self) -> f64 {
        self.end_top_mm - self.start_top_mm
    }
}

impl fmt::Display for CutRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}mm", self.start_top_mm, self.end_top_mm)
    }
}

/// Error returned when a `START-END` cut argument cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cut region '{input}': expected START-END in millimeters (e.g. 20-106)")]
pub struct ParseCutRegionError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for CutRegion {
    type Err = ParseCutRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCutRegionError {
            input: s.to_owned(),
        };

        let trimmed = s.trim().trim_end_matches("mm");
        let (start, end) = trimmed.split_once('-').ok_or_else(err)?;
        let start = start.trim().parse::<f64>().map_err(|_| err())?;
        let end = end.trim().parse::<f64>().map_err(|_| err())?;

        if !start.is_finite() || !end.is_finite() {
            return Err(err());
        }

        Ok(Self::new(start, end))
    }
}

/// A horizontal band of a page in PDF points (1/72 inch), measured from
/// the page bottom. Produced from a [`CutRegion`] after validation, so
/// `bottom < top` holds for every band handed to a splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBand {
    pub bottom: i64,
    pub top: i64,
}

impl PixelBand {
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.top - self.bottom
    }
}

impl fmt::Display for PixelBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}pt", self.bottom, self.top)
    }
}

/// One output fragment: a single-page PDF cut from a source page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArtifact {
    /// Archive entry name, either `<NAME>.pdf` or the fallback label.
    pub file_name: String,
    /// The fragment's PDF bytes.
    pub bytes: Vec<u8>,
    /// Zero-based index of the source page.
    pub source_page: usize,
    /// The region that produced the fragment.
    pub cut: CutRegion,
    /// Whether `file_name` carries an extracted name rather than the
    /// fallback label.
    pub is_named_result: bool,
}

impl ResolvedArtifact {
    /// The employee-name key: the file name without its `.pdf` extension.
    #[must_use]
    pub fn name_key(&self) -> &str {
        self.file_name
            .strip_suffix(".pdf")
            .unwrap_or(&self.file_name)
    }

    /// Serializable view without the PDF bytes.
    #[must_use]
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            file_name: self.file_name.clone(),
            is_named_result: self.is_named_result,
            page: self.source_page + 1,
            cut: self.cut,
            position: self.cut.position(),
            size_bytes: self.bytes.len(),
        }
    }
}

/// What the caller needs to list an artifact and decide whether to offer
/// it as an individual download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    /// Archive entry name.
    pub file_name: String,
    /// `true` when a name was extracted; drives individual downloads.
    pub is_named_result: bool,
    /// One-based source page.
    pub page: usize,
    /// The region that produced the fragment.
    pub cut: CutRegion,
    /// Derived position of the region.
    pub position: RegionPosition,
    /// Size of the fragment in bytes.
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_thirds_of_the_page() {
        assert_eq!(RegionPosition::classify(0.0, 99.0), RegionPosition::Top);
        assert_eq!(
            RegionPosition::classify(100.0, 198.0),
            RegionPosition::Middle
        );
        assert_eq!(
            RegionPosition::classify(199.0, 297.0),
            RegionPosition::Bottom
        );
    }

    #[test]
    fn top_boundary_is_inclusive() {
        // Midpoint 98mm is 32.99% of the page.
        assert_eq!(RegionPosition::classify(96.0, 100.0), RegionPosition::Top);
        // Midpoint 196mm is 65.99% of the page.
        assert_eq!(
            RegionPosition::classify(190.0, 202.0),
            RegionPosition::Middle
        );
        assert_eq!(
            RegionPosition::classify(200.0, 202.0),
            RegionPosition::Bottom
        );
    }

    #[test]
    fn classification_is_repeatable() {
        let first = RegionPosition::classify(20.0, 106.0);
        for _ in 0..10 {
            assert_eq!(RegionPosition::classify(20.0, 106.0), first);
        }
    }

    #[test]
    fn positions_use_portuguese_labels() {
        assert_eq!(RegionPosition::Top.to_string(), "topo");
        assert_eq!(RegionPosition::Middle.to_string(), "meio");
        assert_eq!(RegionPosition::Bottom.to_string(), "base");
        assert_eq!("meio".parse::<RegionPosition>(), Ok(RegionPosition::Middle));
    }

    #[test]
    fn cut_region_displays_without_trailing_zeroes() {
        assert_eq!(CutRegion::new(20.0, 106.0).to_string(), "20-106mm");
        assert_eq!(CutRegion::new(20.5, 106.0).to_string(), "20.5-106mm");
    }

    #[test]
    fn parses_cut_arguments() {
        assert_eq!(
            "20-106".parse::<CutRegion>(),
            Ok(CutRegion::new(20.0, 106.0))
        );
        assert_eq!(
            " 184 - 261mm ".parse::<CutRegion>(),
            Ok(CutRegion::new(184.0, 261.0))
        );
        assert!("20".parse::<CutRegion>().is_err());
        assert!("a-b".parse::<CutRegion>().is_err());
    }

    #[test]
    fn run_text_is_trimmed() {
        let run = PositionedTextRun::new("  MARIA  ", 1.0, 2.0);
        assert_eq!(run.text, "MARIA");
        assert!(PositionedTextRun::new("   ", 0.0, 0.0).is_blank());
    }

    #[test]
    fn artifact_summary_reports_one_based_page() {
        let artifact = ResolvedArtifact {
            file_name: "JOAO_SILVA.pdf".to_owned(),
            bytes: vec![1, 2, 3],
            source_page: 0,
            cut: CutRegion::new(20.0, 106.0),
            is_named_result: true,
        };
        let summary = artifact.summary();
        assert_eq!(artifact.name_key(), "JOAO_SILVA");
        assert_eq!(summary.page, 1);
        assert_eq!(summary.position, RegionPosition::Top);
        assert_eq!(summary.size_bytes, 3);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["fileName"], "JOAO_SILVA.pdf");
        assert_eq!(json["position"], "topo");
    }
}
