//! The `split`, `inspect` and `profiles` commands, shared by the clap
//! front end and the interactive menu.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use paysplit_cli_utils::{IndicatifProgress, MultiProgress};
use paysplit_document_models::{ArtifactSummary, CutRegion, PX_PER_MM, ParseCutRegionError};
use paysplit_names::layout::reading_order;
use paysplit_names::profile::all_profiles;
use paysplit_names::{DocumentProfile, NameEngine};
use paysplit_pdf::{PageSplitter, PdfPageSplitter, PdfTextLayer, TextLayerReader};
use paysplit_split::archive::archive_file_name;
use paysplit_split::filename::fallback_file_name;
use paysplit_split::geometry::{px_to_mm, to_pixel_band};
use paysplit_split::{DocumentProcessor, InvalidRegionPolicy, SplitError};
use serde::Serialize;

/// Archive stem used when the input path has no usable file stem.
const DEFAULT_STEM: &str = "documento";

/// Everything needed to split one document.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub input: PathBuf,
    pub profile: DocumentProfile,
    /// Regions to cut. Empty means the profile's default cuts.
    pub cuts: Vec<CutRegion>,
    /// Where outputs go. Defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
    /// Also write every named fragment as a standalone PDF.
    pub individual: bool,
    pub policy: InvalidRegionPolicy,
}

/// What a finished `split` wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOutcome {
    pub archive_path: PathBuf,
    pub individual_paths: Vec<PathBuf>,
    pub page_count: usize,
    pub duplicates: usize,
    pub artifacts: Vec<ArtifactSummary>,
}

/// The caller's cuts, or the profile's defaults when none were given.
#[must_use]
pub fn effective_cuts(profile: &DocumentProfile, cuts: &[CutRegion]) -> Vec<CutRegion> {
    if cuts.is_empty() {
        profile.default_cuts.clone()
    } else {
        cuts.to_vec()
    }
}

/// Parses a comma-separated list such as `20-106, 106-184`.
///
/// # Errors
///
/// Returns the first entry that is not a valid `START-END` pair.
pub fn parse_cut_list(input: &str) -> Result<Vec<CutRegion>, ParseCutRegionError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[must_use]
pub fn format_cuts(cuts: &[CutRegion]) -> String {
    cuts.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[must_use]
pub fn input_stem(input: &Path) -> &str {
    input
        .file_stem()
        .and_then(OsStr::to_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STEM)
}

/// `output` if given, otherwise the directory holding `input`.
#[must_use]
pub fn output_dir(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map_or_else(
        || {
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    )
}

/// Splits the requested document and writes the archive (plus individual
/// fragments when asked). Nothing is written if the batch fails.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the batch aborts, or an
/// output file cannot be written.
pub async fn split(
    multi: &MultiProgress,
    request: SplitRequest,
) -> Result<SplitOutcome, Box<dyn std::error::Error>> {
    let cuts = effective_cuts(&request.profile, &request.cuts);
    log::info!(
        "Using profile {} ({}) with regions {}",
        request.profile.id,
        request.profile.name,
        format_cuts(&cuts)
    );

    let bytes = tokio::fs::read(&request.input).await?;
    let progress =
        IndicatifProgress::fragments_bar(multi, &format!("Splitting {}", request.input.display()));
    let processor = DocumentProcessor::new(&request.profile)?
        .with_policy(request.policy)
        .with_progress(progress);

    let processed =
        tokio::task::spawn_blocking(move || processor.process_document(&bytes, &cuts)).await??;

    let dir = output_dir(&request.input, request.output_dir.as_deref());
    tokio::fs::create_dir_all(&dir).await?;

    let archive_path = dir.join(archive_file_name(
        input_stem(&request.input),
        &request.profile.archive_suffix,
    ));
    tokio::fs::write(&archive_path, &processed.archive).await?;
    log::info!("Wrote {}", archive_path.display());

    let mut individual_paths = Vec::new();
    if request.individual {
        for artifact in processed.named_artifacts() {
            let path = dir.join(&artifact.file_name);
            tokio::fs::write(&path, &artifact.bytes).await?;
            individual_paths.push(path);
        }
        log::info!("Wrote {} individual documents", individual_paths.len());
    }

    Ok(SplitOutcome {
        archive_path,
        individual_paths,
        page_count: processed.page_count,
        duplicates: processed.duplicates,
        artifacts: processed.summaries(),
    })
}

/// Prints a finished split as a table, or as JSON for scripting.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_outcome(outcome: &SplitOutcome, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!();
    println!("{:<44} {:>4} {:<14} {:<5} NAMED", "FILE", "PAGE", "REGION", "POS");
    println!("{}", "-".repeat(78));
    for artifact in &outcome.artifacts {
        println!(
            "{:<44} {:>4} {:<14} {:<5} {}",
            artifact.file_name,
            artifact.page,
            artifact.cut.to_string(),
            artifact.position.to_string(),
            if artifact.is_named_result { "yes" } else { "no" }
        );
    }
    println!();
    println!(
        "{} pages, {} fragments archived, {} duplicates skipped",
        outcome.page_count,
        outcome.artifacts.len(),
        outcome.duplicates
    );
    println!("Archive: {}", outcome.archive_path.display());
    for path in &outcome.individual_paths {
        println!("  {}", path.display());
    }

    Ok(())
}

/// Shows how one page is cut and read: page geometry, each region's band,
/// the reading-ordered runs of every fragment and the name (or fallback)
/// it resolves to. `page_number` is one-based.
///
/// # Errors
///
/// Returns [`SplitError`] if the document cannot be loaded, the page does
/// not exist, a fragment cannot be cropped, or the profile does not
/// compile. Invalid regions and unreadable text layers are reported inline.
pub fn inspect(
    profile: &DocumentProfile,
    pdf_bytes: &[u8],
    cuts: &[CutRegion],
    page_number: usize,
) -> Result<(), SplitError> {
    let splitter = PdfPageSplitter::from_bytes(pdf_bytes)?;
    let page_index = page_number.saturating_sub(1);
    let size = splitter.page_size(page_index)?;
    let engine = NameEngine::from_profile(profile)?;

    println!("Profile: {} ({})", profile.id, profile.name);
    println!("Pages:   {}", splitter.page_count());
    println!(
        "Page {page_number}:  {:.1} x {:.1} pt ({:.0} x {:.0} mm)",
        size.width,
        size.height,
        size.width / PX_PER_MM,
        size.height / PX_PER_MM
    );

    for (i, cut) in cuts.iter().enumerate() {
        println!();
        let band = match to_pixel_band(i + 1, cut, profile.page_height_mm) {
            Ok(band) => band,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        println!(
            "Region {} {cut} ({}), band {band}, height {}pt ({:.1} mm cropped)",
            i + 1,
            cut.position(),
            band.height(),
            px_to_mm(band.height())
        );

        let fragment = splitter.split_region(page_index, band)?;
        let runs = match PdfTextLayer.read_runs(&fragment) {
            Ok(runs) => runs,
            Err(e) => {
                println!("  text layer unreadable: {e}");
                continue;
            }
        };

        let ordered = reading_order(&runs, profile.line_tolerance, profile.line_grouping);
        for run in ordered.iter().filter(|r| !r.is_blank()) {
            println!("  {:>7.1} {:>7.1}  {}", run.x, run.y, run.text);
        }

        match engine.extract(&ordered) {
            Some(candidate) => println!(
                "  => {} ({}, rank {})",
                candidate.value, candidate.strategy, candidate.strategy_rank
            ),
            None => println!(
                "  => no name, fallback {}",
                fallback_file_name(&profile.fallback_prefix, cut, page_number)
            ),
        }
    }

    Ok(())
}

/// Prints a table of the built-in profiles.
pub fn print_profiles() {
    println!("{:<16} {:<34} DEFAULT CUTS", "ID", "NAME");
    println!("{}", "-".repeat(80));
    for profile in all_profiles() {
        println!(
            "{:<16} {:<34} {}",
            profile.id,
            profile.name,
            format_cuts(&profile.default_cuts)
        );
    }
}

#[cfg(test)]
mod tests {
    use paysplit_names::profile::find_profile;

    use super::*;

    #[test]
    fn parses_comma_separated_cuts() {
        let cuts = parse_cut_list("20-106, 106-184,184-261mm,").unwrap();
        assert_eq!(
            cuts,
            vec![
                CutRegion::new(20.0, 106.0),
                CutRegion::new(106.0, 184.0),
                CutRegion::new(184.0, 261.0),
            ]
        );
        assert!(parse_cut_list("20-106, abc").is_err());
        assert!(parse_cut_list("").unwrap().is_empty());
    }

    #[test]
    fn falls_back_to_profile_cuts() {
        let profile = find_profile("contracheque").unwrap();
        assert_eq!(effective_cuts(profile, &[]), profile.default_cuts);

        let custom = [CutRegion::new(10.0, 50.0)];
        assert_eq!(effective_cuts(profile, &custom), custom.to_vec());
    }

    #[test]
    fn formats_cut_lists() {
        assert_eq!(
            format_cuts(&[CutRegion::new(0.0, 145.0), CutRegion::new(146.0, 297.0)]),
            "0-145mm, 146-297mm"
        );
    }

    #[test]
    fn derives_output_locations_from_input() {
        let input = Path::new("/data/folha_marco.pdf");
        assert_eq!(input_stem(input), "folha_marco");
        assert_eq!(output_dir(input, None), PathBuf::from("/data"));
        assert_eq!(
            output_dir(input, Some(Path::new("/tmp/out"))),
            PathBuf::from("/tmp/out")
        );

        let bare = Path::new("folha.pdf");
        assert_eq!(output_dir(bare, None), PathBuf::from("."));
    }

    #[test]
    fn stem_defaults_when_missing() {
        assert_eq!(input_stem(Path::new("/")), DEFAULT_STEM);
    }
}
