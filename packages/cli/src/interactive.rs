#![allow(clippy::module_name_repetitions)]

//! Menu-driven front end using `dialoguer`, for running the splitter
//! without memorizing flags.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};
use paysplit_cli_utils::MultiProgress;
use paysplit_document_models::CutRegion;
use paysplit_names::DocumentProfile;
use paysplit_names::profile::{all_profiles, load_profile};
use paysplit_split::InvalidRegionPolicy;

use crate::commands::{self, SplitRequest, format_cuts, parse_cut_list};

/// Top-level actions available in the interactive menu.
enum Action {
    Split,
    Inspect,
    ListProfiles,
}

impl Action {
    const ALL: &[Self] = &[Self::Split, Self::Inspect, Self::ListProfiles];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Split => "Split a document",
            Self::Inspect => "Inspect a page",
            Self::ListProfiles => "List document profiles",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Payroll Splitter");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Split => split(multi).await?,
        Action::Inspect => inspect().await?,
        Action::ListProfiles => commands::print_profiles(),
    }

    Ok(())
}

async fn split(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let input = prompt_input_file()?;
    let profile = select_profile()?;
    let cuts = prompt_cuts(&profile)?;

    let individual = Confirm::new()
        .with_prompt("Also save each named document separately?")
        .default(false)
        .interact()?;
    let skip_invalid = Confirm::new()
        .with_prompt("Skip invalid regions instead of aborting?")
        .default(false)
        .interact()?;

    let request = SplitRequest {
        input,
        profile,
        cuts,
        output_dir: None,
        individual,
        policy: if skip_invalid {
            InvalidRegionPolicy::Skip
        } else {
            InvalidRegionPolicy::Abort
        },
    };

    let outcome = commands::split(multi, request).await?;
    commands::print_outcome(&outcome, false)?;

    Ok(())
}

async fn inspect() -> Result<(), Box<dyn std::error::Error>> {
    let input = prompt_input_file()?;
    let profile = select_profile()?;
    let cuts = prompt_cuts(&profile)?;
    let page: usize = Input::new()
        .with_prompt("Page number")
        .default(1)
        .interact_text()?;

    let bytes = tokio::fs::read(&input).await?;
    commands::inspect(&profile, &bytes, &commands::effective_cuts(&profile, &cuts), page)?;

    Ok(())
}

fn prompt_input_file() -> Result<PathBuf, dialoguer::Error> {
    let path: String = Input::new()
        .with_prompt("PDF file")
        .validate_with(|input: &String| -> Result<(), &'static str> {
            if Path::new(input.trim()).is_file() {
                Ok(())
            } else {
                Err("file not found")
            }
        })
        .interact_text()?;

    Ok(PathBuf::from(path.trim()))
}

/// Lets the user pick a built-in profile or load one from a TOML file.
fn select_profile() -> Result<DocumentProfile, Box<dyn std::error::Error>> {
    let profiles = all_profiles();
    let mut labels: Vec<String> = profiles
        .iter()
        .map(|p| format!("{} - {}", p.id, p.name))
        .collect();
    labels.push("Load profile from file...".to_owned());

    let idx = Select::new()
        .with_prompt("Document type")
        .items(&labels)
        .default(0)
        .interact()?;

    if let Some(profile) = profiles.get(idx) {
        return Ok(profile.clone());
    }

    let path: String = Input::new()
        .with_prompt("Profile TOML path")
        .interact_text()?;
    Ok(load_profile(path.trim())?)
}

/// Empty means "use the profile's default cuts".
fn prompt_cuts(profile: &DocumentProfile) -> Result<Vec<CutRegion>, dialoguer::Error> {
    let keep_defaults = Confirm::new()
        .with_prompt(format!(
            "Use the default regions ({})?",
            format_cuts(&profile.default_cuts)
        ))
        .default(true)
        .interact()?;

    if keep_defaults {
        return Ok(Vec::new());
    }

    let raw: String = Input::new()
        .with_prompt("Regions in mm from the page top (e.g. 20-106, 106-184)")
        .validate_with(|input: &String| -> Result<(), String> {
            match parse_cut_list(input) {
                Ok(cuts) if cuts.is_empty() => Err("at least one region is required".to_owned()),
                Ok(_) => Ok(()),
                Err(e) => Err(e.to_string()),
            }
        })
        .interact_text()?;

    Ok(parse_cut_list(&raw).unwrap_or_default())
}
