#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `paysplit`: splits payroll PDFs into one document per employee.
//!
//! Every page of the input is cut into the configured regions, each
//! fragment is named after the employee found in its text layer, repeated
//! names are dropped and the rest is packed into a ZIP archive next to the
//! input. Without a subcommand the tool asks for everything interactively.
//!
//! Uses `indicatif-log-bridge` (via [`paysplit_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use paysplit_cli_utils::MultiProgress;
use paysplit_document_models::CutRegion;
use paysplit_names::profile::load_profile;
use paysplit_split::InvalidRegionPolicy;

use crate::commands::SplitRequest;

#[derive(Parser)]
#[command(
    name = "paysplit",
    about = "Split payroll PDFs into one named document per employee"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut every page into regions, name each fragment and archive them
    Split {
        /// PDF to split
        input: PathBuf,

        /// Built-in profile id or path to a profile TOML file
        #[arg(long, default_value = "recibo")]
        profile: String,

        /// Cut region in millimeters from the page top (repeatable).
        /// Defaults to the profile's regions.
        #[arg(long = "cut", value_name = "START-END")]
        cuts: Vec<CutRegion>,

        /// Output directory (defaults to the input's directory)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write each named fragment as its own PDF
        #[arg(long)]
        individual: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Skip invalid regions instead of aborting the batch
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Show how a page is cut and which text each fragment yields
    Inspect {
        /// PDF to inspect
        input: PathBuf,

        /// Built-in profile id or path to a profile TOML file
        #[arg(long, default_value = "recibo")]
        profile: String,

        /// Cut region in millimeters from the page top (repeatable)
        #[arg(long = "cut", value_name = "START-END")]
        cuts: Vec<CutRegion>,

        /// One-based page to inspect
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List built-in document profiles
    Profiles,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = paysplit_cli_utils::init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli, &multi).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let Some(command) = cli.command else {
        return interactive::run(multi).await;
    };

    match command {
        Commands::Split {
            input,
            profile,
            cuts,
            output,
            individual,
            json,
            skip_invalid,
        } => {
            let request = SplitRequest {
                input,
                profile: load_profile(&profile)?,
                cuts,
                output_dir: output,
                individual,
                policy: if skip_invalid {
                    InvalidRegionPolicy::Skip
                } else {
                    InvalidRegionPolicy::Abort
                },
            };
            let outcome = commands::split(multi, request).await?;
            commands::print_outcome(&outcome, json)?;
        }
        Commands::Inspect {
            input,
            profile,
            cuts,
            page,
        } => {
            let profile = load_profile(&profile)?;
            let cuts = commands::effective_cuts(&profile, &cuts);
            let bytes = tokio::fs::read(&input).await?;
            commands::inspect(&profile, &bytes, &cuts, page)?;
        }
        Commands::Profiles => commands::print_profiles(),
    }

    Ok(())
}
