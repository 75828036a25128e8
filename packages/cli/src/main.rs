#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Chocó malaria covariate pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`malaria_choco_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use malaria_choco_cases::parsing::parse_month;
use malaria_choco_cases::{CaseColumns, DEFAULT_SPECIES};
use malaria_choco_cases_models::Covariate;
use malaria_choco_cli_utils::IndicatifProgress;
use malaria_choco_geography::DEFAULT_CODE_PROPERTY;
use malaria_choco_interpolate::BoundaryPolicy;
use malaria_choco_render::{MapSpec, default_maps};

use crate::config::{PipelineConfig, resolve_config_path};
use crate::pipeline::InterpolateOptions;

#[derive(Parser)]
#[command(
    name = "malaria_choco",
    about = "Gap-fill, join, and map malaria case covariates for Chocó"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter one species and interpolate missing covariates per municipality
    Interpolate {
        /// Input case/covariate CSV
        #[arg(long)]
        input: PathBuf,
        /// Output CSV for the interpolated table
        #[arg(long)]
        output: PathBuf,
        /// Disease label to keep
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,
        /// Also fill trailing gaps with the last observation
        #[arg(long)]
        carry_forward: bool,
    },
    /// Join an interpolated table onto municipal boundaries (`GeoJSON` out)
    Join {
        /// Interpolated case CSV
        #[arg(long)]
        cases: PathBuf,
        /// Municipality boundaries (`GeoJSON` `FeatureCollection`)
        #[arg(long)]
        municipalities: PathBuf,
        /// Output `GeoJSON` path
        #[arg(long)]
        output: PathBuf,
        /// Keep only rows of this month (YYYY-MM)
        #[arg(long, value_parser = parse_month_arg)]
        date: Option<NaiveDate>,
        /// Feature property holding the municipality code
        #[arg(long, default_value = DEFAULT_CODE_PROPERTY)]
        code_property: String,
    },
    /// Render choropleth maps of one month
    Map {
        /// Interpolated case CSV
        #[arg(long)]
        cases: PathBuf,
        /// Municipality boundaries (`GeoJSON` `FeatureCollection`)
        #[arg(long)]
        municipalities: PathBuf,
        /// Month to map (YYYY-MM)
        #[arg(long, value_parser = parse_month_arg)]
        date: NaiveDate,
        /// Directory for the SVG files
        #[arg(long)]
        out_dir: PathBuf,
        /// Map to render as FIELD:SCALE (repeatable; defaults to the standard five)
        #[arg(long = "field")]
        fields: Vec<MapSpec>,
        /// Feature property holding the municipality code
        #[arg(long, default_value = DEFAULT_CODE_PROPERTY)]
        code_property: String,
    },
    /// Run the whole pipeline from a TOML config
    Run {
        /// Config file (overrides `MALARIA_CHOCO_CONFIG`)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Disease label to keep (overrides the config)
        #[arg(long)]
        species: Option<String>,
        /// Month to map, YYYY-MM (overrides the config)
        #[arg(long, value_parser = parse_month_arg)]
        date: Option<NaiveDate>,
        /// Also fill trailing gaps with the last observation
        #[arg(long)]
        carry_forward: bool,
    },
}

fn parse_month_arg(s: &str) -> Result<NaiveDate, String> {
    parse_month(s).ok_or_else(|| format!("invalid month '{s}' (expected YYYY-MM)"))
}

const fn policy(carry_forward: bool) -> BoundaryPolicy {
    if carry_forward {
        BoundaryPolicy::CarryForward
    } else {
        BoundaryPolicy::Interior
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = malaria_choco_cli_utils::init_logger();
    let cli = Cli::parse();
    let start = Instant::now();
    let columns = CaseColumns::default();

    match cli.command {
        Commands::Interpolate {
            input,
            output,
            species,
            carry_forward,
        } => {
            let options = InterpolateOptions {
                columns: &columns,
                species: &species,
                covariates: &Covariate::ALL,
                policy: policy(carry_forward),
            };
            let progress = IndicatifProgress::groups_bar(&multi, "Interpolating");
            let rows = pipeline::interpolate(&input, &output, &options, progress.as_ref())?;
            log::info!("Interpolated {rows} rows in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Join {
            cases,
            municipalities,
            output,
            date,
            code_property,
        } => {
            let rows = pipeline::join(
                &cases,
                &municipalities,
                &output,
                date,
                &columns,
                &code_property,
            )?;
            log::info!("Joined {rows} rows in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Map {
            cases,
            municipalities,
            date,
            out_dir,
            fields,
            code_property,
        } => {
            let maps = if fields.is_empty() { default_maps() } else { fields };
            let written = pipeline::map(
                &cases,
                &municipalities,
                date,
                &out_dir,
                &maps,
                &columns,
                &code_property,
            )?;
            log::info!(
                "Rendered {} maps in {:.1}s",
                written.len(),
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Run {
            config,
            species,
            date,
            carry_forward,
        } => {
            let mut config = PipelineConfig::load(resolve_config_path(config))?;
            if let Some(species) = species {
                config.species = species;
            }
            if let Some(date) = date {
                config.map_date = date;
            }
            if carry_forward {
                config.boundary_policy = BoundaryPolicy::CarryForward;
            }

            let steps = IndicatifProgress::steps_bar(&multi, "Pipeline", 3);
            let groups = IndicatifProgress::groups_bar(&multi, "Interpolating");
            let summary = pipeline::run(&config, steps.as_ref(), groups.as_ref())?;
            log::info!(
                "Pipeline finished in {:.1}s: {} interpolated rows, {} joined rows, {} maps",
                start.elapsed().as_secs_f64(),
                summary.interpolated_rows,
                summary.joined_rows,
                summary.maps.len()
            );
        }
    }

    Ok(())
}
