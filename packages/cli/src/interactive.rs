#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the gehl map toolchain.
//!
//! Builds the same [`Commands`] the CLI parses, prompting for the
//! parameters a user is likely to change and using defaults for the rest.

use dialoguer::{Confirm, Input, MultiSelect, Select};
use gehl_map_cli_utils::MultiProgress;
use gehl_map_places::DEFAULT_CONFIDENCE_THRESHOLD;

use crate::paths::DataDir;
use crate::{Commands, execute};

/// Top-level actions available in the interactive menu.
enum Action {
    RunPipeline,
    CategorisePlaces,
    JoinBuildings,
    ElaborateBuildings,
    CleanDatasets,
    ListDatasets,
}

impl Action {
    const ALL: &[Self] = &[
        Self::RunPipeline,
        Self::CategorisePlaces,
        Self::JoinBuildings,
        Self::ElaborateBuildings,
        Self::CleanDatasets,
        Self::ListDatasets,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunPipeline => "Run full pipeline (categorise, join, elaborate)",
            Self::CategorisePlaces => "Categorise places",
            Self::JoinBuildings => "Join building registers",
            Self::ElaborateBuildings => "Elaborate buildings",
            Self::CleanDatasets => "Clean datasets",
            Self::ListDatasets => "List datasets",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected step fails.
pub fn run(data: &DataDir, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Gehl Map Toolchain");
    println!("Data directory: {}", data.root().display());
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    for command in commands_for(&Action::ALL[idx])? {
        execute(command, data, multi)?;
    }

    Ok(())
}

/// Prompts for the parameters of an action and returns the commands to run,
/// in order.
fn commands_for(action: &Action) -> Result<Vec<Commands>, Box<dyn std::error::Error>> {
    Ok(match action {
        Action::RunPipeline => {
            let confidence_threshold = prompt_confidence_threshold()?;
            let (radii, storey_height) = prompt_elaboration()?;
            vec![
                categorise_places(confidence_threshold),
                join_buildings(),
                elaborate_buildings(confidence_threshold, radii, storey_height),
            ]
        }
        Action::CategorisePlaces => vec![categorise_places(prompt_confidence_threshold()?)],
        Action::JoinBuildings => vec![join_buildings()],
        Action::ElaborateBuildings => {
            let confidence_threshold = prompt_confidence_threshold()?;
            let (radii, storey_height) = prompt_elaboration()?;
            vec![elaborate_buildings(confidence_threshold, radii, storey_height)]
        }
        Action::CleanDatasets => select_datasets()?,
        Action::ListDatasets => vec![Commands::Datasets],
    })
}

const fn categorise_places(confidence_threshold: f64) -> Commands {
    Commands::CategorisePlaces {
        places: None,
        config: None,
        output: None,
        unmapped_output: None,
        confidence_threshold,
    }
}

const fn join_buildings() -> Commands {
    Commands::JoinBuildings {
        inputs: Vec::new(),
        purpose_codes: None,
        grouping: None,
        output: None,
    }
}

const fn elaborate_buildings(
    confidence_threshold: f64,
    radii: Vec<f64>,
    storey_height: Option<f64>,
) -> Commands {
    Commands::ElaborateBuildings {
        buildings: None,
        places: None,
        output: None,
        radii,
        storey_height,
        confidence_threshold,
    }
}

fn prompt_confidence_threshold() -> Result<f64, dialoguer::Error> {
    Input::new()
        .with_prompt("Minimum place confidence")
        .default(DEFAULT_CONFIDENCE_THRESHOLD)
        .validate_with(|value: &f64| {
            if (0.0..1.0).contains(value) {
                Ok(())
            } else {
                Err("confidence must be in [0, 1)")
            }
        })
        .interact_text()
}

/// Asks whether to override the study area radii and storey height.
fn prompt_elaboration() -> Result<(Vec<f64>, Option<f64>), Box<dyn std::error::Error>> {
    let customize = Confirm::new()
        .with_prompt("Override buffer radii or storey height?")
        .default(false)
        .interact()?;
    if !customize {
        return Ok((Vec::new(), None));
    }

    let area = gehl_map_buildings::registry::study_area();
    let default_radii = area
        .buffer_radii
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let radii: String = Input::new()
        .with_prompt("Buffer radii in metres (comma-separated)")
        .default(default_radii)
        .validate_with(|value: &String| parse_radii(value).map(|_| ()))
        .interact_text()?;
    let storey_height: f64 = Input::new()
        .with_prompt("Storey height in metres")
        .default(area.storey_height)
        .interact_text()?;

    Ok((parse_radii(&radii)?, Some(storey_height)))
}

/// Parses a comma-separated list of radii.
fn parse_radii(value: &str) -> Result<Vec<f64>, String> {
    let radii = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|e| format!("{s:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if radii.is_empty() {
        return Err("at least one radius is required".to_string());
    }
    Ok(radii)
}

/// Prompts for datasets via checkboxes.
fn select_datasets() -> Result<Vec<Commands>, Box<dyn std::error::Error>> {
    let datasets = gehl_map_clean::registry::all_datasets();
    let labels: Vec<String> = datasets
        .iter()
        .map(|d| format!("{} ({})", d.id, d.name))
        .collect();

    let selected = MultiSelect::new()
        .with_prompt("Select datasets to clean (space=toggle, a=all, enter=confirm)")
        .items(&labels)
        .interact()?;

    if selected.is_empty() {
        println!("No datasets selected.");
    }

    Ok(selected
        .into_iter()
        .map(|i| Commands::Clean {
            dataset: datasets[i].id.clone(),
            input: None,
            output: None,
        })
        .collect())
}
