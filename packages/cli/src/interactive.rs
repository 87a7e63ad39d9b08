//! Menu-driven front end using `dialoguer`, for running the tools without
//! memorizing flags.

use air_quality_data::DataStore;
use air_quality_geo_models::Pollutant;
use air_quality_stats_models::PValueMethod;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::commands::{self, CommandResult};

/// Top-level actions in the interactive menu.
enum Action {
    Nearby,
    Seasons,
    Pollutants,
    Monthly,
    Profile,
    Correlations,
    ListStations,
    ShowConfig,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Nearby,
        Self::Seasons,
        Self::Pollutants,
        Self::Monthly,
        Self::Profile,
        Self::Correlations,
        Self::ListStations,
        Self::ShowConfig,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Nearby => "Find stations near a city",
            Self::Seasons => "Compare seasons for a pollutant",
            Self::Pollutants => "Compare pollutants",
            Self::Monthly => "Monthly station aggregates",
            Self::Profile => "Hour/weekday profile",
            Self::Correlations => "Pollutant correlations",
            Self::ListStations => "List stations",
            Self::ShowConfig => "Show configuration",
        }
    }
}

fn select_pollutant(store: &DataStore, prompt: &str) -> Result<Pollutant, dialoguer::Error> {
    let pollutants = &store.config().pollutants;
    let labels: Vec<String> = pollutants.iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(pollutants[idx])
}

fn select_pollutants(store: &DataStore, prompt: &str) -> Result<Vec<Pollutant>, dialoguer::Error> {
    let pollutants = &store.config().pollutants;
    let labels: Vec<String> = pollutants.iter().map(ToString::to_string).collect();
    let selected = MultiSelect::new()
        .with_prompt(prompt)
        .items(&labels)
        .interact()?;
    Ok(selected.into_iter().map(|i| pollutants[i]).collect())
}

fn prompt_optional(prompt: &str) -> Result<Option<String>, dialoguer::Error> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn confirm_json() -> Result<bool, dialoguer::Error> {
    Confirm::new()
        .with_prompt("Print as JSON?")
        .default(false)
        .interact()
}

/// Runs one round of the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub fn run(store: &DataStore) -> CommandResult {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Nearby => {
            let cities = store.cities()?;
            if cities.is_empty() {
                println!("No cities with usable coordinates.");
                return Ok(());
            }
            let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
            let city = Select::new()
                .with_prompt("City")
                .items(&names)
                .default(0)
                .max_length(20)
                .interact()?;

            let radius: f64 = Input::new()
                .with_prompt("Radius (km)")
                .default(store.config().default_radius_km)
                .interact_text()?;
            let geojson = Confirm::new()
                .with_prompt("Print as GeoJSON?")
                .default(false)
                .interact()?;
            let json = !geojson && confirm_json()?;

            commands::nearby_stations(store, names[city], Some(radius), geojson, json)?;
        }
        Action::Seasons => {
            let pollutant = select_pollutant(store, "Pollutant")?;
            commands::seasons(store, pollutant, PValueMethod::Auto, confirm_json()?)?;
        }
        Action::Pollutants => {
            let selected = select_pollutants(
                store,
                "Select pollutants to compare (space=toggle, enter=confirm)",
            )?;
            if selected.len() < 2 {
                println!("Select at least two pollutants.");
                return Ok(());
            }
            commands::pollutants(store, &selected, PValueMethod::Auto, confirm_json()?)?;
        }
        Action::Monthly => {
            let pollutant = select_pollutant(store, "Pollutant")?;
            let table = store.pollutant(pollutant)?;
            let names = table.sorted_column_names();
            if names.is_empty() {
                println!("No station columns in the {pollutant} table.");
                return Ok(());
            }

            let selected = MultiSelect::new()
                .with_prompt("Select stations (space=toggle, enter=confirm)")
                .items(&names)
                .max_length(20)
                .interact()?;
            let stations = selected.into_iter().map(|i| names[i].to_string()).collect();

            let from = prompt_optional("Start date YYYY-MM-DD (empty for none)")?;
            let to = prompt_optional("End date YYYY-MM-DD (empty for none)")?;
            let max = Select::new()
                .with_prompt("Aggregate")
                .items(&["Mean", "Max"])
                .default(0)
                .interact()?
                == 1;

            let params = commands::monthly_params(stations, from, to, max)?;
            commands::monthly(store, pollutant, &params, confirm_json()?)?;
        }
        Action::Profile => {
            let pollutant = select_pollutant(store, "Pollutant")?;
            commands::profile(store, pollutant, confirm_json()?)?;
        }
        Action::Correlations => {
            let selected =
                select_pollutants(store, "Select pollutants (none selected = all available)")?;
            commands::correlations(store, &selected, confirm_json()?)?;
        }
        Action::ListStations => commands::stations(store, false)?,
        Action::ShowConfig => commands::config(store)?,
    }

    Ok(())
}
