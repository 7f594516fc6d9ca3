use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};

use meteo_core::{
    Config, Location, LookupController, SearchOutcome, WeatherReading,
    provider::open_meteo::{OpenMeteoGeocoder, OpenMeteoWeather},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "City weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a city.
    Show {
        /// City name to look up.
        city: String,
    },

    /// Prompt repeatedly for city names; an empty answer exits.
    Interactive,

    /// Set the fallback location used when a lookup fails.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Show { city } => {
                let mut controller = build_controller()?;
                controller.set_query_text(city);
                run_search(&mut controller).await;
            }
            Command::Interactive => {
                let mut controller = build_controller()?;
                loop {
                    let answer = Text::new("City:")
                        .with_help_message("press ESC or leave empty to quit")
                        .prompt_skippable()?;

                    let Some(city) = answer.filter(|city| !city.is_empty()) else {
                        break;
                    };

                    controller.set_query_text(city);
                    run_search(&mut controller).await;
                }
            }
            Command::Configure => configure()?,
        }

        Ok(())
    }
}

fn build_controller() -> anyhow::Result<LookupController> {
    let config = Config::load()?;

    Ok(LookupController::new(
        Box::new(OpenMeteoGeocoder::new()?),
        Box::new(OpenMeteoWeather::new()?),
        config.fallback_location(),
    ))
}

async fn run_search(controller: &mut LookupController) {
    match controller.search().await {
        Ok(SearchOutcome::Skipped) => println!("Nothing to look up."),
        Ok(outcome) => {
            if let Some(reading) = controller.state().last_reading.as_ref() {
                print_reading(reading);
                if outcome == SearchOutcome::Fallback {
                    println!("  (showing the fallback location)");
                }
            }
        }
        Err(err) => eprintln!("{err}"),
    }
}

fn print_reading(reading: &WeatherReading) {
    let fetched = reading.fetched_at.with_timezone(&chrono::Local);

    println!("Weather for {}", reading.location_name);
    println!("  temperature: {:.1} °C", reading.temperature_celsius);
    println!("  humidity:    {}", reading.humidity);
    println!("  wind speed:  {:.1} km/h", reading.wind_speed_kmh);
    println!("  fetched at:  {}", fetched.format("%Y-%m-%d %H:%M"));
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let current = config.fallback_location();
    println!("Current fallback location: {current}");

    let latitude = CustomType::<f64>::new("Fallback latitude:")
        .with_error_message("Please enter a number")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Fallback longitude:")
        .with_error_message("Please enter a number")
        .prompt()?;
    let name = Text::new("Display name:").prompt()?;

    config.set_fallback(&Location::new(latitude, longitude, name));
    config.save()?;

    println!("Saved fallback location to {}", Config::config_file_path()?.display());
    Ok(())
}
