use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tripit_api::config::Settings;
use tripit_api::{build_state, Planner};
use tripit_core::{ItineraryRequest, SuggestionContext, UserPreferences, DEFAULT_TRAVELERS};
use tripit_observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "tripit")]
#[command(about = "TripIT travel planner CLI")]
struct Cli {
    /// Overrides TRIPIT_CATALOG_PATH.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank destinations and explain the best matches.
    Recommend {
        #[arg(long)]
        budget: u64,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        travel_type: String,
        #[arg(long)]
        interest: String,
        #[arg(long, default_value_t = DEFAULT_TRAVELERS)]
        travelers: u32,
    },
    /// Generate a day-by-day itinerary.
    Itinerary {
        #[arg(long)]
        destination: String,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        budget: u64,
        #[arg(long)]
        travel_type: String,
        #[arg(long)]
        interest: String,
        #[arg(long, default_value_t = DEFAULT_TRAVELERS)]
        travelers: u32,
    },
    Chat,
    /// Tips for a partially filled preference form.
    Suggest {
        #[arg(long)]
        trip_type: Option<String>,
        #[arg(long)]
        terrain: Option<String>,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        location_pref: Option<String>,
        #[arg(long)]
        specific_location: Option<String>,
    },
    Destinations,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("tripit_cli");
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(catalog) = cli.catalog {
        settings.catalog_path = catalog;
    }
    let planner = build_state(&settings)
        .await
        .context("failed to initialize planner")?
        .planner;

    match cli.command {
        Command::Recommend {
            budget,
            days,
            travel_type,
            interest,
            travelers,
        } => {
            let response = planner
                .recommend(UserPreferences {
                    budget,
                    days,
                    travel_type,
                    interest,
                    travelers,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Itinerary {
            destination,
            days,
            budget,
            travel_type,
            interest,
            travelers,
        } => {
            let itinerary = planner
                .generate_itinerary(ItineraryRequest {
                    destination,
                    days,
                    budget,
                    travel_type,
                    interest,
                    travelers,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
        }
        Command::Chat => run_chat(&planner).await?,
        Command::Suggest {
            trip_type,
            terrain,
            budget,
            duration,
            location_pref,
            specific_location,
        } => {
            let tips = planner
                .suggestions(SuggestionContext {
                    trip_type,
                    terrain,
                    budget,
                    duration,
                    location_pref,
                    specific_location,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&tips)?);
        }
        Command::Destinations => {
            let destinations = planner.destinations();
            println!("{}", serde_json::to_string_pretty(destinations.as_ref())?);
        }
    }

    Ok(())
}

async fn run_chat(planner: &Planner) -> Result<()> {
    println!("TripIT chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        match planner.chat(message).await {
            Ok(reply) => println!("\n{}\n", reply),
            Err(err) => println!("\n{}\n", err),
        }
    }

    Ok(())
}
