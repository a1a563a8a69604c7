//! Courtside CLI - tournament listings, results and registrations.
//!
//! Thin front-end over `courtside-core`. All reads go through the cached
//! fetch client, so subcommands that touch the same endpoint twice only
//! hit the network once.

mod cli;
mod output;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use courtside_core::models::{Document, NewRegistration};
use courtside_core::{Config, FetchClient};

use cli::{Cli, Command, RegisterArgs};

/// Initialize the tracing subscriber for logging.
/// RUST_LOG wins over --verbose when set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "courtside_core=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    debug!(base_url = %config.base_url, "Courtside CLI starting");

    let client = FetchClient::new(config).context("Failed to build API client")?;
    run(&client, cli.command, cli.json).await
}

async fn run(client: &FetchClient, command: Command, json: bool) -> Result<()> {
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Upcoming => {
            let events = client
                .fetch_upcoming_events()
                .await
                .context("Failed to fetch upcoming events")?;
            emit(json, &events, || output::upcoming_events(&events, today))
        }
        Command::Completed => {
            let events = client
                .fetch_completed_events()
                .await
                .context("Failed to fetch completed events")?;
            emit(json, &events, || output::completed_events(&events))
        }
        Command::Results => {
            let results = client
                .fetch_event_results()
                .await
                .context("Failed to fetch event results")?;
            emit(json, &results, || output::event_results(&results))
        }
        Command::Event { id } => {
            let (event, results) = tokio::try_join!(
                client.fetch_completed_event(id),
                client.fetch_event_results()
            )
            .with_context(|| format!("Failed to fetch event {}", id))?;
            let matching = event.matching_results(&results);
            if json {
                print_json(&serde_json::json!({ "event": event, "results": matching }))
            } else {
                println!("{}", output::event_detail(&event, &matching));
                Ok(())
            }
        }
        Command::Events => {
            let all = client.fetch_all_events().await;
            if json {
                print_json(&serde_json::json!({
                    "upcoming": all.upcoming,
                    "completed": all.completed,
                }))
            } else {
                println!("Upcoming\n========\n{}", output::upcoming_events(&all.upcoming, today));
                println!("\nCompleted\n=========\n{}", output::completed_events(&all.completed));
                Ok(())
            }
        }
        Command::Registrations { event_id } => {
            let registrations = client
                .fetch_registrations(event_id)
                .await
                .context("Failed to fetch registrations")?;
            emit(json, &registrations, || output::registrations(&registrations))
        }
        Command::Register(args) => register(client, args, json).await,
    }
}

async fn register(client: &FetchClient, args: RegisterArgs, json: bool) -> Result<()> {
    let document = match &args.document {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read document {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.jpg".to_string());
            Some(Document { file_name, bytes })
        }
        None => None,
    };

    let registration = NewRegistration {
        name: args.name,
        age: args.age,
        dob: args.dob,
        gender: args.gender,
        state: args.state,
        district: args.district,
        level: args.level,
        email: args.email,
        phone_no: args.phone,
        address: args.address,
        event_id: args.event_id,
        document,
        ..NewRegistration::default()
    };
    let form = registration.into_form()?;

    let created = client
        .create_registration(form)
        .await
        .context("Registration failed")?;

    if json {
        print_json(&created)
    } else {
        match created.get("id") {
            Some(id) => println!("Registration successful (id {}).", id),
            None => println!("Registration successful."),
        }
        Ok(())
    }
}

/// Print `value` as JSON, or the text from `render`.
fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce() -> String) -> Result<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", render());
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
