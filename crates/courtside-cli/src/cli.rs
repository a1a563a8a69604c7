//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Courtside - tournament listings, results and registrations for the club
#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(about = "Tournament listings, results and registrations for the Courtside badminton club")]
#[command(version)]
pub struct Cli {
    /// API base URL, overriding the config file and COURTSIDE_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Log cache and request activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw records as JSON instead of formatted listings
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tournaments open or opening for registration
    Upcoming,
    /// Finished tournaments
    Completed,
    /// Winners and gallery images
    Results,
    /// One completed tournament with its results
    Event {
        /// Completed event id
        id: i64,
    },
    /// Upcoming and completed tournaments together
    Events,
    /// Player registrations (admin view)
    Registrations {
        /// Only show registrations for this event
        #[arg(long)]
        event_id: Option<i64>,
    },
    /// Register a player for a tournament
    Register(RegisterArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub age: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: String,

    #[arg(long)]
    pub gender: String,

    #[arg(long)]
    pub state: String,

    #[arg(long, default_value = "")]
    pub district: String,

    /// National, State or District
    #[arg(long)]
    pub level: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub address: String,

    /// Upcoming event to register for
    #[arg(long)]
    pub event_id: Option<String>,

    /// JPG identity document, at most 2MB
    #[arg(long, value_name = "PATH")]
    pub document: Option<PathBuf>,
}
