//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ridesched - schedule club rides on the route-planning service
#[derive(Debug, Parser)]
#[command(name = "ridesched")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "RIDESCHED_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Emit logs as JSON (for scheduled runs)
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the service base URL
    #[arg(long, env = "RIDESCHED_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with the configured username and password
    Login,

    /// Event commands
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Route commands
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },

    /// Print the EXP: tag for a ride date
    ExpiryTag {
        /// Ride date (YYYY-MM-DD or MM/DD/YYYY)
        date: String,

        /// Days after the ride date (defaults to [expiry] days)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Event actions.
#[derive(Debug, Subcommand)]
pub enum EventAction {
    /// Fetch an event
    Get { url: String },

    /// Delete an event
    Delete { url: String },

    /// Mark an event cancelled
    Cancel { url: String },

    /// Remove the cancelled marker from an event
    Reinstate { url: String },

    /// Create an event and assign its organizers
    Schedule {
        #[command(flatten)]
        fields: EventFields,

        /// Logo image to upload with the event
        #[arg(long)]
        logo: Option<PathBuf>,
    },

    /// Edit an existing event
    Update {
        url: String,

        #[command(flatten)]
        fields: EventFields,
    },

    /// Copy an event template into a new event
    Copy {
        /// Template event URL
        template: String,

        /// Name for the new event
        #[arg(long)]
        name: Option<String>,
    },

    /// Add or remove tags on events
    Tag {
        #[command(flatten)]
        tags: TagArgs,
    },
}

/// Route actions.
#[derive(Debug, Subcommand)]
pub enum RouteAction {
    /// Fetch a route
    Get { url: String },

    /// Copy a route into the club account and tag it
    Import {
        /// Source route URL
        url: String,

        /// Name for the copy
        #[arg(long)]
        name: Option<String>,

        /// Account that owns the copy
        #[arg(long)]
        user_id: Option<String>,

        /// Tag to add (can be repeated)
        #[arg(long = "tag", action = clap::ArgAction::Append)]
        tags: Vec<String>,

        /// Add an expires: tag for this date
        #[arg(long)]
        expires: Option<String>,
    },

    /// Set a route's expiration date
    Expire {
        url: String,

        /// Expiration date (YYYY-MM-DD or MM/DD/YYYY)
        date: String,

        /// Write even if the existing expiration is later
        #[arg(long, short)]
        force: bool,
    },

    /// Add or remove tags on routes
    Tag {
        #[command(flatten)]
        tags: TagArgs,
    },
}

/// Event fields given on the command line. Unset flags are left untouched.
#[derive(Debug, Clone, Default, Args)]
pub struct EventFields {
    /// Event name
    #[arg(long)]
    pub name: Option<String>,

    /// Description
    #[arg(long)]
    pub desc: Option<String>,

    /// Start (RFC 3339, e.g. 2025-01-25T09:30:00-08:00)
    #[arg(long)]
    pub start: Option<String>,

    /// End (RFC 3339)
    #[arg(long)]
    pub end: Option<String>,

    /// Location
    #[arg(long)]
    pub location: Option<String>,

    /// Visibility: public, private or friends_only
    #[arg(long)]
    pub visibility: Option<String>,

    /// Mark as an all-day event
    #[arg(long)]
    pub all_day: bool,

    /// Organizer name to resolve (can be repeated)
    #[arg(long = "organizer", action = clap::ArgAction::Append, conflicts_with = "organizer_ids")]
    pub organizers: Vec<String>,

    /// Organizer id (can be repeated)
    #[arg(long = "organizer-id", action = clap::ArgAction::Append)]
    pub organizer_ids: Vec<String>,

    /// Route URL to attach (can be repeated)
    #[arg(long = "route", action = clap::ArgAction::Append)]
    pub routes: Vec<String>,
}

/// Targets and tags of a batch tag update.
#[derive(Debug, Clone, Args)]
pub struct TagArgs {
    /// Resource URLs
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Tag (can be repeated)
    #[arg(long = "tag", required = true, action = clap::ArgAction::Append)]
    pub tags: Vec<String>,

    /// Remove the tags instead of adding them
    #[arg(long)]
    pub remove: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
