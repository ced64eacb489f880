// src/cli.rs

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ecoslug - a pesticide application log for the command line",
    long_about = "ecoslug keeps a numbered log of pesticide applications, tracks pest counts before and after treatment, and gives weather advice on when to spray. Everything is stored locally."
)]
pub struct Cli {
    /// Path of the local database. Defaults to ~/.config/ecoslug/ecoslug.db
    #[arg(long, global = true, env = "ECOSLUG_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Fields of a log entry. Date and time default to now when adding.
#[derive(Args, Debug, Default)]
pub struct EntryFields {
    #[arg(short, long, help = "Date applied (format: YYYY-MM-DD)")]
    pub date: Option<String>,

    #[arg(short, long, help = "Time applied (format: HH:MM, 24-hour)")]
    pub time: Option<String>,

    #[arg(short, long, help = "Plant or area treated")]
    pub plant: Option<String>,

    #[arg(short = 'a', long, help = "Dosage or amount used")]
    pub dosage: Option<String>,

    #[arg(short, long, help = "Notes or remarks")]
    pub notes: Option<String>,
}

impl EntryFields {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.plant.is_none()
            && self.dosage.is_none()
            && self.notes.is_none()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates the database and checks the stored log.
    Init,

    /// Adds a new application entry.
    Add {
        #[command(flatten)]
        fields: EntryFields,
    },

    /// Lists all entries, newest number first.
    List,

    /// Shows one entry in full.
    Show {
        #[arg(help = "The entry number")]
        number: u64,
    },

    /// Edits an entry. Without any field flags, opens it in the default editor.
    Edit {
        #[arg(help = "The entry number")]
        number: u64,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Deletes an entry. Other entries keep their numbers.
    Del {
        #[arg(help = "The entry number")]
        number: u64,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Exports the log as a text table (pesticide-log-YYYY-MM-DD.txt).
    Export {
        #[arg(short, long, value_name = "DIR", help = "Directory to write the file to")]
        output: Option<PathBuf>,

        #[arg(long, conflicts_with = "output", help = "Print the export instead of writing a file")]
        stdout: bool,
    },

    /// Records the time of the latest pesticide application.
    Applied {
        #[arg(long, help = "RFC 3339 timestamp; defaults to now")]
        at: Option<String>,
    },

    /// Shows current weather, spraying advice and the next application countdown.
    Weather,

    /// Records pest counts and shows treatment effectiveness.
    Pest {
        #[command(subcommand)]
        action: PestAction,
    },

    /// Shows or sets the colour theme preference.
    Theme {
        #[arg(value_parser = ["light", "dark", "system"], conflicts_with = "toggle")]
        value: Option<String>,

        #[arg(long, help = "Switch between light and dark")]
        toggle: bool,

        #[arg(long, value_enum, default_value_t = SystemAppearance::Light, help = "What 'system' currently resolves to")]
        system_appearance: SystemAppearance,
    },

    /// Signs in with an identity provider ID token. Enables sync after each change.
    Signin {
        #[arg(long, env = "ECOSLUG_ID_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Signs out.
    Signout,

    /// Shows the signed-in user.
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum PestAction {
    /// Sets a count (0-100) for the treated or control group.
    Set {
        #[arg(help = "treated or control")]
        group: String,
        #[arg(help = "before or after")]
        timing: String,
        value: u32,
    },

    /// Shows the counts and the effectiveness calculation.
    Show,

    /// Clears all counts.
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SystemAppearance {
    Light,
    Dark,
}
