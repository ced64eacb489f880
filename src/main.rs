// src/main.rs

use clap::Parser;
use ecoslug::cli::{Cli, Commands};
use ecoslug::{commands, db, Medium, Result};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ecoslug={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => db::default_db_path()?,
    };
    let medium = Medium::open(&db_path)?;

    match cli.command {
        Commands::Init => commands::handle_init(&medium, &db_path),
        Commands::Add { fields } => commands::handle_add(&medium, fields),
        Commands::List => commands::handle_list(&medium),
        Commands::Show { number } => commands::handle_show(&medium, number),
        Commands::Edit { number, fields } => commands::handle_edit(&medium, number, fields),
        Commands::Del { number, yes } => commands::handle_del(&medium, number, yes),
        Commands::Export { output, stdout } => commands::handle_export(&medium, output, stdout),
        Commands::Applied { at } => commands::handle_applied(&medium, at),
        Commands::Weather => commands::handle_weather(&medium),
        Commands::Pest { action } => commands::handle_pest(&medium, action),
        Commands::Theme {
            value,
            toggle,
            system_appearance,
        } => commands::handle_theme(&medium, value, toggle, system_appearance),
        Commands::Signin { token } => commands::handle_signin(&medium, &token),
        Commands::Signout => commands::handle_signout(&medium),
        Commands::Whoami => commands::handle_whoami(&medium),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
