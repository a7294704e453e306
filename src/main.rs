use chrono::Utc;
use clap::Parser;
use color_eyre::Result;
use std::path::Path;
use taskdeck::{Config, Database, Profile, TaskBoard, cli::Cli};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // An explicit --config file wins over the profile's default location
    let config = match &cli.config {
        Some(path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    // RUST_LOG overrides the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;

    let user_id = cli.user.clone().unwrap_or_else(|| config.user_id.clone());
    let mut board = TaskBoard::open(db, user_id).with_calendar(config.calendar());

    let mut stdout = std::io::stdout().lock();
    taskdeck::cli::run(cli.command, &mut board, &config, Utc::now(), &mut stdout)?;

    Ok(())
}
