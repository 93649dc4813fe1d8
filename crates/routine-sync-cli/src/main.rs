use clap::{Parser, Subcommand};
use routine_sync_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "routine-sync-cli", version, about = "Routine widget CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current routine and its steps
    Routine {
        #[command(subcommand)]
        action: commands::routine::RoutineAction,
    },
    /// Task list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Water intake
    Water {
        #[command(subcommand)]
        action: commands::water::WaterAction,
    },
    /// Battery and flow record
    Energy {
        #[command(subcommand)]
        action: commands::energy::EnergyAction,
    },
    /// Notification alarm filter
    Alert {
        #[command(subcommand)]
        action: commands::alert::AlertAction,
    },
    /// Raw preference store access
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr. `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let loaded = Config::load();
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    init_tracing(&level);
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default configuration");
        Config::default()
    });

    let result = match cli.command {
        Commands::Routine { action } => commands::routine::run(action, &config),
        Commands::Task { action } => commands::task::run(action, &config),
        Commands::Water { action } => commands::water::run(action, &config),
        Commands::Energy { action } => commands::energy::run(action),
        Commands::Alert { action } => commands::alert::run(action, &config),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
