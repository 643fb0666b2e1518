use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lophoc-cli", version, about = "Lophoc CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrollment management
    Enrollment {
        #[command(subcommand)]
        action: commands::enrollment::EnrollmentAction,
    },
    /// Expiry reconciliation
    Reconcile {
        #[command(subcommand)]
        action: commands::reconcile::ReconcileAction,
    },
    /// Notification history
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Enrollment { action } => commands::enrollment::run(action),
        Commands::Reconcile { action } => commands::reconcile::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
