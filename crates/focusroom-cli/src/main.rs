use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusroom-cli", version, about = "Focusroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Study timetable generation and tracking
    Timetable {
        #[command(subcommand)]
        action: commands::timetable::TimetableAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Show the focus leaderboard of a running server
    Leaderboard {
        #[command(flatten)]
        target: commands::remote::ServerTarget,
    },
    /// Show the current focus roster of a running server
    Snapshot {
        #[command(flatten)]
        target: commands::remote::ServerTarget,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focusroom_core=info,focusroom_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timetable { action } => commands::timetable::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Leaderboard { target } => commands::remote::leaderboard(target),
        Commands::Snapshot { target } => commands::remote::snapshot(target),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "focusroom-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
