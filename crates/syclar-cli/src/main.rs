use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "syclar", version, about = "Syclar CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hero rank
    Rank {
        #[command(subcommand)]
        action: commands::rank::RankAction,
    },
    /// Screentime tracker
    Track {
        #[command(subcommand)]
        action: commands::track::TrackAction,
    },
    /// Focus sessions
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Tactical board
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Strategy planner
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Email waitlist
    Waitlist {
        #[command(subcommand)]
        action: commands::waitlist::WaitlistAction,
    },
    /// Activity statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Journal stories
    Story {
        #[command(subcommand)]
        action: commands::journal::StoryAction,
    },
    /// Accomplishments per client
    Accomplish {
        #[command(subcommand)]
        action: commands::journal::AccomplishAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SYCLAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Rank { action } => commands::rank::run(action),
        Commands::Track { action } => commands::track::run(action),
        Commands::Focus { action } => commands::focus::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Waitlist { action } => commands::waitlist::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Story { action } => commands::journal::run_story(action),
        Commands::Accomplish { action } => commands::journal::run_accomplish(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
