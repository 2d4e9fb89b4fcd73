mod cmd;
mod output;
mod root;
mod schedule;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, criteria::CriteriaSubcommand, member::MemberSubcommand,
    queue::QueueSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "roster",
    about = "Member compliance monitoring — scan members against criteria and review proposed status changes",
    version,
    propagate_version = true
)]
struct Cli {
    /// Organization root (default: auto-detect from .roster/)
    #[arg(long, global = true, env = "ROSTER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize roster in the current directory
    Init {
        /// Organization name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Inspect and edit compliance criteria
    Criteria {
        #[command(subcommand)]
        subcommand: CriteriaSubcommand,
    },

    /// Validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Inspect members and their compliance
    Member {
        #[command(subcommand)]
        subcommand: MemberSubcommand,
    },

    /// Evaluate every member and replace the review queue
    Scan,

    /// Review proposed actions
    Queue {
        #[command(subcommand)]
        subcommand: QueueSubcommand,
    },

    /// Scan now and then on a fixed interval until interrupted
    Watch {
        /// Seconds between scans (default: watch.interval_secs from config)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many scans
        #[arg(long)]
        runs: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&root, name.as_deref()),
        Commands::Criteria { subcommand } => cmd::criteria::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Member { subcommand } => cmd::member::run(&root, subcommand, cli.json),
        Commands::Scan => cmd::scan::run(&root, cli.json),
        Commands::Queue { subcommand } => cmd::queue::run(&root, subcommand, cli.json),
        Commands::Watch { interval, runs } => cmd::watch::run(&root, interval, runs, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
