use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

use carewatch_cli::config;

mod commands;

use commands::{
    AssessArgs, ConfigCommand, Context, PatientsCommand, RoomsCommand, TimelineArgs,
};

#[derive(Parser)]
#[command(name = "carewatch")]
#[command(about = "Room occupancy, risk tiers and activity history for the clinic API")]
struct Cli {
    /// API root, overriding the config file and CAREWATCH_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rooms and occupancy
    #[command(subcommand)]
    Rooms(RoomsCommand),
    /// Patient records
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// Submit a risk assessment for a patient
    Assess(AssessArgs),
    /// Show the risk tier for a score
    Classify {
        /// Probability between 0 and 1
        score: f64,
    },
    /// Activity history
    Timeline(TimelineArgs),
    /// Local configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let stored = config::load_config()?;
    let mut effective = stored.clone().with_env(|key| std::env::var(key).ok());
    if let Some(url) = cli.api_url {
        effective.api_base_url = url;
    }

    let ctx = Context::new(effective, cli.json);
    match cli.command {
        Command::Rooms(cmd) => commands::rooms(&ctx, cmd).await,
        Command::Patients(cmd) => commands::patients(&ctx, cmd).await,
        Command::Assess(args) => commands::assess(&ctx, args).await,
        Command::Classify { score } => commands::classify(&ctx, score),
        Command::Timeline(args) => commands::timeline(&ctx, args).await,
        Command::Config(cmd) => commands::config(&ctx, stored, cmd),
    }
}
