mod events;
mod location;
mod suggest;

use clap::{Parser, Subcommand};
use loaf_core::SourceTable;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "loaf")]
#[command(about = "Loaf Life location and map command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the canonical form of a stored `location` value
    Normalize {
        /// Raw stored value: plain address or `{address, lat, lng}` JSON
        raw: String,
    },
    /// List address suggestions for free text
    Suggest {
        query: String,
        /// Maximum number of suggestions (defaults to `LOAF_AUTOCOMPLETE_RESULT_LIMIT`)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Type text into the autocomplete engine, leave the field, and print
    /// the committed location
    Resolve { text: String },
    /// List map events from every thread
    Events {
        /// Only show these threads (hacks, deals, events); repeatable or comma-separated
        #[arg(long = "thread", value_delimiter = ',')]
        threads: Vec<SourceTable>,
    },
    /// Run the focus flight for one event on an offline viewport
    Focus {
        /// Event id, or a deep-link query such as `?focus=42`
        target: String,
        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,
        /// Viewport height in pixels
        #[arg(long, default_value = "800")]
        height: f64,
        /// Only load these threads
        #[arg(long = "thread", value_delimiter = ',')]
        threads: Vec<SourceTable>,
    },
    /// Resolve an address and store it as a record's location
    SetLocation {
        /// Thread table holding the record
        #[arg(long)]
        table: SourceTable,
        /// Record id
        #[arg(long)]
        id: String,
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = loaf_core::load_app_config();
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("loaf: run `loaf --help` to list commands");
        return Ok(());
    };

    match command {
        Commands::Normalize { raw } => location::run_normalize(&raw),
        Commands::Suggest { query, limit } => suggest::run_suggest(&config?, &query, limit).await,
        Commands::Resolve { text } => suggest::run_resolve(&config?, &text).await,
        Commands::Events { threads } => events::run_events(&config?, &threads).await,
        Commands::Focus {
            target,
            width,
            height,
            threads,
        } => events::run_focus(&config?, &target, width, height, &threads).await,
        Commands::SetLocation { table, id, address } => {
            location::run_set_location(&config?, table, &id, &address).await
        }
    }
}
