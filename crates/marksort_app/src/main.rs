//! Marksort: reorganize an exported bookmark tree into model-suggested folders.

mod commands;
mod logging;
mod render;
mod settings;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use logging::LogDestination;

#[derive(Parser)]
#[command(name = "marksort")]
#[command(about = "Organize bookmarks into folders with Gemini")]
#[command(version)]
struct Cli {
    /// Settings file holding the API key and defaults
    #[arg(long, default_value = settings::DEFAULT_SETTINGS_FILE, global = true)]
    settings: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::File, global = true)]
    log: LogDestination,

    /// More log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Back up the bookmarks bar and refill it with categorized folders
    Organize(OrganizeArgs),

    /// Count bookmarks and folders in a tree file
    Stats {
        /// Bookmark tree JSON
        tree: PathBuf,
    },

    /// Store the API key in the settings file
    SetKey {
        key: String,
    },

    /// Check that an API key is accepted by the model endpoint
    TestKey {
        /// Key to test instead of the configured one
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Args)]
struct OrganizeArgs {
    /// Bookmark tree JSON, rewritten in place unless --output is given
    tree: PathBuf,

    /// Write the reorganized tree here instead
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Upper bound on the number of folders
    #[arg(long)]
    max_folders: Option<u32>,

    /// Skip the dead link check
    #[arg(long)]
    no_validate: bool,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(
        cli.log,
        marksort_logging::level_from_verbosity(cli.verbose),
    );

    match cli.command {
        Command::Organize(args) => commands::organize(&cli.settings, args),
        Command::Stats { tree } => commands::stats(&tree),
        Command::SetKey { key } => commands::set_key(&cli.settings, &key),
        Command::TestKey { key } => commands::test_key(&cli.settings, key),
    }
}
