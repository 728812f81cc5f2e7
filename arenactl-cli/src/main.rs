//! arenactl CLI - keep a folder of Markdown notes in sync with Are.na
//!
//! - `push` / `pull` a single note against its block
//! - `channel` writes a whole channel into notes
//! - `fetch` and `pick` bring in single blocks
//! - `open` shows a note's block in the browser

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config;
mod prompt;
mod tracing_setup;
mod ui;

use commands::Session;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "arenactl",
    author,
    version,
    about = "Sync Markdown notes with Are.na blocks and channels",
    long_about = "Push notes to Are.na as blocks, pull blocks back into notes, and turn whole \
                  channels into folders. Notes are linked to blocks through a `blockid` \
                  frontmatter key."
)]
struct Cli {
    /// Debug logging (unless RUST_LOG is set)
    #[arg(long, global = true)]
    debug: bool,

    /// Suppress progress spinners
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Config file (default: ~/.arenactl/config.toml)
    #[arg(long = "config", global = true, env = "ARENACTL_CONFIG")]
    config_path: Option<PathBuf>,

    /// Root directory of the notes (default: config `vault`, then the current directory)
    #[arg(long, global = true, env = "ARENACTL_VAULT")]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update the note's block, or create a block in a channel you pick
    Push {
        /// Markdown note to push
        note: PathBuf,
    },
    /// Replace a note with its block's current content
    Pull {
        /// Markdown note with a blockid
        note: PathBuf,
    },
    /// Write every block of a channel into <folder>/<channel>/
    Channel {
        /// Channel slug (prompts for a channel when omitted)
        #[arg(long)]
        slug: Option<String>,
    },
    /// Open the note's block on are.na
    Open {
        /// Markdown note with a blockid
        note: PathBuf,
    },
    /// Fetch a block into the root folder by id or URL
    Fetch {
        /// Block id (12345) or URL (https://www.are.na/block/12345)
        id_or_url: String,
    },
    /// Choose a channel, then one of its blocks, and write it as a note
    Pick,
    /// List notes linked to blocks
    Tracked {
        /// Channel folder inside the root folder
        folder: Option<String>,
    },
    /// Manage arenactl configuration (init, get, set, list, path)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// `.env` in the working directory wins over `~/.arenactl/.env`; neither
/// overrides variables already set.
fn load_env_files() {
    dotenvy::dotenv().ok();
    dotenvy::from_path(arenactl_core::config::config_dir().join(".env")).ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_files();
    let cli = Cli::parse();

    tracing_setup::init_tracing(&TracingConfig {
        debug: cli.debug,
        quiet: cli.quiet,
    })
    .ok();
    ui::init_quiet_mode(cli.quiet);

    let store = config::store_for(cli.config_path);
    let vault = cli.vault;
    let session = || Session::open(&store, vault.as_deref());

    match cli.command {
        Commands::Push { note } => commands::run_push(&session()?, &note).await?,
        Commands::Pull { note } => commands::run_pull(&session()?, &note).await?,
        Commands::Channel { slug } => commands::run_channel(&session()?, slug).await?,
        Commands::Open { note } => commands::run_open(&session()?, &note).await?,
        Commands::Fetch { id_or_url } => commands::run_fetch(&session()?, &id_or_url).await?,
        Commands::Pick => commands::run_pick(&session()?).await?,
        Commands::Tracked { folder } => {
            commands::run_tracked(&session()?, folder.as_deref()).await?
        }
        Commands::Config(args) => config::run_config(args, &store)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
