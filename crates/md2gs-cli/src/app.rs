//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use md2gs_slides::{
    copy_slide, edit_slide, ensure_markers, push_deck, DeckCompiler, DeckConfig, ElementUpdate,
    PresentationClient, PushReport,
};

use crate::client::{SlidesClient, DEFAULT_API_URL};

#[derive(Parser)]
#[command(name = "md2gs")]
#[command(author, version, about = "Markdown to slide decks", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Deck configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials and endpoint for remote commands
#[derive(Args)]
struct RemoteArgs {
    /// OAuth bearer token
    #[arg(long, env = "MD2GS_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Slides API endpoint
    #[arg(long, env = "MD2GS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

impl RemoteArgs {
    fn client(&self) -> Result<SlidesClient> {
        SlidesClient::with_url(&self.api_url, &self.token)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Markdown file and print the deck as JSON (no network)
    Compile {
        /// Input Markdown file
        input: PathBuf,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append a Markdown deck to a presentation
    Push {
        /// Input Markdown file
        input: PathBuf,

        /// Target presentation id
        #[arg(short, long)]
        presentation: String,

        /// Delete the existing slides first
        #[arg(long)]
        erase: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Mark every slide and print the presentation metadata as JSON
    Markers {
        /// Presentation id
        presentation: String,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Duplicate a slide and print the new slide id
    CopySlide {
        /// Presentation id
        presentation: String,

        /// Slide to duplicate
        slide: String,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Replace element text or images from a JSON list of updates
    Edit {
        /// Presentation id
        presentation: String,

        /// JSON file: `[{"elementId": "...", "text": "..."}, {"elementId": "...", "imageUrl": "..."}]`
        updates: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Compile { input, output } => {
            compile_command(&input, output.as_deref(), config)?;
        }
        Commands::Push {
            input,
            presentation,
            erase,
            remote,
        } => {
            let client = remote.client()?;
            let report = block_on(push_command(&client, &input, &presentation, erase, config))?;
            println!(
                "Created {} slide(s), deleted {}, {} request(s)",
                report.created.len(),
                report.deleted,
                report.requests
            );
        }
        Commands::Markers {
            presentation,
            remote,
        } => {
            let client = remote.client()?;
            println!("{}", block_on(markers_command(&client, &presentation))?);
        }
        Commands::CopySlide {
            presentation,
            slide,
            remote,
        } => {
            let client = remote.client()?;
            println!("{}", block_on(copy_slide_command(&client, &presentation, &slide))?);
        }
        Commands::Edit {
            presentation,
            updates,
            remote,
        } => {
            let client = remote.client()?;
            let sent = block_on(edit_command(&client, &presentation, &updates))?;
            println!("Sent {sent} request(s)");
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` directives still apply.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // A second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

fn block_on<T>(future: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(future)
}

/// Load the deck configuration, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<DeckConfig> {
    match path {
        Some(path) => DeckConfig::from_file(path)
            .with_context(|| format!("Failed to read config: {}", path.display())),
        None => Ok(DeckConfig::default()),
    }
}

/// Compilation session for `config_path`. Font files and the theme resolve
/// relative to the configuration file.
pub fn compiler(config_path: Option<&Path>) -> Result<DeckCompiler> {
    let config = load_config(config_path)?;
    let base_dir = config_path
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    DeckCompiler::with_base_dir(config, base_dir).context("Failed to prepare fonts and theme")
}

fn read_markdown(input: &Path) -> Result<String> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read input file: {}", input.display()))
}

/// Execute the compile command
pub fn compile_command(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let markdown = read_markdown(input)?;
    let deck = compiler(config)?.compile(&markdown);
    let json = serde_json::to_string_pretty(&deck).context("Failed to serialize deck")?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(slides = deck.len(), output = %path.display(), "Wrote deck");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Execute the push command
pub async fn push_command<C: PresentationClient>(
    client: &C,
    input: &Path,
    presentation_id: &str,
    erase: bool,
    config: Option<&Path>,
) -> Result<PushReport> {
    let markdown = read_markdown(input)?;
    let compiler = compiler(config)?;

    let meta = ensure_markers(client, presentation_id)
        .await
        .with_context(|| format!("Failed to read presentation {presentation_id}"))?;
    let deck = compiler.compile_for(&markdown, Some(&meta));

    push_deck(client, presentation_id, &deck, &meta, compiler.config(), erase)
        .await
        .with_context(|| format!("Failed to push {} to {presentation_id}", input.display()))
}

/// Execute the markers command, returning the metadata as JSON
pub async fn markers_command<C: PresentationClient>(client: &C, presentation_id: &str) -> Result<String> {
    let meta = ensure_markers(client, presentation_id)
        .await
        .with_context(|| format!("Failed to mark presentation {presentation_id}"))?;
    serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")
}

/// Execute the copy-slide command
pub async fn copy_slide_command<C: PresentationClient>(
    client: &C,
    presentation_id: &str,
    slide_id: &str,
) -> Result<String> {
    copy_slide(client, presentation_id, slide_id)
        .await
        .with_context(|| format!("Failed to copy slide {slide_id}"))
}

/// Execute the edit command
pub async fn edit_command<C: PresentationClient>(
    client: &C,
    presentation_id: &str,
    updates: &Path,
) -> Result<usize> {
    let content = fs::read_to_string(updates)
        .with_context(|| format!("Failed to read updates: {}", updates.display()))?;
    let updates: Vec<ElementUpdate> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid updates file: {}", updates.display()))?;
    edit_slide(client, presentation_id, &updates)
        .await
        .with_context(|| format!("Failed to edit presentation {presentation_id}"))
}
