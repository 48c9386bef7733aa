mod platform;

use std::path::PathBuf;

use clap::Parser;
use platform::logging::LogDestination;

/// Convert a captured page to Markdown via the remote conversion service.
#[derive(Debug, Parser)]
#[command(name = "clipdown", version)]
pub(crate) struct Cli {
    /// Path to the page markup to load as the current document.
    pub(crate) page: PathBuf,

    /// CSS selector to click in the region-selection overlay; repeatable.
    /// When given, the region flow runs instead of the whole-page workflow.
    #[arg(long = "select")]
    pub(crate) select: Vec<String>,

    /// Conversion endpoint override.
    #[arg(long)]
    pub(crate) endpoint: Option<String>,

    /// Directory downloads are written to.
    #[arg(long, default_value = "downloads")]
    pub(crate) out_dir: PathBuf,

    /// Log to the terminal as well as ./clipdown.log.
    #[arg(long)]
    pub(crate) verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::logging::initialize(if cli.verbose {
        LogDestination::Both
    } else {
        LogDestination::File
    });
    platform::run(cli)
}
