use anyhow::Result;
use clap::{Parser, Subcommand};
use sandbox_facts::commands::*;
use sandbox_facts::init_logging;

/// Sandbox report and feature archive CLI.
///
/// This CLI is a thin wrapper around `facts-core` (exposed in code as `facts_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "sandbox-facts",
    version,
    about = "Validate sandbox reports and archive extracted features",
    long_about = None
)]
struct Cli {
    /// Log debug events to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a sandbox report and summarize what it describes.
    ///
    /// Validation problems are listed with their field paths.
    ReportInfo {
        /// Path to the report JSON.
        #[arg(long)]
        path: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also list vendor fields the model does not declare.
        #[arg(long, default_value_t = false)]
        audit: bool,

        /// Sample file to check against the report's SHA-256.
        #[arg(long)]
        sample: Option<String>,
    },

    /// Initialize a new feature archive at the given root.
    ///
    /// This will:
    /// - Create a `.facts` metadata directory.
    /// - Write a `.facts/archive.json` config file.
    /// - Create the feature database.
    InitArchive {
        /// Archive root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional archive name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Register the target of a sandbox report in the archive.
    AddSample {
        /// Archive root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the report JSON.
        #[arg(long)]
        report: String,
    },

    /// Store a batch of feature records (JSON or YAML) for a sample.
    ImportFeatures {
        /// Archive root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// SHA-256 of a registered sample.
        #[arg(long)]
        sample: String,

        /// Batch file: a list of `{scope, address, feature}` entries.
        #[arg(long)]
        path: String,
    },

    /// List the features stored for a sample.
    ListFeatures {
        /// Archive root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// SHA-256 of a registered sample.
        #[arg(long)]
        sample: String,

        /// Emit a re-importable JSON batch instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List all samples registered in the archive.
    ListSamples {
        /// Archive root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::ReportInfo { path, json, audit, sample } => {
            report_info_command(&path, json, audit, sample)?
        }
        Command::InitArchive { root, name } => init_archive_command(&root, name)?,
        Command::AddSample { root, report } => add_sample_command(&root, &report)?,
        Command::ImportFeatures { root, sample, path } => {
            import_features_command(&root, &sample, &path)?
        }
        Command::ListFeatures { root, sample, json } => {
            list_features_command(&root, &sample, json)?
        }
        Command::ListSamples { root, json } => list_samples_command(&root, json)?,
    }

    Ok(())
}
