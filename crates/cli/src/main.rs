use anyhow::Result;
use clap::{Parser, Subcommand};
use sigsmith::commands::{
    generate_command, goodware_create_command, goodware_info_command, goodware_update_command,
    GenerateArgs, GoodwareScanArgs,
};
use sigsmith::init_tracing;
use sigsmith_core::db::DEFAULT_DB_FILE;

/// Bulk signature rule generator.
///
/// This CLI is a thin wrapper around `sigsmith-core` (exposed in code as `sigsmith_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "sigsmith",
    version,
    about = "Generate signature rules from strings shared by malware samples",
    long_about = None
)]
struct Cli {
    /// Verbose trace output on stderr.
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan malware directories and write signature rules.
    ///
    /// Strings found in the goodware database (or in `--goodware-dir`) are
    /// never used.
    Generate(GenerateArgs),

    /// Manage the goodware string database.
    #[command(subcommand)]
    Goodware(GoodwareCommand),
}

#[derive(Subcommand, Debug)]
enum GoodwareCommand {
    /// Create a new goodware database from benign directories.
    Create {
        /// Directory with benign files (repeatable).
        #[arg(long = "dir", required = true)]
        dirs: Vec<String>,

        /// Database file to create.
        #[arg(long, default_value = DEFAULT_DB_FILE)]
        db: String,

        /// Recurse into the directories.
        #[arg(long, default_value_t = false)]
        recursive: bool,

        /// Only scan executable-like extensions.
        #[arg(long, default_value_t = false)]
        only_executables: bool,

        /// Skip files larger than this many bytes.
        #[arg(long)]
        max_file_size: Option<u64>,
    },

    /// Merge strings from benign directories into an existing database.
    Update {
        /// Directory with benign files (repeatable).
        #[arg(long = "dir", required = true)]
        dirs: Vec<String>,

        /// Database file to update.
        #[arg(long, default_value = DEFAULT_DB_FILE)]
        db: String,

        /// Recurse into the directories.
        #[arg(long, default_value_t = false)]
        recursive: bool,

        /// Only scan executable-like extensions.
        #[arg(long, default_value_t = false)]
        only_executables: bool,

        /// Skip files larger than this many bytes.
        #[arg(long)]
        max_file_size: Option<u64>,
    },

    /// Show entry counts for a goodware database.
    Info {
        /// Database file to inspect.
        #[arg(long, default_value = DEFAULT_DB_FILE)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Generate(args) => {
            generate_command(&args)?;
        }
        Command::Goodware(GoodwareCommand::Create {
            dirs,
            db,
            recursive,
            only_executables,
            max_file_size,
        }) => {
            let args = GoodwareScanArgs { dirs, db, recursive, only_executables, max_file_size };
            goodware_create_command(&args)?;
        }
        Command::Goodware(GoodwareCommand::Update {
            dirs,
            db,
            recursive,
            only_executables,
            max_file_size,
        }) => {
            let args = GoodwareScanArgs { dirs, db, recursive, only_executables, max_file_size };
            goodware_update_command(&args)?;
        }
        Command::Goodware(GoodwareCommand::Info { db, json }) => goodware_info_command(&db, json)?,
    }

    Ok(())
}
