use clap::Subcommand;
use std::path::PathBuf;

pub mod fix;
pub mod info;
pub mod inplace;

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite the R8 pg-map-id and every dependent checksum
    FixPgMapId {
        /// APK file or extracted app directory
        input: PathBuf,

        /// Output path, same form as the input
        output: PathBuf,

        /// Replacement id, exactly 7 lowercase hex digits
        pg_map_id: String,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Apply a named fixer to a file or directory in place
    InplaceFix {
        /// Fixer to run (currently: fix-pg-map-id)
        command: String,

        /// File or directory to fix in place
        file: PathBuf,

        /// Arguments passed to the fixer
        args: Vec<String>,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Inspect a DEX file, baseline profile, or APK
    Info {
        /// File to inspect
        file: PathBuf,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::FixPgMapId {
                input,
                output,
                pg_map_id,
                quiet,
            } => fix::execute(input, output, pg_map_id, *quiet),
            Commands::InplaceFix {
                command,
                file,
                args,
                quiet,
            } => inplace::execute(command, file, args, *quiet),
            Commands::Info { file } => info::execute(file),
        }
    }
}
