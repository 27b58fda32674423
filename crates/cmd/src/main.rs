// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use bucketfs::FileMode;
use clap::{Parser, Subcommand};

use cmd::commands;
use cmd::common::{ShipContext, parse_mode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bucketfs")]
struct Cli {
    /// Bucket configuration (YAML). Without it the environment is used:
    /// BUCKET_NAME, ENDPOINT, ACCESS_KEY_ID, SECRET_ACCESS_KEY, ...
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory
    Ls {
        /// Directory or file path
        #[arg(default_value = "/")]
        path: String,
        /// Show mode, size and modification time
        #[arg(short, long)]
        long: bool,
    },
    /// Describe a file or directory
    Stat { path: String },
    /// Print a file to stdout
    Cat { path: String },
    /// Upload a local file
    Put {
        /// Local source file
        local: PathBuf,
        /// Destination path or directory in the bucket
        dest: String,
        /// Permission bits (octal)
        #[arg(short, long, default_value = "644", value_parser = parse_mode_arg)]
        mode: FileMode,
    },
    /// Download a file
    Get {
        /// Source path in the bucket
        source: String,
        /// Local destination file
        local: PathBuf,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Create missing parents as well
        #[arg(short, long)]
        parents: bool,
        /// Permission bits (octal)
        #[arg(short, long, default_value = "755", value_parser = parse_mode_arg)]
        mode: FileMode,
    },
    /// Remove a file or an empty directory
    Rm {
        path: String,
        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show the tree below a directory
    Tree {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Change permission bits
    Chmod {
        /// Permission bits (octal)
        #[arg(value_parser = parse_mode_arg)]
        mode: FileMode,
        path: String,
    },
    /// Move a file
    Mv { from: String, to: String },
}

fn parse_mode_arg(value: &str) -> std::result::Result<FileMode, String> {
    parse_mode(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let ship = ShipContext::new(cli.config);
    let fs = ship.open_fs()?;

    match &cli.command {
        Commands::Ls { path, long } => {
            let mut out = std::io::stdout().lock();
            commands::list_command(&fs, path, *long, &mut out).await
        }
        Commands::Stat { path } => {
            let mut out = std::io::stdout().lock();
            commands::stat_command(&fs, path, &mut out).await
        }
        Commands::Cat { path } => {
            let mut out = tokio::io::stdout();
            _ = commands::cat_command(&fs, path, &mut out).await?;
            Ok(())
        }
        Commands::Put { local, dest, mode } => {
            _ = commands::put_command(&fs, local, dest, *mode).await?;
            Ok(())
        }
        Commands::Get { source, local } => {
            _ = commands::get_command(&fs, source, local).await?;
            Ok(())
        }
        Commands::Mkdir {
            path,
            parents,
            mode,
        } => commands::mkdir_command(&fs, path, *parents, *mode).await,
        Commands::Rm { path, recursive } => commands::remove_command(&fs, path, *recursive).await,
        Commands::Tree { path } => {
            let mut out = std::io::stdout().lock();
            commands::tree_command(&fs, path, &mut out).await
        }
        Commands::Chmod { mode, path } => commands::chmod_command(&fs, *mode, path).await,
        Commands::Mv { from, to } => commands::rename_command(&fs, from, to).await,
    }
}
