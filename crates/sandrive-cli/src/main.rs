//! sandrive command-line front end.
//!
//! Runs one drive operation against a sandboxed root and prints the result
//! as JSON on stdout. Logs go to stderr.
//!
//! Usage:
//!   sandrive --root ./files ls -r --nested
//!   sandrive --root ./files --no-clobber put /notes/today.md today.md
//!   sandrive --config drive.toml cp /a.txt /backup
//!   RUST_LOG=sandrive=trace sandrive --root ./files ls -r

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use sandrive::{Drive, DriveConfig, ListOptions, NameMatcher};

/// Sandboxed file operations on a directory tree.
#[derive(Parser, Debug)]
#[command(name = "sandrive", version)]
#[command(about = "Sandboxed file operations on a directory tree")]
struct Args {
    /// Drive config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Drive root; overrides the config file (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Rename around existing targets instead of overwriting them
    #[arg(long, global = true)]
    no_clobber: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a folder
    Ls {
        #[arg(default_value = "/")]
        id: String,
        /// Only list folders
        #[arg(long)]
        skip_files: bool,
        /// Walk descendant folders
        #[arg(short, long)]
        recursive: bool,
        /// Attach descendants under their folder
        #[arg(long)]
        nested: bool,
        /// Only list files matching this glob (repeatable)
        #[arg(long)]
        include: Vec<String>,
        /// Skip files matching this glob (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Describe one entry
    Info { id: String },
    /// Print a file's contents
    Cat { id: String },
    /// Write a file from a local file, or stdin
    Put { id: String, source: Option<PathBuf> },
    /// Create a folder and its parents
    Mkdir { id: String },
    /// Remove a file or folder tree
    Rm { id: String },
    /// Copy a file or folder tree
    Cp { source: String, target: String },
    /// Move a file or folder tree
    Mv { source: String, target: String },
}

#[derive(Serialize)]
struct Written {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
}

impl Written {
    fn id(id: String) -> Self {
        Self { id, bytes: None }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_drive(args: &Args) -> Result<Drive> {
    let mut config = match &args.config {
        Some(path) => DriveConfig::load(path)?,
        None => DriveConfig::default(),
    };
    if let Some(root) = &args.root {
        config.root = Some(root.clone());
    }
    if config.root.is_none() {
        config.root = Some(std::env::current_dir().context("no current directory")?);
    }
    if args.no_clobber {
        config.operation.prevent_name_collision = true;
    }
    Ok(config.build()?)
}

fn print_json(out: &mut dyn Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run(args: &Args, drive: &Drive, out: &mut dyn Write) -> Result<()> {
    match &args.command {
        Command::Ls {
            id,
            skip_files,
            recursive,
            nested,
            include,
            exclude,
        } => {
            let defaults = drive.list_options();
            let mut options = ListOptions {
                skip_files: defaults.skip_files || *skip_files,
                recurse: defaults.recurse || *recursive,
                nested: defaults.nested || *nested,
                ..defaults.clone()
            };
            if let Some(matcher) = NameMatcher::any_glob(include)? {
                options.include = Some(matcher);
            }
            if let Some(matcher) = NameMatcher::any_glob(exclude)? {
                options.exclude = Some(matcher);
            }
            print_json(out, &drive.list_with(id, &options)?)
        }
        Command::Info { id } => print_json(out, &drive.info(id)?),
        Command::Cat { id } => {
            let mut reader = drive.open(id)?;
            io::copy(&mut reader, out)?;
            Ok(())
        }
        Command::Put { id, source } => {
            let mut input: Box<dyn Read> = match source {
                Some(path) => Box::new(
                    File::open(path).with_context(|| format!("opening {}", path.display()))?,
                ),
                None => Box::new(io::stdin().lock()),
            };
            let (id, bytes) = drive.write_from(id, &mut input)?;
            print_json(
                out,
                &Written {
                    id,
                    bytes: Some(bytes),
                },
            )
        }
        Command::Mkdir { id } => print_json(out, &Written::id(drive.mkdir(id)?)),
        Command::Rm { id } => {
            drive.remove(id)?;
            print_json(out, &Written::id(id.clone()))
        }
        Command::Cp { source, target } => {
            print_json(out, &Written::id(drive.copy(source, target)?))
        }
        Command::Mv { source, target } => {
            print_json(out, &Written::id(drive.move_to(source, target)?))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let drive = open_drive(&args)?;
    tracing::debug!(root = %drive.root().display(), "opened drive");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&args, &drive, &mut out)?;
    out.flush()?;
    Ok(())
}
