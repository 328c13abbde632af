//! Command-line arguments

use crate::error::CliResult;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use node_process::HostEnvironment;
use std::path::PathBuf;

/// Default directory for sandboxes when neither `--files-dir` nor a config
/// file names one.
pub const DEFAULT_FILES_DIR: &str = ".corten";

/// Runs Node-style scripts in a sandboxed process.
#[derive(Parser, Debug)]
#[command(name = "corten-node", version, about)]
pub struct Cli {
    /// Script file to run
    #[arg(short, long, conflicts_with = "eval")]
    pub file: Option<PathBuf>,

    /// Inline script to run; a non-undefined result is printed
    #[arg(short, long)]
    pub eval: Option<String>,

    /// Start an interactive session
    #[arg(short, long, conflicts_with_all = ["file", "eval"])]
    pub repl: bool,

    /// Process label; selects the sandbox directory
    #[arg(short, long, default_value = "main")]
    pub label: String,

    /// Directory holding the sandboxes
    #[arg(long)]
    pub files_dir: Option<PathBuf>,

    /// JSON host configuration; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Arguments exposed to the script as `process.argv.slice(2)`
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Builds the host environment from the config file and flags.
    pub fn environment(&self) -> CliResult<HostEnvironment> {
        let mut env = match &self.config {
            Some(path) => HostEnvironment::from_json_file(path)?,
            None => HostEnvironment::new(DEFAULT_FILES_DIR),
        };
        if let Some(dir) = &self.files_dir {
            env.files_dir = dir.clone();
        }
        let script = match &self.file {
            Some(file) => file.display().to_string(),
            None => "[eval]".to_string(),
        };
        let argv = ["corten-node".to_string(), script]
            .into_iter()
            .chain(self.args.iter().cloned());
        let env = env.with_argv(argv);
        env.validate()?;
        Ok(env)
    }

    /// Log level implied by `--verbose`.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
