//! Corten Node runtime CLI
//!
//! Entry point for the runtime. Parses CLI arguments, sets up logging and
//! delegates to the Runtime or the REPL.

use builtins::StdoutSink;
use clap::Parser as ClapParser;
use node_cli::repl::run_repl;
use node_cli::{Cli, CliResult, Runtime};
use node_process::JsContext;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_env("RUST_LOG")
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let env = cli.environment()?;

    if let Some(file) = &cli.file {
        Runtime::new(env, &cli.label).execute_file(file)
    } else if let Some(code) = &cli.eval {
        Runtime::new(env, &cli.label).execute_string(code)
    } else if cli.repl {
        let mut context = JsContext::new(&env, &cli.label, Arc::new(StdoutSink))?;
        run_repl(&mut context)
    } else {
        println!("Corten Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage:");
        println!("  corten-node --file <FILE> [ARGS]...   Run a script file");
        println!("  corten-node --eval <CODE>             Evaluate inline code");
        println!("  corten-node --repl                    Start interactive REPL");
        println!();
        println!("Run 'corten-node --help' for more options.");
        Ok(0)
    }
}
