use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use quackc::config::Config;
use quackc::diagnostics::{self, CompileError};
use quackc::typeck::dump;

#[derive(Parser)]
#[command(name = "quackc", version, about = "The Quack type checker")]
struct Cli {
    /// Log phase boundaries and fixed-point passes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a .qk source file
    Check {
        /// Source file path
        file: PathBuf,
        /// Path to quack.toml (defaults to the one next to the source file)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the finalized class hierarchy
        #[arg(long)]
        dump_hierarchy: bool,
        /// Dump as JSON instead of text
        #[arg(long, requires = "dump_hierarchy")]
        json: bool,
    },
    /// Print the parsed AST as JSON
    Ast {
        /// Source file path
        file: PathBuf,
    },
    /// Print the class hierarchy before inference, with inherited methods resolved
    Hierarchy {
        /// Source file path
        file: PathBuf,
        /// Path to quack.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("QUACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Render a fatal error against its source when one is available, then exit.
fn fail(file: &Path, source: Option<&str>, err: &CompileError) -> ! {
    let filename = file.display().to_string();
    match source {
        Some(src) => diagnostics::render_error(src, &filename, err),
        None => eprintln!("error [{filename}]: {err}"),
    }
    std::process::exit(1);
}

fn read_or_exit(file: &Path) -> String {
    match quackc::read_source(file) {
        Ok(src) => src,
        Err(err) => fail(file, None, &err),
    }
}

fn config_or_exit(explicit: Option<&Path>, file: &Path) -> Config {
    match Config::resolve(explicit, file) {
        Ok(config) => config,
        Err(err) => fail(file, None, &err),
    }
}

fn print_dump(hierarchy: &quackc::typeck::env::ClassHierarchy, json: bool, file: &Path) {
    if json {
        match dump::render_json(hierarchy) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error [{}]: could not serialize hierarchy: {e}", file.display());
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", dump::render_text(hierarchy));
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { file, config, dump_hierarchy, json } => {
            let config = config_or_exit(config.as_deref(), &file);
            let source = read_or_exit(&file);
            let output = match quackc::check_source_with(&source, &config) {
                Ok(output) => output,
                Err(err) => fail(&file, Some(&source), &err),
            };

            let filename = file.display().to_string();
            for diag in &output.diagnostics {
                diagnostics::render_diagnostic(&source, &filename, diag);
            }
            if dump_hierarchy {
                print_dump(&output.hierarchy, json, &file);
            }
            let unresolved = dump::unresolved_bindings(&output.hierarchy);
            for (name, ty) in &unresolved {
                eprintln!("error [{filename}]: '{name}' ended as {ty}");
            }
            if output.has_errors() || !unresolved.is_empty() {
                eprintln!(
                    "{}: {} error(s), {} unresolved binding(s)",
                    filename,
                    output.diagnostics.len(),
                    unresolved.len()
                );
                std::process::exit(1);
            }
            eprintln!("{}: ok ({} passes)", filename, output.passes);
        }
        Commands::Ast { file } => {
            let source = read_or_exit(&file);
            match quackc::ast_json(&source) {
                Ok(json) => println!("{json}"),
                Err(err) => fail(&file, Some(&source), &err),
            }
        }
        Commands::Hierarchy { file, config, json } => {
            let config = config_or_exit(config.as_deref(), &file);
            let source = read_or_exit(&file);
            let (hierarchy, diags) = match quackc::build_hierarchy(&source, &config) {
                Ok(built) => built,
                Err(err) => fail(&file, Some(&source), &err),
            };
            let filename = file.display().to_string();
            for diag in &diags {
                diagnostics::render_diagnostic(&source, &filename, diag);
            }
            print_dump(&hierarchy, json, &file);
            if !diags.is_empty() {
                std::process::exit(1);
            }
        }
    }
}
