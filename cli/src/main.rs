use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use mprot_compiler::{compile, parse_files, CompileError, Options};
use mprot_schema::ErrorList;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mprotc")]
#[command(about = "Check mprot schema files or dump the resolved schema as JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and verify all matching schema files, reporting every error
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Write the resolved schema as JSON
    Dump {
        #[command(flatten)]
        input: Input,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Input {
    /// Directory the patterns are relative to
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Keep members tagged `deprecated`
    #[arg(long)]
    deprecated: bool,

    /// Glob patterns selecting the schema files (default `**/*.mprot`)
    patterns: Vec<String>,
}

impl Input {
    fn options(&self) -> Options {
        let mut options = Options {
            root_directory:  self.root.clone(),
            glob_patterns:   self.patterns.clone(),
            keep_deprecated: self.deprecated,
        };
        options.sanitize();
        options
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Commands::Check { input } => {
            let options = input.options();
            let (schema, errs) = parse_files(&options.root_directory, &options.glob_patterns)?;
            debug!(files = schema.files.len(), errors = errs.len(), "checked schema files");
            if !errs.is_empty() {
                return Ok(report(&errs));
            }
            println!("{} file(s) ok", schema.files.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Dump { input, output } => {
            let schema = match compile(&input.options()) {
                Ok(schema) => schema,
                Err(CompileError::Schema(errs)) => return Ok(report(&errs)),
                Err(err) => return Err(err.into()),
            };
            let json = serde_json::to_string_pretty(&schema)?;
            if let Some(out_path) = output {
                fs::write(out_path, &json)?;
                println!("Schema written to {}", out_path.display());
            } else {
                println!("{}", json);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Prints one `file:line:col: text` line per error.
fn report(errs: &ErrorList) -> ExitCode {
    for err in errs {
        eprintln!("{}", err);
    }
    ExitCode::FAILURE
}
