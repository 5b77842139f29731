//! MockupGen CLI - Script generation bridge
//!
//! Commands: layers, plan, generate
//! Outputs JSON to stdout, logs to stderr
//! Returns 1 on input errors, 2 on pipeline failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mockupgen_core::{
    FailureMode, GenerationConfig, GenerationPipeline, ManifestLayerSource,
};

#[derive(Parser)]
#[command(name = "mockupgen-cli", version)]
#[command(about = "MockupGen CLI - batch mockup script generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List replaceable layers of a template (reads <template>.layers.json)
    Layers {
        /// Template path
        #[arg(short, long)]
        template: PathBuf,
    },

    /// Resolve and plan a run without emitting a script
    Plan {
        /// Generation config JSON file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate the automation script
    Generate {
        /// Generation config JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Write the script here and print the run manifest instead of the script
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Treat plan warnings as fatal
        #[arg(long)]
        deny_warnings: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => println!(r#"{{"error": "Serialization failed: {}"}}"#, e),
    }
}

fn failure(error: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": error.to_string(),
    })
}

fn load_config(path: &Path) -> Result<GenerationConfig, ExitCode> {
    GenerationConfig::load(path).map_err(|e| {
        tracing::error!(error = %e, "failed to load config");
        print_json(&failure(e));
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pipeline = GenerationPipeline::new(ManifestLayerSource);

    match cli.command {
        Commands::Layers { template } => match pipeline.list_layers(&template) {
            Ok(layers) => {
                print_json(&layers);
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_json(&failure(e));
                ExitCode::FAILURE
            }
        },

        Commands::Plan { config } => {
            let config = match load_config(&config) {
                Ok(c) => c,
                Err(code) => return code,
            };

            match pipeline.plan(&config) {
                Ok(run) => {
                    print_json(&serde_json::json!({ "success": true, "run": run }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&failure(e));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Generate { config, out, deny_warnings } => {
            let mut config = match load_config(&config) {
                Ok(c) => c,
                Err(code) => return code,
            };
            if deny_warnings {
                config.on_warning = FailureMode::Block;
            }

            let mut generated = match pipeline.generate(&config) {
                Ok(g) => g,
                Err(e) => {
                    print_json(&failure(e));
                    return ExitCode::from(2);
                }
            };

            let Some(out) = out else {
                print!("{}", generated.script);
                return ExitCode::SUCCESS;
            };

            if let Err(e) = fs::write(&out, &generated.script) {
                tracing::error!(path = %out.display(), error = %e, "failed to write script");
                print_json(&failure(format!("Failed to write {}: {}", out.display(), e)));
                return ExitCode::FAILURE;
            }
            tracing::info!(path = %out.display(), "script written");

            generated.script = String::new();
            print_json(&serde_json::json!({
                "success": true,
                "scriptPath": out,
                "manifest": generated,
            }));
            ExitCode::SUCCESS
        }
    }
}
