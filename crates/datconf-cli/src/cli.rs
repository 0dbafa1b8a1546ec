//! datconf CLI - resolve and inspect cluster configuration
//!
//! Usage:
//!   datconf resolve --dir ./cluster
//!   datconf vars --format json
//!   datconf check
//!   datconf components

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use datconf_core::document::{self, Document, DEFAULT_PATTERN};
use datconf_core::pipeline::VariablePass;
use datconf_core::values::{self, DEFAULT_VALUES_FILE};
use datconf_core::{
    global_registry, ComponentConfig, ComponentFactory, ComponentRegistry, Pipeline,
    PipelineFailure, PipelineOptions, Resolution,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// datconf - Declarative cluster configuration
#[derive(Parser)]
#[command(name = "datconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the configuration files
    #[arg(short = 'C', long = "dir", default_value = ".", global = true)]
    dir: PathBuf,

    /// Glob pattern selecting configuration files inside --dir
    #[arg(long, default_value = DEFAULT_PATTERN, global = true)]
    pattern: String,

    /// Values file with variable overrides, relative to --dir
    #[arg(long, default_value = DEFAULT_VALUES_FILE, global = true)]
    values: PathBuf,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the cluster and all components
    Resolve {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Resolve variables only and print their values
    Vars {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Quick syntax check of every configuration file and the values file
    Check,

    /// List the registered component types
    Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = PipelineOptions::new(&cli.dir)
        .with_pattern(&cli.pattern)
        .with_values_file(&cli.values);

    match cli.command {
        Commands::Resolve { format } => cmd_resolve(options, format),
        Commands::Vars { format } => cmd_vars(options, format),
        Commands::Check => cmd_check(&options),
        Commands::Components => cmd_components(),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // Keep whichever subscriber was installed first.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .try_init();
}

fn pipeline(options: PipelineOptions) -> Pipeline {
    Pipeline::new(options, global_registry())
}

fn cmd_resolve(options: PipelineOptions, format: Format) -> ExitCode {
    match pipeline(options).run() {
        Ok(resolution) => match format {
            Format::Text => {
                print!("{}", render_resolution(&resolution));
                ExitCode::SUCCESS
            }
            _ => print_structured(&resolution.summary(), format),
        },
        Err(failure) => report_failure(&failure),
    }
}

fn cmd_vars(options: PipelineOptions, format: Format) -> ExitCode {
    match pipeline(options).run_variables() {
        Ok(pass) => match format {
            Format::Text => {
                print!("{}", render_variables(&pass));
                ExitCode::SUCCESS
            }
            _ => print_structured(&pass.variables, format),
        },
        Err(failure) => report_failure(&failure),
    }
}

fn cmd_check(options: &PipelineOptions) -> ExitCode {
    let files = match document::discover(&options.base_dir, &options.pattern) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(2);
        }
    };

    if files.is_empty() {
        eprintln!(
            "{} no files matching '{}' in {}",
            "✗".red(),
            options.pattern,
            options.base_dir.display()
        );
        return ExitCode::from(1);
    }

    let mut all_valid = true;
    for file in &files {
        match Document::load(file) {
            Ok(_) => println!("{} {}: valid HCL", "✓".green(), file.display()),
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                all_valid = false;
            }
        }
    }

    let values_path = options.values_path();
    if values_path.is_file() && !check_values_file(&values_path) {
        all_valid = false;
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Load the values file the way a resolution pass does and report problems
fn check_values_file(path: &Path) -> bool {
    let outcome = values::load_values(path);
    if outcome.is_ok() {
        println!("{} {}: valid values file", "✓".green(), path.display());
        return true;
    }
    for error in &outcome.diagnostics {
        eprintln!("{} {}", "✗".red(), error);
    }
    false
}

fn cmd_components() -> ExitCode {
    print!("{}", render_components(&global_registry()));
    ExitCode::SUCCESS
}

fn report_failure(failure: &PipelineFailure) -> ExitCode {
    eprintln!(
        "{} {} failed with {} error(s)\n",
        "✗".red(),
        failure.stage,
        failure.diagnostics.len()
    );
    for error in &failure.diagnostics {
        eprintln!("{}\n", error);
    }
    ExitCode::from(1)
}

fn print_structured<T: Serialize>(value: &T, format: Format) -> ExitCode {
    let rendered = match format {
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(s) => {
            print!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(2)
        }
    }
}

fn render_resolution(resolution: &Resolution) -> String {
    let mut out = String::from("Files:\n");
    for file in &resolution.files {
        out.push_str(&format!("  {}\n", file.display()));
    }

    out.push_str(&format!("\nCluster \"{}\"\n", resolution.cluster.name));
    for line in resolution.cluster.config.describe().lines() {
        out.push_str(&format!("  {}\n", line));
    }

    if !resolution.components.is_empty() {
        out.push_str("\nComponents:\n");
        for component in &resolution.components {
            out.push_str(&format!("  {}\n", component.describe()));
        }
    }
    out
}

fn render_components(registry: &ComponentRegistry) -> String {
    let mut out = String::new();
    for name in registry.type_names() {
        out.push_str(&format!("{}\n", name));
        let Some(factory) = registry.get(name) else {
            continue;
        };
        let shape = factory.shape();
        let required = shape.required();
        if !required.is_empty() {
            out.push_str(&format!("  required: {}\n", required.join(", ")));
        }
        let optional = shape.optional();
        if !optional.is_empty() {
            out.push_str(&format!("  optional: {}\n", optional.join(", ")));
        }
    }
    out
}

fn render_variables(pass: &VariablePass) -> String {
    let mut out = String::new();
    for (name, value) in &pass.variables {
        let marker = if pass.overrides.contains_key(name) {
            " (from values file)"
        } else {
            ""
        };
        out.push_str(&format!("{} = {}{}\n", name, value, marker));
    }
    out
}
