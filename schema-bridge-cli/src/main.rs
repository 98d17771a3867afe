//! # schema-bridge
//!
//! Command-line front end for schema-driven wire/native conversion.
//!
//! ## Usage
//!
//! ```bash
//! # Show structs, functions and enums of a schema document
//! schema-bridge inspect --schema schema.json
//!
//! # Convert a wire value (JSON) to its native form
//! echo '["NeedsFixup", "Foo", 2]' | schema-bridge to-native --type NeedsFixup
//!
//! # Convert a native value (JSON) back to wire form
//! schema-bridge to-wire --type NeedsFixup --input record.json
//!
//! # Print the zero-argument record of a struct
//! schema-bridge defaults --struct DefaultMap
//!
//! # Name native records under another namespace
//! schema-bridge to-native --type NeedsFixup --target-namespace app --input wire.json
//!
//! # Initialize configuration
//! schema-bridge init
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use schema_bridge_cli::{
    commands::{self, Inspection},
    config::{CliArgs, Config, ConfigManager},
    error::CliError,
};

#[derive(Parser)]
#[command(name = "schema-bridge")]
#[command(author, version, about = "Convert values between wire and native form", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Namespace of native record type names
    #[arg(long, global = true)]
    target_namespace: Option<String>,

    /// Emit a debug event for every converted struct
    #[arg(long, global = true)]
    debug_logging: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bridge and describe its structs, functions and enums
    Inspect {
        /// Schema document path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Only show these structs
        #[arg(short, long = "root")]
        roots: Vec<String>,
    },

    /// Convert a JSON-encoded wire value to native form
    ToNative {
        /// Schema document path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Type of the value (name or JSON type expression)
        #[arg(short = 't', long = "type")]
        type_expr: String,

        /// Input file; stdin when absent or '-'
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Convert a JSON-encoded native value to wire form
    ToWire {
        /// Schema document path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Type of the value (name or JSON type expression)
        #[arg(short = 't', long = "type")]
        type_expr: String,

        /// Input file; stdin when absent or '-'
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the zero-argument record of a struct
    Defaults {
        /// Schema document path
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Struct name
        #[arg(long = "struct")]
        struct_name: String,
    },

    /// Initialize a new schema-bridge configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "schema-bridge.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
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
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config;
    let target_namespace = cli.target_namespace;
    let debug_logging = cli.debug_logging.then_some(true);
    let load = |schema: Option<PathBuf>, compact: bool| -> Result<Config, CliError> {
        let config = ConfigManager::load(config_path.as_deref())?;
        Ok(ConfigManager::merge_cli_args(
            config,
            &CliArgs {
                schema,
                target_namespace: target_namespace.clone(),
                debug_logging,
                pretty: compact.then_some(false),
            },
        ))
    };

    match cli.command {
        Commands::Inspect { schema, roots } => cmd_inspect(&load(schema, false)?, &roots),

        Commands::ToNative {
            schema,
            type_expr,
            input,
            compact,
        } => cmd_convert(&load(schema, compact)?, &type_expr, input, commands::to_native),

        Commands::ToWire {
            schema,
            type_expr,
            input,
            compact,
        } => cmd_convert(&load(schema, compact)?, &type_expr, input, commands::to_wire),

        Commands::Defaults {
            schema,
            struct_name,
        } => cmd_defaults(&load(schema, false)?, &struct_name),

        Commands::Init { output, force } => cmd_init(output, force),
    }
}

/// Inspect command implementation.
fn cmd_inspect(config: &Config, roots: &[String]) -> Result<(), CliError> {
    let bridge = commands::load_bridge(config)?;
    let inspection = commands::inspect(&bridge, roots)?;
    print_inspection(&inspection);
    Ok(())
}

type ConvertFn = fn(&schema_bridge::Bridge, &schema_bridge::TypeSpec, &serde_json::Value) -> Result<serde_json::Value, CliError>;

/// Shared body of to-native and to-wire.
fn cmd_convert(config: &Config, type_expr: &str, input: Option<PathBuf>, convert: ConvertFn) -> Result<(), CliError> {
    let bridge = commands::load_bridge(config)?;
    let spec = commands::parse_type(type_expr, &bridge)?;
    let value = commands::read_input(input.as_deref())?;
    let output = convert(&bridge, &spec, &value)?;
    println!("{}", commands::render(&output, config.output.pretty)?);
    Ok(())
}

/// Defaults command implementation.
fn cmd_defaults(config: &Config, struct_name: &str) -> Result<(), CliError> {
    let bridge = commands::load_bridge(config)?;
    let record = commands::defaults(&bridge, struct_name)?;
    println!("{}", commands::render(&record, config.output.pretty)?);
    Ok(())
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        println!(
            "{} Configuration file already exists: {}",
            "Error:".red(),
            output.display()
        );
        println!("  Use --force to overwrite");
        return Err(CliError::Validation(
            "Configuration file already exists".to_string(),
        ));
    }

    let content = ConfigManager::default_config_content();
    std::fs::write(&output, content)?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

fn print_inspection(inspection: &Inspection) {
    println!("{}", "Structs".cyan().bold());
    for st in &inspection.structs {
        if st.name == st.native_name {
            println!("  {}", st.name.green());
        } else {
            println!("  {} {} {}", st.name.green(), "->".dimmed(), st.native_name);
        }
        for field in &st.fields {
            let required = if field.required { " (required)" } else { "" };
            match &field.default {
                Some(default) => println!(
                    "    {:>3}: {} {}{} = {}",
                    field.id,
                    field.name,
                    field.spec.yellow(),
                    required,
                    default
                ),
                None => println!("    {:>3}: {} {}{}", field.id, field.name, field.spec.yellow(), required),
            }
        }
    }

    if !inspection.functions.is_empty() {
        println!("{}", "Functions".cyan().bold());
        for function in &inspection.functions {
            let args: Vec<String> = function
                .args
                .iter()
                .map(|(name, spec)| format!("{name}: {spec}"))
                .collect();
            println!(
                "  {}({}) -> {}",
                function.name.green(),
                args.join(", "),
                function.reply.yellow()
            );
        }
    }

    if !inspection.enums.is_empty() {
        println!("{}", "Enums".cyan().bold());
        for e in &inspection.enums {
            let values: Vec<String> = e
                .values
                .iter()
                .map(|(symbol, value)| format!("{symbol}={value}"))
                .collect();
            println!("  {} {{{}}}", e.name.green(), values.join(", "));
        }
    }
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
