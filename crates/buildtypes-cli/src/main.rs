mod commands;

use buildtypes_schema::{BuildTypesLoader, BUILDS_FILE_NAME};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "buildtypes",
    version,
    about = "Validate and inspect build type declarations"
)]
struct Cli {
    /// Path to the build types document (YAML, JSON or TOML).
    #[arg(long, short, default_value = BUILDS_FILE_NAME, global = true)]
    file: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate the document and report every failure.
    Check,
    /// Print the normalized document.
    Show {
        /// Only print this build type.
        #[arg(long)]
        build_type: Option<String>,
    },
    /// List declared build types.
    List,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BUILDTYPES_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let loader = BuildTypesLoader::new(&cli.file);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check => commands::check::run(&loader, json_output),
        Commands::Show { build_type } => {
            commands::show::run(&loader, build_type.as_deref(), json_output)
        }
        Commands::List => commands::list::run(&loader, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("Validation of")
                || msg.starts_with("failed to parse")
                || msg.starts_with("failed to read")
            {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
