use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::{ConfigLoader, Environment, PortageConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "portenv",
    about = "Show the effective package manager configuration",
    version,
    author
)]
struct Cli {
    /// Configuration root
    #[arg(long, global = true, env = "PORTAGE_CONFIGROOT", default_value = "/")]
    config_root: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print variables as shell assignments
    Vars {
        /// Only these variables
        names: Vec<String>,

        /// Show where each value came from
        #[arg(long)]
        sources: bool,
    },

    /// List repositories
    Repos,

    /// List masked packages
    Masks,

    /// List applied profiles in order
    Profiles,

    /// Dump the whole configuration
    Dump {
        #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Json,
    Toml,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = Environment::capture();

    let filter = match cli.verbose {
        0 if cli.quiet || env.quiet() => "error",
        0 if env.debug() => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match ConfigLoader::new(&cli.config_root)
        .with_environment(env)
        .load()
    {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Commands::Vars {
        names: Vec::new(),
        sources: false,
    });

    match run(&config, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &PortageConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Vars { names, sources } => cmd_vars(config, &names, sources),
        Commands::Repos => {
            let main = config.main_repo().map(|r| r.name.as_str());
            for repo in config.repos().iter() {
                let marker = if Some(repo.name.as_str()) == main { "*" } else { " " };
                println!(
                    "{} {} {} ({})",
                    marker,
                    repo.name,
                    repo.location.display(),
                    repo.source
                );
            }
            Ok(())
        }
        Commands::Masks => {
            for (id, source) in config.masks().iter() {
                println!("{}  # {}", id, source);
            }
            Ok(())
        }
        Commands::Profiles => {
            for profile in config.profiles() {
                println!("{}", profile.display());
            }
            Ok(())
        }
        Commands::Dump { format } => {
            let out = match format {
                DumpFormat::Json => serde_json::to_string_pretty(config)
                    .context("Failed to serialize configuration as JSON")?,
                DumpFormat::Toml => toml::to_string(config)
                    .context("Failed to serialize configuration as TOML")?,
            };
            println!("{}", out);
            Ok(())
        }
    }
}

fn cmd_vars(config: &PortageConfig, names: &[String], sources: bool) -> Result<()> {
    let vars: Vec<_> = if names.is_empty() {
        config.vars().iter().collect()
    } else {
        names
            .iter()
            .map(|name| config.require(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    for var in vars {
        if sources {
            println!("{}  # {}", assignment(var.name(), &var.render()), var.provenance());
        } else {
            println!("{}", assignment(var.name(), &var.render()));
        }
    }
    Ok(())
}

/// Render `NAME="value"` so the shell reads back exactly `value`
fn assignment(name: &str, value: &str) -> String {
    let mut out = String::with_capacity(name.len() + value.len() + 3);
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
