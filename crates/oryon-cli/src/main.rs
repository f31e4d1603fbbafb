//! Oryon - module package manager
//!
//! Usage:
//!   oryon install <MODULE>...   # Fetch modules and register them
//!   oryon fetch <MODULE>...     # Fetch modules into the addons directory
//!
//! A module is a local directory, an http(s) URL to a `.tar.gz` archive, or a
//! registry name with an optional `@version`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oryon_core::config::{ConfigStore, OryonConfig};
use oryon_core::manager::PackageManager;
use oryon_core::manifest::ModuleManifest;

#[derive(Parser)]
#[command(name = "oryon")]
#[command(about = "Oryon module package manager", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch modules and register them with the application
    #[command(alias = "i")]
    Install(ModuleArgs),

    /// Fetch modules into the addons directory without registering them
    Fetch(ModuleArgs),
}

#[derive(Args)]
struct ModuleArgs {
    /// Modules to process, in order
    ///
    /// - ./path/to/module: local directory containing manifest.json
    /// - https://host/module.tar.gz: remote archive
    /// - name or name@version: registry lookup (defaults to latest)
    #[arg(required = true, value_name = "MODULE")]
    modules: Vec<String>,

    /// Overwrite modules that are already installed
    #[arg(short, long)]
    force: bool,

    /// Config file to use instead of ~/.oryon.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oryon=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install(args) => run_modules(args, true),
        Commands::Fetch(args) => run_modules(args, false),
    };

    if let Err(err) = result {
        eprintln!("{} {:#}", style("✗").red().bold(), err);
        std::process::exit(1);
    }
}

fn load_config(args: &ModuleArgs) -> Result<OryonConfig> {
    let store = match &args.config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::discover()?,
    };
    tracing::debug!(path = %store.config_path().display(), "loading config");

    let mut config = store.load()?;
    if args.force {
        config.force = true;
    }
    Ok(config)
}

fn run_modules(args: ModuleArgs, register: bool) -> Result<()> {
    let config = load_config(&args)?;
    let manager = PackageManager::new(config.fetch_options())?;

    for module in &args.modules {
        if register {
            let manifest = manager.install(module, &print_installed)?;
            tracing::debug!(module = %manifest.name, "registered module");
        } else {
            let manifest = manager.fetch(module).map_err(|e| {
                anyhow::Error::new(e).context(format!("Failed to fetch module '{}'", module))
            })?;
            print_fetched(&manifest);
        }
    }

    Ok(())
}

fn print_fetched(manifest: &ModuleManifest) {
    println!(
        "{} Fetched {} {}",
        style("✓").green(),
        style(&manifest.name).bold(),
        style(&manifest.version).dim()
    );
    if let Some(path) = manifest.install_path() {
        println!("  {}", path.display());
    }
}

fn print_installed(manifest: &ModuleManifest) -> Result<()> {
    println!(
        "{} Installed {} {}",
        style("✓").green(),
        style(&manifest.name).bold(),
        style(&manifest.version).dim()
    );
    if let Some(path) = manifest.install_path() {
        println!("  {}", path.display());
    }

    let dependencies = manifest.dependencies();
    if !dependencies.is_empty() {
        let names: Vec<String> = dependencies.iter().map(|d| d.to_string()).collect();
        println!("  Depends on: {}", names.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn install_requires_a_module() {
        assert!(Cli::try_parse_from(["oryon", "install"]).is_err());
    }

    #[test]
    fn install_parses_flags_and_modules() {
        let cli =
            Cli::try_parse_from(["oryon", "install", "-f", "./local", "foo@v0.0.1"]).unwrap();

        match cli.command {
            Commands::Install(args) => {
                assert!(args.force);
                assert_eq!(args.modules, vec!["./local", "foo@v0.0.1"]);
                assert!(args.config.is_none());
            }
            Commands::Fetch(_) => panic!("expected install"),
        }
    }

    #[test]
    fn fetch_accepts_config_file() {
        let cli = Cli::try_parse_from(["oryon", "fetch", "-c", "/tmp/o.toml", "foo"]).unwrap();

        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.config, Some(PathBuf::from("/tmp/o.toml")));
                assert!(!args.force);
            }
            Commands::Install(_) => panic!("expected fetch"),
        }
    }
}
