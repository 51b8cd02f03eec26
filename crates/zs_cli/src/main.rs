//! zero-saver CLI
//!
//! Inspect, verify and edit a ZERO Sievert save file. Every edit goes
//! through validation and a verified backup before the save is replaced.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use zs_core::codec::{self, Decimal};
use zs_core::golden::ValidationStrategy;
use zs_core::{SaveData, SaverConfig};

#[derive(Parser, Debug)]
#[command(name = "zero-saver")]
#[command(about = "Inspect and edit ZERO Sievert save files", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Save file to use instead of the configured one
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Backup directory to use instead of the configured one
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the save against the golden file for its version
    Verify {
        /// typed or structural
        #[arg(long)]
        strategy: Option<ValidationStrategy>,
    },

    /// Print the player stats and inventory as JSON
    ShowPlayer,

    /// Print the storage chests as JSON
    ShowStorage,

    /// Set one player stat and write the save
    SetStat {
        /// Stat name, e.g. hp or thirst
        field: String,

        /// New value, e.g. 80.0
        value: String,
    },

    /// Back up the save file without changing it
    Backup {
        /// Disambiguator for the backup file name (default: random UUID)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Decode and re-encode the save and compare the bytes
    CheckRoundtrip,
}

fn load_config(cli: &Cli) -> Result<SaverConfig> {
    let mut config = match &cli.config {
        Some(path) => SaverConfig::from_yaml_file(path)?,
        None => SaverConfig::default(),
    };
    if let Some(save) = &cli.save {
        config.save_path = Some(save.clone());
    }
    if let Some(backup_dir) = &cli.backup_dir {
        config.backup_dir = Some(backup_dir.clone());
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    if let Commands::Verify {
        strategy: Some(strategy),
    } = &cli.command
    {
        config.validation = *strategy;
    }
    let manager = config.save_manager()?;
    log::debug!("Using save file {:?}", manager.save_path());

    match cli.command {
        Commands::Verify { .. } => {
            let mut save = manager.load()?;
            manager.verify(&mut save)?;
            println!(
                "✅ {} passed {} validation",
                manager.save_path().display(),
                manager.validator_name()
            );
        }

        Commands::ShowPlayer => {
            let data = SaveData::new(&manager.load()?)?;
            println!("{}", serde_json::to_string_pretty(&data.player)?);
        }

        Commands::ShowStorage => {
            let data = SaveData::new(&manager.load()?)?;
            println!("{}", serde_json::to_string_pretty(&data.storage)?);
        }

        Commands::SetStat { field, value } => {
            let value: Decimal = value
                .parse()
                .with_context(|| format!("Invalid value for `{field}`"))?;
            if !value.is_finite() {
                bail!("`{field}` must be a finite number");
            }

            let mut save = manager.load()?;
            let mut data = SaveData::new(&save)?;
            let previous = data.player.stats.get(&field).cloned();
            data.player.stats.set(&field, value)?;
            data.set_player(&mut save)?;
            manager.write(&mut save)?;

            let stored = data.player.stats.get(&field);
            match (previous, stored) {
                (Some(previous), Some(stored)) => {
                    println!("✅ {field}: {previous} -> {stored}")
                }
                (_, Some(stored)) => println!("✅ {field}: {stored}"),
                _ => println!("✅ {field} updated"),
            }
        }

        Commands::Backup { tag } => {
            let path = manager.backup(tag.as_deref())?;
            println!("📦 Backup written to {}", path.display());
        }

        Commands::CheckRoundtrip => {
            let bytes = fs::read(manager.save_path())
                .with_context(|| format!("Failed to read {}", manager.save_path().display()))?;
            let save = codec::from_slice(&bytes, config.read_options())?;
            let encoded = codec::to_string(&save);
            if encoded.as_bytes() != bytes.as_slice() {
                bail!(
                    "❌ Re-encoded save differs from {} ({} vs {} bytes)",
                    manager.save_path().display(),
                    encoded.len(),
                    bytes.len()
                );
            }
            println!("✅ Round trip is byte-identical ({} bytes)", bytes.len());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}
