//! # zs_core - ZERO Sievert save file editing core
//!
//! Reads a ZERO Sievert save file without losing a single digit, checks it
//! against the reference layout for its game version, exposes the player and
//! storage as typed views, and writes edits back through a
//! validate, back up, atomically replace pipeline.
//!
//! ## Features
//! - Decimal-preserving codec: `5.0` stays `5.0`, `1.5e-05` stays `1.5e-05`
//! - Golden file validation (typed schema or structural comparison)
//! - Verified SHA-256 backups with a retention ceiling
//! - Crash-safe temp-file-and-rename writes

pub mod codec;
pub mod compare;
pub mod config;
pub mod golden;
pub mod io;
pub mod model;

pub use codec::{Decimal, Map, ReadOptions, Value, ValueType};
pub use compare::{compare, CompareError};
pub use config::{ConfigError, SaverConfig};
pub use golden::{GoldenError, GoldenStore, SaveValidator, ValidationReport, ValidationStrategy};
pub use io::{BackupError, BackupManager, SaveError, SaveManager};
pub use model::{
    Item, ModelError, Player, SaveData, SaveDataRegistry, SaveVersionStrategy, Stash, Stats,
    ViewError,
};

/// Version of this library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
