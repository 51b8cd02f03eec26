// Save document model
// Version-dispatched extraction of typed views (player, storage) from a raw
// save, and re-injection of edited views into it.

pub mod error;
pub mod item;
pub mod layout;
pub mod player;
pub mod stash;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::codec::{Map, Value};

pub use error::{ModelError, ViewError};
pub use item::{FireMode, GeneratedState, Item, ItemKind, WeaponState};
pub use layout::{SaveLayout, LAYOUT_0_31_PRODUCTION};
pub use player::{Player, Stats};
pub use stash::{Chest, Stash};

/// Registry with every version this crate knows how to read.
pub static DEFAULT_REGISTRY: Lazy<SaveDataRegistry> = Lazy::new(SaveDataRegistry::with_builtin);

/// Reads and writes the typed views of saves of particular versions.
pub trait SaveVersionStrategy: Send + Sync {
    /// `save_version` strings handled by this strategy.
    fn versions(&self) -> Vec<&str>;

    fn get_player(&self, save: &Value) -> Result<Player, ModelError>;

    fn set_player(&self, save: &mut Value, player: &Player) -> Result<(), ModelError>;

    fn get_storage(&self, save: &Value) -> Result<Stash, ModelError>;

    fn set_storage(&self, save: &mut Value, stash: &Stash) -> Result<(), ModelError>;
}

/// Strategy driven by fixed key paths.
#[derive(Debug, Clone, Copy)]
pub struct LayoutStrategy {
    layout: &'static SaveLayout,
}

impl LayoutStrategy {
    pub fn new(layout: &'static SaveLayout) -> Self {
        Self { layout }
    }

    fn mapping<'a>(&self, save: &'a Value, path: &[&str]) -> Result<&'a Map, ModelError> {
        save.pointer(path)
            .and_then(Value::as_object)
            .ok_or_else(|| missing(path))
    }

    fn mapping_mut<'a>(
        &self,
        save: &'a mut Value,
        path: &[&str],
    ) -> Result<&'a mut Map, ModelError> {
        save.pointer_mut(path)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| missing(path))
    }
}

fn missing(path: &[&str]) -> ModelError {
    ModelError::MissingPath {
        path: path.join("."),
    }
}

impl SaveVersionStrategy for LayoutStrategy {
    fn versions(&self) -> Vec<&str> {
        vec![self.layout.version]
    }

    fn get_player(&self, save: &Value) -> Result<Player, ModelError> {
        let stats = Stats::from_map(self.mapping(save, self.layout.player_stats)?)?;
        let inventory = self.mapping(save, self.layout.inventory)?;
        let items = inventory
            .get(self.layout.inventory_items_key)
            .ok_or_else(|| ViewError::MissingField {
                field: self.layout.inventory_items_key.to_string(),
            })?;
        Ok(Player {
            stats,
            inventory: item::items_from_value(items)?,
        })
    }

    fn set_player(&self, save: &mut Value, player: &Player) -> Result<(), ModelError> {
        // Both targets are checked before either is touched.
        self.mapping(save, self.layout.player_stats)?;
        self.mapping(save, self.layout.inventory)?;

        player
            .stats
            .write_into(self.mapping_mut(save, self.layout.player_stats)?);
        self.mapping_mut(save, self.layout.inventory)?.insert(
            self.layout.inventory_items_key,
            item::items_to_value(&player.inventory),
        );
        log::debug!(
            "Wrote player stats and {} inventory item(s)",
            player.inventory.len()
        );
        Ok(())
    }

    fn get_storage(&self, save: &Value) -> Result<Stash, ModelError> {
        let storage = self.mapping(save, self.layout.storage)?;
        let mut chests = Vec::new();
        for index in 0..self.layout.chest_count {
            if let Some(items) = storage.get(&SaveLayout::chest_key(index)) {
                chests.push(Chest {
                    index,
                    items: item::items_from_value(items)?,
                });
            }
        }
        Ok(Stash { chests })
    }

    fn set_storage(&self, save: &mut Value, stash: &Stash) -> Result<(), ModelError> {
        let count = self.layout.chest_count;
        if let Some(chest) = stash.chests.iter().find(|chest| chest.index >= count) {
            return Err(ModelError::ChestOutOfRange {
                index: chest.index,
                count,
            });
        }

        let storage = self.mapping_mut(save, self.layout.storage)?;
        for chest in &stash.chests {
            storage.insert(
                SaveLayout::chest_key(chest.index),
                item::items_to_value(&chest.items),
            );
        }
        log::debug!("Wrote {} storage chest(s)", stash.chests.len());
        Ok(())
    }
}

/// Maps `save_version` strings to strategies. New versions are added with
/// [`SaveDataRegistry::register`].
#[derive(Clone, Default)]
pub struct SaveDataRegistry {
    strategies: HashMap<String, Arc<dyn SaveVersionStrategy>>,
}

impl SaveDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LayoutStrategy::new(&LAYOUT_0_31_PRODUCTION)));
        registry
    }

    /// Registers `strategy` for each version it reports, replacing any
    /// earlier registration of the same version.
    pub fn register(&mut self, strategy: Arc<dyn SaveVersionStrategy>) {
        for version in strategy.versions() {
            self.strategies
                .insert(version.to_string(), Arc::clone(&strategy));
        }
    }

    pub fn supported_versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        versions.sort_unstable();
        versions
    }

    pub fn resolve(&self, save: &Value) -> Result<Arc<dyn SaveVersionStrategy>, ModelError> {
        let version = match save.get("save_version") {
            Some(Value::String(version)) => version,
            Some(other) => {
                return Err(ModelError::InvalidSave {
                    reason: format!("`save_version` is a {}", other.value_type()),
                })
            }
            None => {
                return Err(ModelError::InvalidSave {
                    reason: "no `save_version` field".to_string(),
                })
            }
        };

        self.strategies
            .get(version)
            .cloned()
            .ok_or_else(|| ModelError::UnsupportedVersion {
                version: version.clone(),
            })
    }
}

/// The typed views of one save plus the strategy that produced them.
pub struct SaveData {
    strategy: Arc<dyn SaveVersionStrategy>,
    pub player: Player,
    pub storage: Stash,
}

impl SaveData {
    pub fn new(save: &Value) -> Result<Self, ModelError> {
        Self::with_registry(&DEFAULT_REGISTRY, save)
    }

    pub fn with_registry(registry: &SaveDataRegistry, save: &Value) -> Result<Self, ModelError> {
        let strategy = registry.resolve(save)?;
        let player = strategy.get_player(save)?;
        let storage = strategy.get_storage(save)?;
        Ok(Self {
            strategy,
            player,
            storage,
        })
    }

    pub fn set_player(&self, save: &mut Value) -> Result<(), ModelError> {
        self.strategy.set_player(save, &self.player)
    }

    pub fn set_storage(&self, save: &mut Value) -> Result<(), ModelError> {
        self.strategy.set_storage(save, &self.storage)
    }

    /// Writes both the player and the storage back into `save`.
    pub fn apply(&self, save: &mut Value) -> Result<(), ModelError> {
        self.set_player(save)?;
        self.set_storage(save)
    }
}
