// Where the player-owned sub-trees live for each supported save version.

/// Key paths of the variable, per-player parts of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveLayout {
    pub version: &'static str,
    pub player_stats: &'static [&'static str],
    /// Mapping that holds the inventory items list.
    pub inventory: &'static [&'static str],
    pub inventory_items_key: &'static str,
    /// Mapping that holds the `chest_N` lists.
    pub storage: &'static [&'static str],
    pub chest_count: usize,
}

pub const LAYOUT_0_31_PRODUCTION: SaveLayout = SaveLayout {
    version: "0.31 production",
    player_stats: &["data", "pre_raid", "player"],
    inventory: &["data", "pre_raid", "Inventory"],
    inventory_items_key: "items",
    storage: &["data", "chest"],
    chest_count: 14,
};

const LAYOUTS: &[&SaveLayout] = &[&LAYOUT_0_31_PRODUCTION];

impl SaveLayout {
    pub fn for_version(version: &str) -> Option<&'static SaveLayout> {
        LAYOUTS.iter().copied().find(|layout| layout.version == version)
    }

    pub fn chest_key(index: usize) -> String {
        format!("chest_{index}")
    }

    pub fn chest_keys(&self) -> impl Iterator<Item = String> {
        (0..self.chest_count).map(Self::chest_key)
    }
}
