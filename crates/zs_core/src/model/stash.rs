use serde::Serialize;

use super::item::Item;

/// One storage container, `chest_<index>` in the save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chest {
    pub index: usize,
    pub items: Vec<Item>,
}

/// The player's storage chests that exist in the save.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stash {
    pub chests: Vec<Chest>,
}

impl Stash {
    pub fn chest(&self, index: usize) -> Option<&Chest> {
        self.chests.iter().find(|chest| chest.index == index)
    }

    pub fn chest_mut(&mut self, index: usize) -> Option<&mut Chest> {
        self.chests.iter_mut().find(|chest| chest.index == index)
    }

    pub fn item_count(&self) -> usize {
        self.chests.iter().map(|chest| chest.items.len()).sum()
    }
}
