// Structural golden file check (legacy strategy).
// Compares the save's shape against a bundled example save after emptying
// the inventory and storage chests, whose contents vary per player.

use crate::codec::{self, Value};
use crate::compare::compare;
use crate::model::layout::SaveLayout;

use super::{
    key_structure_name, save_version, GoldenError, GoldenStore, SaveValidator, ValidationReport,
};

pub struct StructuralValidator {
    store: GoldenStore,
}

impl StructuralValidator {
    pub fn new(store: GoldenStore) -> Self {
        Self { store }
    }
}

impl SaveValidator for StructuralValidator {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn validate(&self, save: &mut Value) -> Result<(), GoldenError> {
        let version = save_version(save)?.to_string();
        let name = key_structure_name(&version);
        let text = self.store.load(&name)?;
        let mut golden = codec::from_str(&text).map_err(|err| GoldenError::Malformed {
            name: name.clone(),
            reason: err.to_string(),
        })?;

        let matches = match SaveLayout::for_version(&version) {
            Some(layout) => {
                clear_player_content(&mut golden, layout);
                let normalized = NormalizedSave::new(save, layout)?;
                compare(normalized.get(), &golden)?
            }
            None => compare(save, &golden)?,
        };

        log::debug!("Structural check of {version:?} against {name}: {matches}");
        if matches {
            Ok(())
        } else {
            Err(GoldenError::Mismatch(ValidationReport::single(
                "",
                format!("structure differs from {name}"),
            )))
        }
    }
}

fn clear_player_content(doc: &mut Value, layout: &SaveLayout) {
    if let Some(inventory) = doc.pointer_mut(layout.inventory).and_then(Value::as_object_mut) {
        inventory.insert(layout.inventory_items_key, Value::Array(Vec::new()));
    }
    if let Some(storage) = doc.pointer_mut(layout.storage).and_then(Value::as_object_mut) {
        for key in layout.chest_keys() {
            storage.insert(key, Value::Array(Vec::new()));
        }
    }
}

/// A save whose inventory items and storage chests are temporarily empty.
///
/// The original contents come back when the guard is dropped, including
/// while unwinding from a panic. Chests that did not exist before are
/// removed again.
pub struct NormalizedSave<'a> {
    save: &'a mut Value,
    layout: &'a SaveLayout,
    inventory_items: Option<Value>,
    chests: Vec<(String, Option<Value>)>,
}

impl<'a> NormalizedSave<'a> {
    pub fn new(save: &'a mut Value, layout: &'a SaveLayout) -> Result<Self, GoldenError> {
        for path in [layout.inventory, layout.storage] {
            if save.pointer(path).and_then(Value::as_object).is_none() {
                return Err(missing_mapping(path));
            }
        }

        let inventory = save
            .pointer_mut(layout.inventory)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| missing_mapping(layout.inventory))?;
        let inventory_items =
            inventory.insert(layout.inventory_items_key, Value::Array(Vec::new()));

        let mut chests = Vec::with_capacity(layout.chest_count);
        if let Some(storage) = save
            .pointer_mut(layout.storage)
            .and_then(Value::as_object_mut)
        {
            for key in layout.chest_keys() {
                let previous = storage.insert(key.clone(), Value::Array(Vec::new()));
                chests.push((key, previous));
            }
        }

        Ok(Self {
            save,
            layout,
            inventory_items,
            chests,
        })
    }

    pub fn get(&self) -> &Value {
        &*self.save
    }
}

impl Drop for NormalizedSave<'_> {
    fn drop(&mut self) {
        let layout = self.layout;

        if let Some(inventory) = self
            .save
            .pointer_mut(layout.inventory)
            .and_then(Value::as_object_mut)
        {
            match self.inventory_items.take() {
                Some(items) => {
                    inventory.insert(layout.inventory_items_key, items);
                }
                None => {
                    inventory.remove(layout.inventory_items_key);
                }
            }
        }

        if let Some(storage) = self
            .save
            .pointer_mut(layout.storage)
            .and_then(Value::as_object_mut)
        {
            for (key, previous) in self.chests.drain(..) {
                match previous {
                    Some(items) => {
                        storage.insert(key, items);
                    }
                    None => {
                        storage.remove(&key);
                    }
                }
            }
        }
    }
}

fn missing_mapping(path: &[&str]) -> GoldenError {
    GoldenError::Mismatch(ValidationReport::single(
        path.join("."),
        "expected a mapping",
    ))
}
