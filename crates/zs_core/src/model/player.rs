use serde::Serialize;

use crate::codec::{Decimal, Map, Value};

use super::error::ViewError;
use super::item::{decimal_field, Item};

/// Player condition as stored under `data.pre_raid.player`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub hp_max: Decimal,
    pub stamina_max: Decimal,
    pub x: Decimal,
    pub y: Decimal,
    pub wound: Decimal,
    pub hp: Decimal,
    pub energy: Decimal,
    pub radiation: Decimal,
    pub fatigue: Decimal,
    pub thirst: Decimal,
}

impl Stats {
    pub const FIELDS: [&'static str; 10] = [
        "hp_max",
        "stamina_max",
        "x",
        "y",
        "wound",
        "hp",
        "energy",
        "radiation",
        "fatigue",
        "thirst",
    ];

    pub fn from_map(map: &Map) -> Result<Self, ViewError> {
        Ok(Self {
            hp_max: decimal_field(map, "hp_max")?,
            stamina_max: decimal_field(map, "stamina_max")?,
            x: decimal_field(map, "x")?,
            y: decimal_field(map, "y")?,
            wound: decimal_field(map, "wound")?,
            hp: decimal_field(map, "hp")?,
            energy: decimal_field(map, "energy")?,
            radiation: decimal_field(map, "radiation")?,
            fatigue: decimal_field(map, "fatigue")?,
            thirst: decimal_field(map, "thirst")?,
        })
    }

    /// Updates each stat in place; other keys in `map` are left alone.
    pub fn write_into(&self, map: &mut Map) {
        for field in Self::FIELDS {
            if let Some(value) = self.get(field) {
                map.insert(field, Value::Decimal(value.clone()));
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Decimal> {
        let value = match field {
            "hp_max" => &self.hp_max,
            "stamina_max" => &self.stamina_max,
            "x" => &self.x,
            "y" => &self.y,
            "wound" => &self.wound,
            "hp" => &self.hp,
            "energy" => &self.energy,
            "radiation" => &self.radiation,
            "fatigue" => &self.fatigue,
            "thirst" => &self.thirst,
            _ => return None,
        };
        Some(value)
    }

    /// Sets one stat. A whole number given without a fraction (`80`) is
    /// stored as `80.0` so it stays a decimal in the save.
    pub fn set(&mut self, field: &str, value: Decimal) -> Result<(), ViewError> {
        let slot = match field {
            "hp_max" => &mut self.hp_max,
            "stamina_max" => &mut self.stamina_max,
            "x" => &mut self.x,
            "y" => &mut self.y,
            "wound" => &mut self.wound,
            "hp" => &mut self.hp,
            "energy" => &mut self.energy,
            "radiation" => &mut self.radiation,
            "fatigue" => &mut self.fatigue,
            "thirst" => &mut self.thirst,
            _ => {
                return Err(ViewError::UnknownStat {
                    field: field.to_string(),
                })
            }
        };
        *slot = value.float_family();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub stats: Stats,
    pub inventory: Vec<Item>,
}
