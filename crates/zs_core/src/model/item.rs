// Item records found in the inventory, storage chests and trader stock.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::codec::{Decimal, Map, Value};

use super::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    Automatic,
    SemiAutomatic,
    BoltAction,
}

impl FireMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FireMode::Automatic => "automatic",
            FireMode::SemiAutomatic => "semi_automatic",
            FireMode::BoltAction => "bolt_action",
        }
    }
}

impl fmt::Display for FireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FireMode {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(FireMode::Automatic),
            "semi_automatic" => Ok(FireMode::SemiAutomatic),
            "bolt_action" => Ok(FireMode::BoltAction),
            other => Err(ViewError::InvalidFireMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Fields of items that were generated as loot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedState {
    pub seen: Decimal,
    pub durability: Decimal,
    pub created_from_player: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponState {
    pub ammo_id: String,
    pub ammo_quantity: i64,
    #[serde(rename = "weapon_fire_mode")]
    pub fire_mode: FireMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Basic,
    Generated,
    Weapon,
}

/// One item record.
///
/// Fields the view does not model (`min_level`, `page`, `mods`, ...) are
/// carried along untouched and written back in their original position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    #[serde(rename = "item")]
    pub name: String,
    pub x: Decimal,
    pub y: Decimal,
    pub quantity: i64,
    pub rotation: Decimal,
    #[serde(flatten)]
    pub generated: Option<GeneratedState>,
    #[serde(flatten)]
    pub weapon: Option<WeaponState>,
    #[serde(skip)]
    raw: Map,
}

fn required<'a>(map: &'a Map, field: &str) -> Result<&'a Value, ViewError> {
    map.get(field).ok_or_else(|| ViewError::MissingField {
        field: field.to_string(),
    })
}

pub(crate) fn decimal_field(map: &Map, field: &str) -> Result<Decimal, ViewError> {
    let value = required(map, field)?;
    value
        .as_decimal()
        .cloned()
        .ok_or_else(|| ViewError::NotDecimal {
            field: field.to_string(),
            found: value.value_type(),
        })
}

fn string_field(map: &Map, field: &str) -> Result<String, ViewError> {
    let value = required(map, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ViewError::NotString {
            field: field.to_string(),
            found: value.value_type(),
        })
}

/// Whole-number reading of a count field: `3.0`, `3` and `"3"` are all 3.
fn count_of(value: &Value) -> Option<i64> {
    match value {
        Value::Decimal(d) | Value::Integer(d) => d.to_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => crate::codec::to_string(other),
    }
}

/// Writes a count back, keeping the original text when the number is
/// unchanged and using the `n.0` form otherwise.
fn write_count(map: &mut Map, field: &str, count: i64) {
    if map.get(field).and_then(count_of) != Some(count) {
        map.insert(field, Value::Decimal(Decimal::from_whole(count)));
    }
}

impl Item {
    /// A new basic item at the top-left slot, unrotated.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            x: Decimal::from_whole(0),
            y: Decimal::from_whole(0),
            quantity,
            rotation: Decimal::from_whole(0),
            generated: None,
            weapon: None,
            raw: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, ViewError> {
        let map = value.as_object().ok_or(ViewError::NotAnItem {
            found: value.value_type(),
        })?;

        let quantity_value = required(map, "quantity")?;
        let quantity = count_of(quantity_value).ok_or_else(|| ViewError::InvalidQuantity {
            value: describe(quantity_value),
        })?;

        let generated = if map.contains_key("durability") {
            Some(GeneratedState {
                seen: decimal_field(map, "seen")?,
                durability: decimal_field(map, "durability")?,
                created_from_player: decimal_field(map, "created_from_player")?,
            })
        } else {
            None
        };

        let weapon = if map.contains_key("ammo_id") {
            let ammo_value = required(map, "ammo_quantity")?;
            let ammo_quantity =
                count_of(ammo_value).ok_or_else(|| ViewError::InvalidAmmoQuantity {
                    value: describe(ammo_value),
                })?;
            Some(WeaponState {
                ammo_id: string_field(map, "ammo_id")?,
                ammo_quantity,
                fire_mode: string_field(map, "weapon_fire_mode")?.parse()?,
            })
        } else {
            None
        };

        Ok(Self {
            name: string_field(map, "item")?,
            x: decimal_field(map, "x")?,
            y: decimal_field(map, "y")?,
            quantity,
            rotation: decimal_field(map, "rotation")?,
            generated,
            weapon,
            raw: map.clone(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.raw.clone();
        map.insert("item", Value::String(self.name.clone()));
        map.insert("x", Value::Decimal(self.x.clone()));
        map.insert("y", Value::Decimal(self.y.clone()));
        write_count(&mut map, "quantity", self.quantity);
        map.insert("rotation", Value::Decimal(self.rotation.clone()));

        if let Some(generated) = &self.generated {
            map.insert("seen", Value::Decimal(generated.seen.clone()));
            map.insert("durability", Value::Decimal(generated.durability.clone()));
            map.insert(
                "created_from_player",
                Value::Decimal(generated.created_from_player.clone()),
            );
        }
        if let Some(weapon) = &self.weapon {
            map.insert("ammo_id", Value::String(weapon.ammo_id.clone()));
            write_count(&mut map, "ammo_quantity", weapon.ammo_quantity);
            map.insert(
                "weapon_fire_mode",
                Value::String(weapon.fire_mode.as_str().to_string()),
            );
        }
        Value::Object(map)
    }

    pub fn kind(&self) -> ItemKind {
        if self.weapon.is_some() {
            ItemKind::Weapon
        } else if self.generated.is_some() {
            ItemKind::Generated
        } else {
            ItemKind::Basic
        }
    }

    pub fn is_rotated(&self) -> bool {
        !self.rotation.is_zero()
    }

    /// A field the view does not model, as read from the save.
    pub fn extra(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }
}

pub fn items_from_value(value: &Value) -> Result<Vec<Item>, ViewError> {
    let items = value.as_array().ok_or(ViewError::NotAnItemList {
        found: value.value_type(),
    })?;
    items.iter().map(Item::from_value).collect()
}

pub fn items_to_value(items: &[Item]) -> Value {
    Value::Array(items.iter().map(Item::to_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_str, to_string};

    const BREAD: &str = r#"{ "x": 3.0, "rotation": 1.0, "y": 2.0, "durability": 100.0, "seen": 1.0, "created_from_player": 0.0, "item": "bread", "quantity": 2.0 }"#;
    const RIFLE: &str = r#"{ "x": 0.0, "rotation": 0.0, "y": 0.0, "durability": 91.50799999999999, "seen": 1.0, "created_from_player": 0.0, "item": "ak74", "quantity": 1.0, "ammo_id": "545x39", "ammo_quantity": 30.0, "weapon_fire_mode": "automatic", "mods": { "scope": "red_dot" } }"#;

    fn item(text: &str) -> Result<Item, ViewError> {
        Item::from_value(&from_str(text).unwrap())
    }

    #[test]
    fn test_generated_item() {
        let bread = item(BREAD).unwrap();
        assert_eq!(bread.name, "bread");
        assert_eq!(bread.quantity, 2);
        assert_eq!(bread.kind(), ItemKind::Generated);
        assert!(bread.is_rotated());
        assert_eq!(
            bread.generated.as_ref().map(|g| g.durability.to_string()),
            Some("100.0".to_string())
        );
    }

    #[test]
    fn test_weapon_item() {
        let rifle = item(RIFLE).unwrap();
        assert_eq!(rifle.kind(), ItemKind::Weapon);
        let weapon = rifle.weapon.as_ref().unwrap();
        assert_eq!(weapon.ammo_id, "545x39");
        assert_eq!(weapon.ammo_quantity, 30);
        assert_eq!(weapon.fire_mode, FireMode::Automatic);
        assert!(rifle.extra("mods").is_some());
    }

    #[test]
    fn test_unchanged_item_writes_back_identically() {
        for text in [BREAD, RIFLE] {
            let parsed = item(text).unwrap();
            assert_eq!(to_string(&parsed.to_value()), text);
        }
    }

    #[test]
    fn test_changed_quantity_uses_float_family() {
        let mut bread = item(BREAD).unwrap();
        bread.quantity = 5;
        let value = bread.to_value();
        assert_eq!(
            value.get("quantity"),
            Some(&Value::Decimal("5.0".parse().unwrap()))
        );
        let keys: Vec<_> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys[7], "quantity");
    }

    #[test]
    fn test_name_is_written_as_item_key() {
        let value = Item::new("bolt", 12).to_value();
        assert_eq!(value.get("item"), Some(&Value::from("bolt")));
        assert!(value.get("name").is_none());
        assert_eq!(
            serde_json::to_value(Item::new("bolt", 12)).unwrap()["item"],
            "bolt"
        );
    }

    #[test]
    fn test_rejects_fractional_quantity() {
        let err = item(r#"{"item": "bolt", "x": 0.0, "y": 0.0, "rotation": 0.0, "quantity": 2.5}"#)
            .unwrap_err();
        assert_eq!(
            err,
            ViewError::InvalidQuantity {
                value: "2.5".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_non_numeric_quantity() {
        let err = item(r#"{"item": "bolt", "x": 0.0, "y": 0.0, "rotation": 0.0, "quantity": "abc"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            ViewError::InvalidQuantity {
                value: "abc".to_string()
            }
        );
        let ok = item(r#"{"item": "bolt", "x": 0.0, "y": 0.0, "rotation": 0.0, "quantity": "12"}"#)
            .unwrap();
        assert_eq!(ok.quantity, 12);
    }

    #[test]
    fn test_rejects_bad_weapon_fields() {
        let bad_mode = RIFLE.replace("\"automatic\"", "\"burst\"");
        assert_eq!(
            item(&bad_mode).unwrap_err(),
            ViewError::InvalidFireMode {
                value: "burst".to_string()
            }
        );

        let bad_ammo = RIFLE.replace("30.0", "30.5");
        assert!(matches!(
            item(&bad_ammo).unwrap_err(),
            ViewError::InvalidAmmoQuantity { .. }
        ));
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        assert_eq!(
            item(r#"{"item": "bolt", "quantity": 1.0}"#).unwrap_err(),
            ViewError::MissingField {
                field: "x".to_string()
            }
        );
        assert!(matches!(
            item(r#"{"item": "bolt", "x": "0", "y": 0.0, "rotation": 0.0, "quantity": 1.0}"#)
                .unwrap_err(),
            ViewError::NotDecimal { .. }
        ));
        assert!(matches!(
            Item::from_value(&Value::Null).unwrap_err(),
            ViewError::NotAnItem { .. }
        ));
    }
}
