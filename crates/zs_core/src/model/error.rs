use thiserror::Error;

use crate::codec::ValueType;

/// A typed view field that could not be read from the save.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Missing field `{field}`")]
    MissingField { field: String },

    #[error("Field `{field}` must be a decimal, found {found}")]
    NotDecimal { field: String, found: ValueType },

    #[error("Field `{field}` must be a string, found {found}")]
    NotString { field: String, found: ValueType },

    #[error("Expected an item mapping, found {found}")]
    NotAnItem { found: ValueType },

    #[error("Expected a list of items, found {found}")]
    NotAnItemList { found: ValueType },

    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: String },

    #[error("Invalid ammo quantity: {value}")]
    InvalidAmmoQuantity { value: String },

    #[error("Invalid weapon fire mode: {value}")]
    InvalidFireMode { value: String },

    #[error("Unknown player stat `{field}`")]
    UnknownStat { field: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid save: {reason}")]
    InvalidSave { reason: String },

    #[error("Unsupported save version: {version}")]
    UnsupportedVersion { version: String },

    #[error("Save has no mapping at {path}")]
    MissingPath { path: String },

    #[error("Chest index {index} is out of range (0..{count})")]
    ChestOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    View(#[from] ViewError),
}
