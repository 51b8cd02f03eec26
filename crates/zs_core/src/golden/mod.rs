// Golden file validation
// Checks a decoded save against the reference bundled for its game version,
// either by comparing shapes with an example save or by checking a typed
// schema.

pub mod structural;
pub mod typed;

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{Value, ValueType};
use crate::compare::CompareError;

pub use structural::{NormalizedSave, StructuralValidator};
pub use typed::{TypedSchema, TypedSchemaValidator};

const BUNDLED: &[(&str, &str)] = &[
    (
        "key_structure_0.31_production.json",
        include_str!("../../golden/key_structure_0.31_production.json"),
    ),
    (
        "typed_schema_0_31_production.json",
        include_str!("../../golden/typed_schema_0_31_production.json"),
    ),
];

#[derive(Error, Debug)]
pub enum GoldenError {
    #[error("Save is missing the `save_version` field")]
    MissingVersion,

    #[error("`save_version` must be a string, found {found}")]
    VersionNotString { found: ValueType },

    #[error("No golden file named {name}")]
    NotFound { name: String },

    #[error("Failed to read golden file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Golden file {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },

    #[error("Save does not match the golden file: {0}")]
    Mismatch(ValidationReport),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl GoldenError {
    /// Failures to obtain the reference itself, as opposed to problems with
    /// the save being checked.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            GoldenError::NotFound { .. } | GoldenError::Io { .. } | GoldenError::Malformed { .. }
        )
    }
}

/// One place where a save departs from its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 5;
        let count = self.violations.len();
        write!(f, "{count} problem(s)")?;
        for violation in self.violations.iter().take(SHOWN) {
            write!(f, "; {violation}")?;
        }
        if count > SHOWN {
            write!(f, "; ...")?;
        }
        Ok(())
    }
}

/// The `save_version` string of a save.
pub fn save_version(save: &Value) -> Result<&str, GoldenError> {
    let version = save.get("save_version").ok_or(GoldenError::MissingVersion)?;
    version.as_str().ok_or(GoldenError::VersionNotString {
        found: version.value_type(),
    })
}

/// File name of the example save used for structural comparison.
pub fn key_structure_name(version: &str) -> String {
    format!("key_structure_{}.json", version.replace(' ', "_"))
}

/// File name of the typed schema.
pub fn typed_schema_name(version: &str) -> String {
    format!("typed_schema_{}.json", version.replace(['.', ' '], "_"))
}

/// Where golden files are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GoldenStore {
    /// Files compiled into the library.
    #[default]
    Bundled,
    /// Files read from a directory at validation time.
    Directory(PathBuf),
}

impl GoldenStore {
    pub fn load(&self, name: &str) -> Result<Cow<'static, str>, GoldenError> {
        match self {
            GoldenStore::Bundled => BUNDLED
                .iter()
                .find(|(bundled, _)| *bundled == name)
                .map(|(_, text)| Cow::Borrowed(*text))
                .ok_or_else(|| GoldenError::NotFound {
                    name: name.to_string(),
                }),
            GoldenStore::Directory(dir) => {
                let path = dir.join(name);
                match std::fs::read_to_string(&path) {
                    Ok(text) => Ok(Cow::Owned(text)),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        Err(GoldenError::NotFound {
                            name: name.to_string(),
                        })
                    }
                    Err(source) => Err(GoldenError::Io { path, source }),
                }
            }
        }
    }
}

/// A way of checking a save against its golden file.
///
/// Takes the save mutably so an implementation may normalize it in place;
/// the save must be back in its original state when `validate` returns.
pub trait SaveValidator {
    fn name(&self) -> &'static str;

    fn validate(&self, save: &mut Value) -> Result<(), GoldenError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStrategy {
    #[default]
    Typed,
    Structural,
}

impl ValidationStrategy {
    pub fn validator(self, store: GoldenStore) -> Box<dyn SaveValidator> {
        match self {
            ValidationStrategy::Typed => Box::new(TypedSchemaValidator::new(store)),
            ValidationStrategy::Structural => Box::new(StructuralValidator::new(store)),
        }
    }
}

impl std::str::FromStr for ValidationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typed" => Ok(ValidationStrategy::Typed),
            "structural" => Ok(ValidationStrategy::Structural),
            other => Err(format!("unknown validation strategy: {other}")),
        }
    }
}
