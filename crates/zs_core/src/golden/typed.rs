// Typed schema check (current strategy).
//
// A schema file is JSON of the form
//
//   { "version": "...", "definitions": { name: node, ... }, "root": node }
//
// where a node is either a scalar kind string (`"decimal"`,
// `"string|decimal|null"`, `"any"`) or one of
//
//   { "type": "record", "fields": { key: node }, "optional": [key, ...] }
//   { "type": "list", "items": node }
//   { "type": "map", "values": node }
//   { "type": "one_of", "options": [node, ...] }
//   { "type": "ref", "name": definition }
//
// Kinds must match exactly. Keys a record does not declare are ignored.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::codec::{Value, ValueType};

use super::{
    save_version, typed_schema_name, GoldenError, GoldenStore, SaveValidator, ValidationReport,
    Violation,
};

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    version: String,
    #[serde(default)]
    definitions: HashMap<String, NodeSpec>,
    root: NodeSpec,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeSpec {
    Scalar(String),
    Composite(CompositeSpec),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CompositeSpec {
    Record {
        fields: BTreeMap<String, NodeSpec>,
        #[serde(default)]
        optional: Vec<String>,
    },
    List {
        items: Box<NodeSpec>,
    },
    Map {
        values: Box<NodeSpec>,
    },
    OneOf {
        options: Vec<NodeSpec>,
    },
    Ref {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Any,
    Scalar(Vec<ValueType>),
    Record(Vec<Field>),
    List(Box<Node>),
    Map(Box<Node>),
    OneOf(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    optional: bool,
    node: Node,
}

/// A compiled typed schema for one save version.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSchema {
    version: String,
    root: Node,
}

impl TypedSchema {
    /// Parses and compiles a schema document, inlining every `ref`.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let doc: SchemaDocument = serde_json::from_str(text).map_err(|err| err.to_string())?;
        let mut resolving = Vec::new();
        let root = compile(&doc.root, &doc.definitions, &mut resolving)?;
        Ok(Self {
            version: doc.version,
            root,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Every place where `value` departs from the schema.
    pub fn check(&self, value: &Value) -> Vec<Violation> {
        let mut path = Vec::new();
        let mut violations = Vec::new();
        check_node(&self.root, value, &mut path, &mut violations);
        violations
    }
}

fn scalar_kind(name: &str) -> Result<ValueType, String> {
    match name {
        "null" => Ok(ValueType::Null),
        "bool" => Ok(ValueType::Bool),
        "integer" => Ok(ValueType::Integer),
        "decimal" => Ok(ValueType::Decimal),
        "string" => Ok(ValueType::String),
        other => Err(format!("unknown scalar kind {other:?}")),
    }
}

fn compile(
    spec: &NodeSpec,
    definitions: &HashMap<String, NodeSpec>,
    resolving: &mut Vec<String>,
) -> Result<Node, String> {
    let composite = match spec {
        NodeSpec::Scalar(kinds) if kinds.trim() == "any" => return Ok(Node::Any),
        NodeSpec::Scalar(kinds) => {
            let kinds = kinds
                .split('|')
                .map(|kind| scalar_kind(kind.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Node::Scalar(kinds));
        }
        NodeSpec::Composite(composite) => composite,
    };

    match composite {
        CompositeSpec::Record { fields, optional } => {
            if let Some(unknown) = optional.iter().find(|key| !fields.contains_key(*key)) {
                return Err(format!("optional key {unknown:?} is not a field"));
            }
            let fields = fields
                .iter()
                .map(|(name, node)| {
                    Ok(Field {
                        name: name.clone(),
                        optional: optional.contains(name),
                        node: compile(node, definitions, resolving)?,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            Ok(Node::Record(fields))
        }
        CompositeSpec::List { items } => Ok(Node::List(Box::new(compile(
            items,
            definitions,
            resolving,
        )?))),
        CompositeSpec::Map { values } => Ok(Node::Map(Box::new(compile(
            values,
            definitions,
            resolving,
        )?))),
        CompositeSpec::OneOf { options } => {
            if options.is_empty() {
                return Err("one_of needs at least one option".to_string());
            }
            let options = options
                .iter()
                .map(|option| compile(option, definitions, resolving))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::OneOf(options))
        }
        CompositeSpec::Ref { name } => {
            if resolving.contains(name) {
                return Err(format!("definition {name:?} refers to itself"));
            }
            let target = definitions
                .get(name)
                .ok_or_else(|| format!("unknown definition {name:?}"))?;
            resolving.push(name.clone());
            let node = compile(target, definitions, resolving);
            resolving.pop();
            node
        }
    }
}

fn render_path(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if segment.starts_with('[') || out.is_empty() {
            out.push_str(segment);
        } else {
            out.push('.');
            out.push_str(segment);
        }
    }
    out
}

fn describe(node: &Node) -> String {
    match node {
        Node::Any => "any".to_string(),
        Node::Scalar(kinds) => kinds
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(" or "),
        Node::Record(_) | Node::Map(_) => "mapping".to_string(),
        Node::List(_) => "sequence".to_string(),
        Node::OneOf(options) => options.iter().map(describe).collect::<Vec<_>>().join(" or "),
    }
}

fn check_node(node: &Node, value: &Value, path: &mut Vec<String>, out: &mut Vec<Violation>) {
    let mismatch = |path: &[String], out: &mut Vec<Violation>| {
        out.push(Violation {
            path: render_path(path),
            message: format!("expected {}, found {}", describe(node), value.value_type()),
        });
    };

    match node {
        Node::Any => {}
        Node::Scalar(kinds) => {
            if !kinds.contains(&value.value_type()) {
                mismatch(path, out);
            }
        }
        Node::Record(fields) => {
            let Some(map) = value.as_object() else {
                mismatch(path, out);
                return;
            };
            for field in fields {
                path.push(field.name.clone());
                match map.get(&field.name) {
                    Some(child) => check_node(&field.node, child, path, out),
                    None if field.optional => {}
                    None => out.push(Violation {
                        path: render_path(path),
                        message: "missing required field".to_string(),
                    }),
                }
                path.pop();
            }
        }
        Node::List(items) => {
            let Some(elements) = value.as_array() else {
                mismatch(path, out);
                return;
            };
            for (idx, element) in elements.iter().enumerate() {
                path.push(format!("[{idx}]"));
                check_node(items, element, path, out);
                path.pop();
            }
        }
        Node::Map(values) => {
            let Some(map) = value.as_object() else {
                mismatch(path, out);
                return;
            };
            for (key, child) in map.iter() {
                path.push(key.to_string());
                check_node(values, child, path, out);
                path.pop();
            }
        }
        Node::OneOf(options) => {
            let matched = options.iter().any(|option| {
                let mut scratch = Vec::new();
                check_node(option, value, path, &mut scratch);
                scratch.is_empty()
            });
            if !matched {
                mismatch(path, out);
            }
        }
    }
}

pub struct TypedSchemaValidator {
    store: GoldenStore,
}

impl TypedSchemaValidator {
    pub fn new(store: GoldenStore) -> Self {
        Self { store }
    }

    /// Loads the schema registered for `version`.
    pub fn schema_for(&self, version: &str) -> Result<TypedSchema, GoldenError> {
        let name = typed_schema_name(version);
        let text = self.store.load(&name)?;
        let schema = TypedSchema::from_json(&text).map_err(|reason| GoldenError::Malformed {
            name: name.clone(),
            reason,
        })?;
        if schema.version() != version {
            return Err(GoldenError::Malformed {
                reason: format!("declares version {:?}", schema.version()),
                name,
            });
        }
        Ok(schema)
    }
}

impl SaveValidator for TypedSchemaValidator {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn validate(&self, save: &mut Value) -> Result<(), GoldenError> {
        let version = save_version(save)?.to_string();
        let schema = self.schema_for(&version)?;
        let violations = schema.check(save);

        log::debug!(
            "Typed schema check of {version:?}: {} violation(s)",
            violations.len()
        );
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GoldenError::Mismatch(ValidationReport { violations }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::from_str;

    const SCHEMA: &str = r#"{
        "version": "test",
        "definitions": {
            "item": { "type": "record", "fields": { "item": "string", "quantity": "decimal", "mods": "null" }, "optional": ["mods"] }
        },
        "root": {
            "type": "record",
            "fields": {
                "save_version": "string",
                "items": { "type": "list", "items": { "type": "ref", "name": "item" } },
                "extra": { "type": "map", "values": "string|decimal" },
                "any": "any",
                "either": { "type": "one_of", "options": ["string", { "type": "list", "items": "decimal" }] }
            }
        }
    }"#;

    fn schema() -> TypedSchema {
        TypedSchema::from_json(SCHEMA).unwrap()
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = from_str(
            r#"{"save_version": "test", "items": [{"item": "bolt", "quantity": 1.0}],
                "extra": {"a": "x", "b": 2.0}, "any": [null], "either": [1.0], "ignored": true}"#,
        )
        .unwrap();
        assert_eq!(schema().check(&doc), vec![]);
    }

    #[test]
    fn test_reports_paths_of_every_violation() {
        let doc = from_str(
            r#"{"save_version": 31, "items": [{"item": "bolt", "quantity": "1.0"}, {"quantity": 2.0}],
                "extra": {"a": null}, "any": 1, "either": {}}"#,
        )
        .unwrap();
        let paths: Vec<String> = schema().check(&doc).into_iter().map(|v| v.path).collect();
        assert_eq!(
            paths,
            vec![
                "either",
                "extra.a",
                "items[0].quantity",
                "items[1].item",
                "save_version",
            ]
        );
    }

    #[test]
    fn test_no_coercion_between_numeric_kinds() {
        let doc = from_str(
            r#"{"save_version": "test", "items": [{"item": "bolt", "quantity": 1}],
                "extra": {}, "any": 1, "either": "x"}"#,
        )
        .unwrap();
        let violations = schema().check(&doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "items[0].quantity");
        assert_eq!(violations[0].message, "expected decimal, found integer");
    }

    #[test]
    fn test_rejects_broken_schemas() {
        assert!(TypedSchema::from_json(r#"{"version": "x", "root": "float"}"#).is_err());
        assert!(TypedSchema::from_json(
            r#"{"version": "x", "root": {"type": "ref", "name": "missing"}}"#
        )
        .is_err());
        assert!(TypedSchema::from_json(
            r#"{"version": "x", "definitions": {"a": {"type": "ref", "name": "a"}}, "root": {"type": "ref", "name": "a"}}"#
        )
        .is_err());
        assert!(TypedSchema::from_json(
            r#"{"version": "x", "root": {"type": "record", "fields": {}, "optional": ["ghost"]}}"#
        )
        .is_err());
    }

    #[test]
    fn test_bundled_schema_compiles() {
        let validator = TypedSchemaValidator::new(GoldenStore::Bundled);
        let schema = validator.schema_for("0.31 production").unwrap();
        assert_eq!(schema.version(), "0.31 production");
    }
}
