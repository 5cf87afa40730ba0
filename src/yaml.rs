//! Multi-document YAML parsing into untyped JSON values
//!
//! Manifest sets are usually authored as `---`-separated YAML. This module
//! parses that input with yaml-rust2 and converts each document to a
//! `serde_json::Value`, which is the representation the rest of the crate
//! (and the downstream executor payload) works with. Empty documents are
//! skipped, matching how `kubectl` treats blank sections between separators.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::{Error, Result};

/// Parse a (possibly multi-document) YAML string into JSON values.
///
/// Documents that are empty or parse to null are dropped; everything else is
/// returned in input order. Returns an empty Vec for empty input.
pub fn parse_documents(input: &str) -> Result<Vec<Value>> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::yaml(e.to_string()))?;
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let value = to_json(doc)?;
        if !value.is_null() {
            out.push(value);
        }
    }
    Ok(out)
}

/// Convert a yaml-rust2 node into a serde_json::Value
fn to_json(node: Yaml) -> Result<Value> {
    match node {
        Yaml::Null | Yaml::BadValue => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(raw) => {
            let f: f64 = raw
                .parse()
                .map_err(|e| Error::yaml(format!("invalid float {:?}: {}", raw, e)))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(items) => {
            let mut arr = Vec::with_capacity(items.len());
            for item in items {
                arr.push(to_json(item)?);
            }
            Ok(Value::Array(arr))
        }
        Yaml::Hash(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key_string(key)?, to_json(value)?);
            }
            Ok(Value::Object(map))
        }
        Yaml::Alias(_) => Err(Error::yaml("YAML aliases are not supported")),
    }
}

/// Render a mapping key as a string (Kubernetes metadata keys are strings,
/// but YAML allows scalar keys of any type)
fn key_string(key: Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::yaml(format!("unsupported mapping key: {:?}", other))),
    }
}
