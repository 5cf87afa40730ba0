//! Manifest sets: aggregation, validation, and prune-label injection
//!
//! A [`ManifestSet`] collects the Kubernetes object documents that one
//! logical deployment unit applies together. [`ManifestSet::prepare`] turns
//! the set into the exact payload the applier receives: when pruning is
//! enabled the derived label is injected into every document's
//! `metadata.labels`, when it is disabled the documents pass through
//! untouched. Document order is preserved throughout, since `kubectl`
//! applies documents within one invocation in the order given.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::prune::prune_label;
use crate::{yaml, Error, Result};

/// Cluster-level defaults inherited by manifest sets that do not set the
/// corresponding option themselves
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDefaults {
    /// Whether manifest sets are prune-tracked unless they opt out
    pub prune: bool,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self { prune: true }
    }
}

/// An ordered set of Kubernetes object documents applied together under one
/// logical identifier
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSet {
    /// Stable identifier of this set within the calling application
    /// (e.g. `"MyStack/MyManifest"`); uniqueness is the caller's contract
    pub id: String,
    /// The object documents, in apply order
    #[serde(default)]
    pub documents: Vec<Value>,
    /// Per-set pruning override; `None` inherits the cluster default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune: Option<bool>,
    /// Tell the applier to overwrite resources that already exist
    /// (apply semantics) instead of failing on conflict (create semantics)
    #[serde(default)]
    pub overwrite: bool,
    /// Tell the applier to skip schema validation (`--validate=false`)
    #[serde(default)]
    pub skip_validation: bool,
}

impl ManifestSet {
    /// Create an empty manifest set with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            documents: Vec::new(),
            prune: None,
            overwrite: false,
            skip_validation: false,
        }
    }

    /// Create a manifest set by parsing multi-document YAML
    pub fn from_yaml(id: impl Into<String>, input: &str) -> Result<Self> {
        Ok(Self::new(id).with_documents(yaml::parse_documents(input)?))
    }

    /// Append one document to the set
    pub fn with_document(mut self, document: Value) -> Self {
        self.documents.push(document);
        self
    }

    /// Append documents to the set, preserving their order
    pub fn with_documents(mut self, documents: impl IntoIterator<Item = Value>) -> Self {
        self.documents.extend(documents);
        self
    }

    /// Override the cluster-level pruning default for this set
    pub fn with_prune(mut self, enabled: bool) -> Self {
        self.prune = Some(enabled);
        self
    }

    /// Request overwrite (apply) semantics from the applier
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Request that the applier skip schema validation
    pub fn with_skip_validation(mut self, enabled: bool) -> Self {
        self.skip_validation = enabled;
        self
    }

    /// Number of documents in the set
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the set contains no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Produce the payload handed to the applier.
    ///
    /// When pruning resolves to enabled (per-set override, else cluster
    /// default), the prune label is derived once from the set identifier and
    /// injected into every document. Every document must then carry a
    /// `metadata` mapping; a document without one cannot be applied at all,
    /// so this fails fast naming the offending position instead of
    /// fabricating metadata. A pre-existing label under the derived key is
    /// overwritten, which is intentional: the key is namespaced to be
    /// collision-resistant with user labels.
    ///
    /// When pruning resolves to disabled, the output documents are
    /// deep-equal to the input and no label key is reported.
    pub fn prepare(&self, defaults: &ClusterDefaults) -> Result<PreparedManifests> {
        let prune_enabled = self.prune.unwrap_or(defaults.prune);

        if !prune_enabled {
            debug!(
                set = %self.id,
                documents = self.documents.len(),
                "pruning disabled, passing documents through unmodified"
            );
            return Ok(PreparedManifests {
                documents: self.documents.clone(),
                prune_label: None,
                overwrite: self.overwrite,
                skip_validation: self.skip_validation,
            });
        }

        let label = prune_label(&self.id);
        let mut documents = self.documents.clone();
        for (position, document) in documents.iter_mut().enumerate() {
            inject_prune_label(document, &label, position)?;
        }

        info!(
            set = %self.id,
            documents = documents.len(),
            label = %label,
            "prune label injected"
        );

        Ok(PreparedManifests {
            documents,
            prune_label: Some(label),
            overwrite: self.overwrite,
            skip_validation: self.skip_validation,
        })
    }
}

/// The exact payload handed to the applier: the final document list plus the
/// flags the external executor needs to build its invocation
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreparedManifests {
    /// Final document list, in apply order
    pub documents: Vec<Value>,
    /// Prune label key for `--prune -l <key>=`, present iff pruning was
    /// enabled for the set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune_label: Option<String>,
    /// Overwrite (apply vs create) semantics, passed through unchanged
    #[serde(default)]
    pub overwrite: bool,
    /// Skip schema validation, passed through unchanged
    #[serde(default)]
    pub skip_validation: bool,
}

impl PreparedManifests {
    /// Render the documents as a `---`-separated stream suitable for
    /// `kubectl apply -f <file>` (JSON is valid YAML, so each document is
    /// emitted as pretty-printed JSON under its own separator)
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        for document in &self.documents {
            let text = serde_json::to_string_pretty(document)
                .map_err(|e| Error::serialization(e.to_string()))?;
            out.push_str("---\n");
            out.push_str(&text);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Set `metadata.labels[key] = ""` on one document, creating the labels
/// mapping when absent
fn inject_prune_label(document: &mut Value, key: &str, position: usize) -> Result<()> {
    let object = document.as_object_mut().ok_or_else(|| {
        Error::manifest(format!("document {} is not a mapping", position))
    })?;

    let kind = object
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let metadata = object.get_mut("metadata").ok_or_else(|| {
        Error::manifest(format!(
            "document {} ({}) has no metadata; an object without metadata.name cannot be applied",
            position, kind
        ))
    })?;
    let metadata = metadata.as_object_mut().ok_or_else(|| {
        Error::manifest(format!(
            "document {} ({}): metadata is not a mapping",
            position, kind
        ))
    })?;

    let labels = metadata
        .entry("labels")
        .or_insert_with(|| Value::Object(Map::new()));
    let labels = labels.as_object_mut().ok_or_else(|| {
        Error::manifest(format!(
            "document {} ({}): metadata.labels is not a mapping",
            position, kind
        ))
    })?;

    labels.insert(key.to_string(), Value::String(String::new()));
    Ok(())
}
