//! Trellis - prune-tracked Kubernetes manifest sets for EKS-style deployments
//!
//! Trellis models the definition-time half of a manifest deployment pipeline:
//! callers group Kubernetes object documents into ordered [`ManifestSet`]s,
//! trellis derives a deterministic prune label from the set's logical
//! identifier and injects it into every document, and the labeled payload is
//! handed to an applier that runs `kubectl apply --prune -l <label>=` (or
//! `helm upgrade --install` for charts) against the target cluster.
//!
//! The prune label is what lets a later apply of the same set delete objects
//! that were present in an earlier version but are no longer declared.
//!
//! # Modules
//!
//! - [`manifest`] - Manifest sets: aggregation, validation, label injection
//! - [`prune`] - Deterministic prune-label derivation
//! - [`helm`] - Helm chart deployment options
//! - [`applier`] - Applier contract and the process-spawning reference applier
//! - [`yaml`] - Multi-document YAML parsing into untyped JSON values
//! - [`error`] - Error types

#![deny(missing_docs)]

use std::time::Duration;

pub mod applier;
pub mod error;
pub mod helm;
pub mod manifest;
pub mod prune;
pub mod yaml;

pub use applier::{Applier, ClusterConnection, ExecApplier};
pub use error::Error;
pub use helm::HelmChart;
pub use manifest::{ClusterDefaults, ManifestSet, PreparedManifests};
pub use prune::prune_label;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Wire-format constants
// =============================================================================
// The prune label key is matched by the downstream executor purely as a
// string, so the prefix and token length are part of the external contract
// and must not change between releases.

/// Prefix of every derived prune label key
pub const PRUNE_LABEL_PREFIX: &str = "aws.cdk.eks/prune-";

/// Length of the derived token appended to [`PRUNE_LABEL_PREFIX`]
pub const PRUNE_TOKEN_LEN: usize = 42;

/// Maximum length of a Helm release name (Helm rejects longer names)
pub const HELM_RELEASE_NAME_MAX: usize = 53;

/// Upper bound for a Helm install/upgrade timeout
///
/// The executor runs inside a bounded invocation window, so charts may not
/// wait longer than this.
pub const HELM_MAX_TIMEOUT: Duration = Duration::from_secs(15 * 60);
