//! Applier contract and the process-spawning reference applier
//!
//! The applier is the hand-off point between definition time and the target
//! cluster: it receives a [`PreparedManifests`] payload (or [`HelmChart`]
//! options) and is responsible for the actual `kubectl`/`helm` execution.
//! Trellis owns no retry policy of its own; executor failures are surfaced
//! as errors, never swallowed.
//!
//! [`ExecApplier`] is the reference implementation. It stages the documents
//! in a tempfile and spawns the commands with a timeout. Alternative
//! executors (a remote custom-resource runtime, a recording stub in tests)
//! implement [`Applier`] instead.

pub mod command;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::helm::HelmChart;
use crate::manifest::PreparedManifests;
use crate::{Error, Result};

/// Default upper bound for one kubectl/helm invocation
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Extra slack granted on top of a chart's own `--timeout` so helm gets to
/// report the failure itself instead of being killed mid-flight
const HELM_TIMEOUT_SLACK: Duration = Duration::from_secs(60);

/// Connection info for the target cluster, passed to the spawned commands
#[derive(Clone, Debug, Default)]
pub struct ClusterConnection {
    /// Kubeconfig path (`--kubeconfig`); the process environment's default
    /// config is used when absent
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context (`--context` / `--kube-context`)
    pub context: Option<String>,
}

/// Contract surface of the executor a manifest set is handed to.
///
/// `apply` runs the documents sequentially and fails the whole operation if
/// any document fails; `delete` removes the same document set; the helm pair
/// covers chart releases. Retry/backoff and idempotency guarantees are the
/// implementor's concern.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Apply the prepared documents, pruning when a label key is present
    async fn apply(&self, manifests: &PreparedManifests) -> Result<()>;

    /// Delete the prepared documents
    async fn delete(&self, manifests: &PreparedManifests) -> Result<()>;

    /// Install or upgrade a Helm release
    async fn install_or_upgrade(&self, chart: &HelmChart) -> Result<()>;

    /// Uninstall a Helm release
    async fn uninstall(&self, release: &str, namespace: &str) -> Result<()>;
}

/// Reference applier that spawns `kubectl` and `helm` on the local PATH
pub struct ExecApplier {
    connection: ClusterConnection,
    command_timeout: Duration,
}

impl ExecApplier {
    /// Create an applier for the given cluster connection
    pub fn new(connection: ClusterConnection) -> Self {
        Self {
            connection,
            command_timeout: COMMAND_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Write the rendered documents to a tempfile that lives until the
    /// invocation finishes
    fn stage_documents(&self, manifests: &PreparedManifests) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(manifests.render()?.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Write helm values to a tempfile (JSON is a valid helm values file)
    fn stage_values(&self, values: &serde_json::Value) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        serde_json::to_writer_pretty(&mut file, values)
            .map_err(|e| Error::serialization(e.to_string()))?;
        file.flush()?;
        Ok(file)
    }

    /// Run one command with a timeout, mapping failures through `fail`
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        description: &str,
        fail: fn(String) -> Error,
    ) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(kubeconfig) = &self.connection.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.connection.context {
            // helm spells the flag differently than kubectl
            let flag = if program == "helm" { "--kube-context" } else { "--context" };
            cmd.arg(flag).arg(context);
        }

        debug!(program, ?args, "spawning command");
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                warn!("{} timed out after {:?}", description, timeout);
                fail(format!("{} timed out after {:?}", description, timeout))
            })?
            .map_err(|e| fail(format!("{} failed to spawn: {}", description, e)))?;

        if output.status.success() {
            info!("{} succeeded", description);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed: {}", description, stderr.trim());
            Err(fail(format!("{} failed: {}", description, stderr.trim())))
        }
    }
}

#[async_trait]
impl Applier for ExecApplier {
    async fn apply(&self, manifests: &PreparedManifests) -> Result<()> {
        if manifests.documents.is_empty() {
            info!("no manifests to apply");
            return Ok(());
        }
        let file = self.stage_documents(manifests)?;

        // Pruning only works with apply; without a prune label the caller's
        // overwrite flag picks between apply and create semantics.
        let args = if manifests.overwrite || manifests.prune_label.is_some() {
            command::kubectl_apply_args(
                file.path(),
                manifests.prune_label.as_deref(),
                manifests.skip_validation,
            )
        } else {
            command::kubectl_create_args(file.path(), manifests.skip_validation)
        };

        self.run(
            "kubectl",
            &args,
            self.command_timeout,
            &format!("kubectl apply ({} documents)", manifests.documents.len()),
            Error::Apply,
        )
        .await
    }

    async fn delete(&self, manifests: &PreparedManifests) -> Result<()> {
        if manifests.documents.is_empty() {
            info!("no manifests to delete");
            return Ok(());
        }
        let file = self.stage_documents(manifests)?;
        let args = command::kubectl_delete_args(file.path());
        self.run(
            "kubectl",
            &args,
            self.command_timeout,
            &format!("kubectl delete ({} documents)", manifests.documents.len()),
            Error::Apply,
        )
        .await
    }

    async fn install_or_upgrade(&self, chart: &HelmChart) -> Result<()> {
        chart.validate()?;

        let values_file = match &chart.values {
            Some(values) => Some(self.stage_values(values)?),
            None => None,
        };
        let args = command::helm_upgrade_args(chart, values_file.as_ref().map(|f| f.path()));

        // A waiting chart may legitimately take up to its own timeout.
        let timeout = match chart.timeout {
            Some(t) => self.command_timeout.max(t + HELM_TIMEOUT_SLACK),
            None => self.command_timeout,
        };

        self.run(
            "helm",
            &args,
            timeout,
            &format!("helm upgrade --install {}", chart.release),
            Error::Helm,
        )
        .await
    }

    async fn uninstall(&self, release: &str, namespace: &str) -> Result<()> {
        let args = command::helm_uninstall_args(release, namespace);
        self.run(
            "helm",
            &args,
            self.command_timeout,
            &format!("helm uninstall {}", release),
            Error::Helm,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ClusterDefaults, ManifestSet};
    use serde_json::json;

    fn prepared() -> PreparedManifests {
        ManifestSet::new("S/M")
            .with_document(json!({
                "apiVersion": "v1", "kind": "Pod", "metadata": {"name": "p"}
            }))
            .prepare(&ClusterDefaults::default())
            .unwrap()
    }

    #[test]
    fn test_stage_documents_writes_rendered_payload() {
        let applier = ExecApplier::new(ClusterConnection::default());
        let file = applier.stage_documents(&prepared()).unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("---\n"));
        assert!(contents.contains("\"kind\": \"Pod\""));
        assert!(contents.contains("aws.cdk.eks/prune-"));
    }

    #[test]
    fn test_stage_values_writes_json() {
        let applier = ExecApplier::new(ClusterConnection::default());
        let file = applier
            .stage_values(&json!({"replicaCount": 2}))
            .unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("\"replicaCount\": 2"));
    }

    #[tokio::test]
    async fn test_apply_of_empty_set_is_a_noop() {
        let applier = ExecApplier::new(ClusterConnection::default());
        let empty = ManifestSet::new("S/Empty")
            .prepare(&ClusterDefaults::default())
            .unwrap();
        // Never spawns kubectl, so this succeeds without a cluster.
        applier.apply(&empty).await.unwrap();
        applier.delete(&empty).await.unwrap();
    }

    #[tokio::test]
    async fn test_install_rejects_invalid_chart_before_spawning() {
        let applier = ExecApplier::new(ClusterConnection::default());
        let chart = HelmChart::new("S/C", "nginx")
            .with_timeout(Duration::ZERO);
        let err = applier.install_or_upgrade(&chart).await.unwrap_err();
        assert!(matches!(err, Error::Helm(_)));
    }
}
