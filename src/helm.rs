//! Helm chart deployment options
//!
//! Charts are handed to the applier as `helm upgrade --install` invocations.
//! Release names default to a sanitized suffix of the chart's logical
//! identifier so that redeployments of the same instance reuse the same
//! release while distinct instances get distinct names.

use std::time::Duration;

use serde_json::Value;

use crate::{Error, Result, HELM_MAX_TIMEOUT, HELM_RELEASE_NAME_MAX};

/// Options for one Helm chart deployment
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmChart {
    /// Chart reference: a name resolved against [`HelmChart::repository`],
    /// a local path, or an OCI/absolute URL
    pub chart: String,
    /// Release name; defaults to [`default_release_name`] of the identifier
    pub release: String,
    /// Chart version; latest when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Chart repository URL, passed as `--repo`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Target namespace
    pub namespace: String,
    /// Values overrides, written to a values file for the invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    /// Wait until all resources are ready before returning (`--wait`)
    #[serde(default)]
    pub wait: bool,
    /// How long the executor may wait for the release; must not exceed
    /// [`HELM_MAX_TIMEOUT`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Create the target namespace if it does not exist
    #[serde(default)]
    pub create_namespace: bool,
}

impl HelmChart {
    /// Create chart options with defaults: release name derived from the
    /// identifier, namespace `"default"`, namespace creation enabled
    pub fn new(identifier: &str, chart: impl Into<String>) -> Self {
        Self {
            chart: chart.into(),
            release: default_release_name(identifier),
            version: None,
            repository: None,
            namespace: "default".to_string(),
            values: None,
            wait: false,
            timeout: None,
            create_namespace: true,
        }
    }

    /// Set an explicit release name
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    /// Pin the chart version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the chart repository URL
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Set the target namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set values overrides
    pub fn with_values(mut self, values: Value) -> Self {
        self.values = Some(values);
        self
    }

    /// Wait for resources to become ready before returning
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// Bound how long the release may take
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Control namespace creation
    pub fn with_create_namespace(mut self, create: bool) -> Self {
        self.create_namespace = create;
        self
    }

    /// Validate the options before hand-off.
    ///
    /// Checks that the chart reference and release name are non-empty, the
    /// release name fits Helm's length limit, and the timeout (when set) is
    /// positive and within [`HELM_MAX_TIMEOUT`].
    pub fn validate(&self) -> Result<()> {
        if self.chart.is_empty() {
            return Err(Error::helm("chart reference must not be empty"));
        }
        if self.release.is_empty() {
            return Err(Error::helm("release name must not be empty"));
        }
        if self.release.len() > HELM_RELEASE_NAME_MAX {
            return Err(Error::helm(format!(
                "release name {:?} exceeds {} characters",
                self.release, HELM_RELEASE_NAME_MAX
            )));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(Error::helm("timeout must be positive"));
            }
            if timeout > HELM_MAX_TIMEOUT {
                return Err(Error::helm(format!(
                    "timeout {}s exceeds the maximum of {}s",
                    timeout.as_secs(),
                    HELM_MAX_TIMEOUT.as_secs()
                )));
            }
        }
        Ok(())
    }
}

/// Derive a default release name from a chart's logical identifier.
///
/// Lowercases the identifier, maps every character outside `[a-z0-9-]` to
/// `-`, keeps the LAST [`HELM_RELEASE_NAME_MAX`] characters (the tail of a
/// path-like identifier carries the distinguishing part), and trims
/// leading/trailing dashes. Falls back to `"release"` when nothing is left.
pub fn default_release_name(identifier: &str) -> String {
    let mapped: String = identifier
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();

    let start = mapped.len().saturating_sub(HELM_RELEASE_NAME_MAX);
    let tail = mapped[start..].trim_matches('-');
    if tail.is_empty() {
        "release".to_string()
    } else {
        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_release_name_is_sanitized() {
        assert_eq!(default_release_name("MyStack/MyChart"), "mystack-mychart");
        assert_eq!(default_release_name("Stack_1/Nginx Ingress"), "stack-1-nginx-ingress");
    }

    #[test]
    fn test_default_release_name_keeps_tail() {
        let id = format!("{}/{}", "a".repeat(60), "tail-part");
        let name = default_release_name(&id);
        assert!(name.len() <= HELM_RELEASE_NAME_MAX);
        assert!(name.ends_with("tail-part"));
    }

    #[test]
    fn test_default_release_name_is_stable_and_distinct() {
        assert_eq!(default_release_name("S/C"), default_release_name("S/C"));
        assert_ne!(default_release_name("S/C1"), default_release_name("S/C2"));
    }

    #[test]
    fn test_default_release_name_never_empty() {
        assert_eq!(default_release_name(""), "release");
        assert_eq!(default_release_name("///"), "release");
    }

    #[test]
    fn test_new_applies_defaults() {
        let chart = HelmChart::new("MyStack/Ingress", "ingress-nginx");
        assert_eq!(chart.release, "mystack-ingress");
        assert_eq!(chart.namespace, "default");
        assert!(chart.create_namespace);
        assert!(!chart.wait);
        assert!(chart.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_chart_and_release() {
        let chart = HelmChart::new("S/C", "");
        assert!(chart.validate().is_err());

        let chart = HelmChart::new("S/C", "nginx").with_release("");
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_timeouts() {
        let chart = HelmChart::new("S/C", "nginx");

        let zero = chart.clone().with_timeout(Duration::ZERO);
        assert!(zero.validate().unwrap_err().to_string().contains("positive"));

        let too_long = chart.clone().with_timeout(HELM_MAX_TIMEOUT + Duration::from_secs(1));
        assert!(too_long.validate().unwrap_err().to_string().contains("exceeds"));

        let ok = chart.with_timeout(HELM_MAX_TIMEOUT);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_release() {
        let chart = HelmChart::new("S/C", "nginx").with_release("r".repeat(54));
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_builder_options() {
        let chart = HelmChart::new("S/C", "prometheus")
            .with_repository("https://prometheus-community.github.io/helm-charts")
            .with_version("25.1.0")
            .with_namespace("monitoring")
            .with_values(json!({"server": {"replicaCount": 2}}))
            .with_wait(true)
            .with_timeout(Duration::from_secs(300));

        assert_eq!(chart.namespace, "monitoring");
        assert_eq!(chart.version.as_deref(), Some("25.1.0"));
        assert!(chart.wait);
        assert!(chart.validate().is_ok());
    }
}
