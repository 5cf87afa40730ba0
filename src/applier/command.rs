//! kubectl/helm argument shapes
//!
//! These builders define the exact command lines the executor runs; tests
//! pin them because downstream compatibility depends on the precise flags
//! (in particular `--prune -l <key>=`, which is how objects from an earlier
//! version of a set get deleted).

use std::path::Path;

use crate::helm::HelmChart;

/// Arguments for `kubectl apply -f <file> [--validate=false]
/// [--prune -l <key>=]`
pub fn kubectl_apply_args(
    manifest_file: &Path,
    prune_label: Option<&str>,
    skip_validation: bool,
) -> Vec<String> {
    let mut args = vec![
        "apply".to_string(),
        "-f".to_string(),
        manifest_file.display().to_string(),
    ];
    if skip_validation {
        args.push("--validate=false".to_string());
    }
    if let Some(key) = prune_label {
        args.push("--prune".to_string());
        args.push("-l".to_string());
        // Selector "<key>=" matches objects whose label value is empty,
        // which is the value injection always writes.
        args.push(format!("{}=", key));
    }
    args
}

/// Arguments for `kubectl create --save-config -f <file>
/// [--validate=false]`, the non-overwrite path that fails on conflict
pub fn kubectl_create_args(manifest_file: &Path, skip_validation: bool) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--save-config".to_string(),
        "-f".to_string(),
        manifest_file.display().to_string(),
    ];
    if skip_validation {
        args.push("--validate=false".to_string());
    }
    args
}

/// Arguments for `kubectl delete -f <file> --ignore-not-found`
pub fn kubectl_delete_args(manifest_file: &Path) -> Vec<String> {
    vec![
        "delete".to_string(),
        "-f".to_string(),
        manifest_file.display().to_string(),
        "--ignore-not-found".to_string(),
    ]
}

/// Arguments for `helm upgrade --install <release> <chart> --namespace <ns>
/// [--repo <url>] [--version <v>] [--values <file>] [--wait]
/// [--timeout <N>s] [--create-namespace]`
pub fn helm_upgrade_args(chart: &HelmChart, values_file: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "upgrade".to_string(),
        "--install".to_string(),
        chart.release.clone(),
        chart.chart.clone(),
        "--namespace".to_string(),
        chart.namespace.clone(),
    ];
    if let Some(repo) = &chart.repository {
        args.push("--repo".to_string());
        args.push(repo.clone());
    }
    if let Some(version) = &chart.version {
        args.push("--version".to_string());
        args.push(version.clone());
    }
    if let Some(file) = values_file {
        args.push("--values".to_string());
        args.push(file.display().to_string());
    }
    if chart.wait {
        args.push("--wait".to_string());
    }
    if let Some(timeout) = chart.timeout {
        args.push("--timeout".to_string());
        args.push(format!("{}s", timeout.as_secs()));
    }
    if chart.create_namespace {
        args.push("--create-namespace".to_string());
    }
    args
}

/// Arguments for `helm uninstall <release> --namespace <ns>`
pub fn helm_uninstall_args(release: &str, namespace: &str) -> Vec<String> {
    vec![
        "uninstall".to_string(),
        release.to_string(),
        "--namespace".to_string(),
        namespace.to_string(),
    ]
}
