//! Cluster state probes driven through the `oc` client

use super::{run_command, ProbeFailure, ProbeResult};
use std::collections::HashSet;

pub const ROUTER_NAMESPACE: &str = "default";
pub const LOGGING_NAMESPACE: &str = "logging";

const SYSTEM_NAMESPACE_PREFIXES: [&str; 2] = ["openshift", "kube-"];
const SYSTEM_NAMESPACES: [&str; 3] = ["default", "logging", "management-infra"];

pub fn nodes_ready() -> ProbeResult {
    let output = run_command("oc", &["get", "nodes", "--no-headers"])?;
    let not_ready = not_ready_nodes(&output);

    if not_ready.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(format!(
            "Nodes not ready: {}",
            not_ready.join(", ")
        )))
    }
}

/// Fails when a pod in `namespace` restarted more than `limit` times.
pub fn pod_restarts(namespace: &str, selector: Option<&str>, limit: u32) -> ProbeResult {
    let mut args = vec!["get", "pods", "-n", namespace, "--no-headers"];
    if let Some(selector) = selector {
        args.push("-l");
        args.push(selector);
    }

    let output = run_command("oc", &args)?;
    let restarted = restarted_pods(&output, limit);

    if restarted.is_empty() {
        Ok(())
    } else {
        let pods: Vec<String> = restarted
            .iter()
            .map(|(pod, count)| format!("{} ({} restarts)", pod, count))
            .collect();
        Err(ProbeFailure::new(format!(
            "Pods in {} restarted more than {} times: {}",
            namespace,
            limit,
            pods.join(", ")
        )))
    }
}

pub fn limits_and_quotas(allowed_without_limits: u32) -> ProbeResult {
    let projects = run_command(
        "oc",
        &["get", "projects", "--no-headers", "-o", "custom-columns=NAME:.metadata.name"],
    )?;
    let limit_ranges = run_command(
        "oc",
        &[
            "get",
            "limitrange",
            "--all-namespaces",
            "--no-headers",
            "-o",
            "custom-columns=NAMESPACE:.metadata.namespace",
        ],
    )?;

    check_limits(&projects_without_limits(&projects, &limit_ranges), allowed_without_limits)
}

fn not_ready_nodes(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let status = fields.next()?;
            let ready = status.split(',').any(|s| s == "Ready");
            (!ready).then(|| name.to_string())
        })
        .collect()
}

/// `oc get pods` columns: NAME READY STATUS RESTARTS AGE.
fn restarted_pods(output: &str, limit: u32) -> Vec<(String, u32)> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let name = fields.first()?;
            let restarts: u32 = fields.get(3)?.parse().ok()?;
            (restarts > limit).then(|| (name.to_string(), restarts))
        })
        .collect()
}

fn projects_without_limits(projects: &str, limit_ranges: &str) -> Vec<String> {
    let limited: HashSet<&str> = limit_ranges.lines().map(str::trim).collect();

    projects
        .lines()
        .map(str::trim)
        .filter(|project| !project.is_empty())
        .filter(|project| !is_system_namespace(project))
        .filter(|project| !limited.contains(project))
        .map(str::to_string)
        .collect()
}

fn is_system_namespace(name: &str) -> bool {
    SYSTEM_NAMESPACES.contains(&name)
        || SYSTEM_NAMESPACE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn check_limits(unlimited: &[String], allowed: u32) -> ProbeResult {
    if unlimited.len() as u64 <= u64::from(allowed) {
        return Ok(());
    }

    Err(ProbeFailure::new(format!(
        "{} projects without limits (allowed {}): {}",
        unlimited.len(),
        allowed,
        unlimited.join(", ")
    )))
}
