//! Role based check plans
//!
//! A plan is the ordered list of probes a node of a given role runs, each
//! tagged with the tier it reports under. Thresholds are fixed per role and
//! tier; only addresses, urls and paths come from configuration.

use crate::checks::event::Severity;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DOCKER_POOL_MAJOR_PERCENT: u8 = 90;
pub const DOCKER_POOL_MINOR_PERCENT: u8 = 80;
pub const MOUNT_POINT_MAJOR_PERCENT: u8 = 90;
pub const MOUNT_POINT_MINOR_PERCENT: u8 = 85;
pub const LV_POOL_MAJOR_PERCENT: u8 = 90;
pub const LV_POOL_MINOR_PERCENT: u8 = 80;
pub const VG_MAJOR_MIN_FREE_PERCENT: u8 = 5;
pub const VG_MINOR_MIN_FREE_PERCENT: u8 = 10;
pub const CERT_EXPIRY_MAJOR_DAYS: u32 = 30;
pub const CERT_EXPIRY_MINOR_DAYS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Master,
    Storage,
}

impl Role {
    /// Reads `node.type`. A missing or unknown role is fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let raw = config.node_type().ok_or_else(|| {
            AppError::Config("Can't read node.type from configuration".to_string())
        })?;
        raw.parse()
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "worker" | "node" => Ok(Role::Worker),
            "master" => Ok(Role::Master),
            "storage" => Ok(Role::Storage),
            _ => Err(AppError::UnknownRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Worker => write!(f, "worker"),
            Role::Master => write!(f, "master"),
            Role::Storage => write!(f, "storage"),
        }
    }
}

/// A probe from the capability set together with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "probe", rename_all = "snake_case")]
pub enum Probe {
    GlusterdRunning,
    MountPointSizes { threshold_percent: u8 },
    LvPoolSizes { threshold_percent: u8 },
    VgSizes { min_free_percent: u8 },
    OpenFileCount,
    DockerPool { threshold_percent: u8 },
    KubernetesDns,
    NodeDns,
    NodesReady,
    EtcdHealth { addresses: Vec<String> },
    RegistryHealth { address: String },
    RouterHealth { address: String },
    MasterApi { url: String },
    ExternalSystem { url: String },
    HawkularHealth { address: String },
    RouterRestartCount,
    LimitsAndQuotas { allowed_without_limits: u32 },
    HttpService { url: String },
    LoggingRestartCount,
    CertificateExpiry { paths: Vec<String>, days: u32 },
    Ntpd,
}

impl Probe {
    pub fn name(&self) -> &'static str {
        match self {
            Probe::GlusterdRunning => "glusterd_running",
            Probe::MountPointSizes { .. } => "mount_point_sizes",
            Probe::LvPoolSizes { .. } => "lv_pool_sizes",
            Probe::VgSizes { .. } => "vg_sizes",
            Probe::OpenFileCount => "open_file_count",
            Probe::DockerPool { .. } => "docker_pool",
            Probe::KubernetesDns => "kubernetes_dns",
            Probe::NodeDns => "node_dns",
            Probe::NodesReady => "nodes_ready",
            Probe::EtcdHealth { .. } => "etcd_health",
            Probe::RegistryHealth { .. } => "registry_health",
            Probe::RouterHealth { .. } => "router_health",
            Probe::MasterApi { .. } => "master_api",
            Probe::ExternalSystem { .. } => "external_system",
            Probe::HawkularHealth { .. } => "hawkular_health",
            Probe::RouterRestartCount => "router_restart_count",
            Probe::LimitsAndQuotas { .. } => "limits_and_quotas",
            Probe::HttpService { .. } => "http_service",
            Probe::LoggingRestartCount => "logging_restart_count",
            Probe::CertificateExpiry { .. } => "certificate_expiry",
            Probe::Ntpd => "ntpd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPlanEntry {
    pub probe: Probe,
    pub severity: Severity,
}

impl CheckPlanEntry {
    pub fn major(probe: Probe) -> Self {
        Self {
            probe,
            severity: Severity::Major,
        }
    }

    pub fn minor(probe: Probe) -> Self {
        Self {
            probe,
            severity: Severity::Minor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPlan {
    role: Role,
    entries: Vec<CheckPlanEntry>,
}

impl CheckPlan {
    /// Builds the ordered plan for `role`: the MAJOR tier first, then MINOR.
    ///
    /// Fails before anything runs when a master node lacks cluster member or
    /// router addresses. Missing optional settings drop their probe.
    pub fn build(role: Role, config: &AppConfig) -> Result<Self> {
        let mut entries = Vec::new();

        match role {
            Role::Worker => {
                worker_majors(&mut entries);
                push_certificates(&mut entries, config, Severity::Major);
                worker_minors(&mut entries, config);
            }
            Role::Master => {
                master_majors(&mut entries, config)?;
                push_certificates(&mut entries, config, Severity::Major);
                master_minors(&mut entries, config);
            }
            Role::Storage => {
                storage_majors(&mut entries);
                push_certificates(&mut entries, config, Severity::Major);
                storage_minors(&mut entries);
            }
        }

        push_certificates(&mut entries, config, Severity::Minor);
        entries.push(CheckPlanEntry::minor(Probe::Ntpd));

        Ok(Self { role, entries })
    }

    /// Resolves the configured role and builds its plan. Every entry point
    /// goes through here so configuration is validated the same way.
    pub fn for_config(config: &AppConfig) -> Result<Self> {
        let role = Role::from_config(config)?;
        Self::build(role, config)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn entries(&self) -> &[CheckPlanEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CheckPlanEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }
}

impl<'a> IntoIterator for &'a CheckPlan {
    type Item = &'a CheckPlanEntry;
    type IntoIter = std::slice::Iter<'a, CheckPlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn worker_majors(entries: &mut Vec<CheckPlanEntry>) {
    entries.push(CheckPlanEntry::major(Probe::DockerPool {
        threshold_percent: DOCKER_POOL_MAJOR_PERCENT,
    }));
    entries.push(CheckPlanEntry::major(Probe::KubernetesDns));
    entries.push(CheckPlanEntry::major(Probe::NodeDns));
}

fn worker_minors(entries: &mut Vec<CheckPlanEntry>, config: &AppConfig) {
    entries.push(CheckPlanEntry::minor(Probe::DockerPool {
        threshold_percent: DOCKER_POOL_MINOR_PERCENT,
    }));
    push_http_service(entries, config);
}

fn master_majors(entries: &mut Vec<CheckPlanEntry>, config: &AppConfig) -> Result<()> {
    let etcd = config.etcd_addresses();
    if etcd.is_empty() {
        return Err(AppError::MissingConfig {
            key: "etcd.ips",
            role: Role::Master.to_string(),
        });
    }

    let routers = config.router_addresses();
    if routers.is_empty() {
        return Err(AppError::MissingConfig {
            key: "router.ips",
            role: Role::Master.to_string(),
        });
    }

    entries.push(CheckPlanEntry::major(Probe::NodesReady));
    entries.push(CheckPlanEntry::major(Probe::EtcdHealth { addresses: etcd }));

    if let Some(address) = config.registry_address() {
        entries.push(CheckPlanEntry::major(Probe::RegistryHealth {
            address: address.to_string(),
        }));
    }

    for address in routers {
        entries.push(CheckPlanEntry::major(Probe::RouterHealth { address }));
    }

    entries.push(CheckPlanEntry::major(Probe::MasterApi {
        url: config.master.api_url.trim().to_string(),
    }));
    entries.push(CheckPlanEntry::major(Probe::KubernetesDns));
    entries.push(CheckPlanEntry::major(Probe::NodeDns));

    Ok(())
}

fn master_minors(entries: &mut Vec<CheckPlanEntry>, config: &AppConfig) {
    if let Some(url) = config.external_system_url() {
        entries.push(CheckPlanEntry::minor(Probe::ExternalSystem {
            url: url.to_string(),
        }));
    }

    if let Some(address) = config.hawcular_address() {
        entries.push(CheckPlanEntry::minor(Probe::HawkularHealth {
            address: address.to_string(),
        }));
    }

    entries.push(CheckPlanEntry::minor(Probe::RouterRestartCount));
    entries.push(CheckPlanEntry::minor(Probe::LimitsAndQuotas {
        allowed_without_limits: config.projects_without_limits,
    }));
    push_http_service(entries, config);
    entries.push(CheckPlanEntry::minor(Probe::LoggingRestartCount));
}

fn storage_majors(entries: &mut Vec<CheckPlanEntry>) {
    entries.push(CheckPlanEntry::major(Probe::GlusterdRunning));
    entries.push(CheckPlanEntry::major(Probe::MountPointSizes {
        threshold_percent: MOUNT_POINT_MAJOR_PERCENT,
    }));
    entries.push(CheckPlanEntry::major(Probe::LvPoolSizes {
        threshold_percent: LV_POOL_MAJOR_PERCENT,
    }));
    entries.push(CheckPlanEntry::major(Probe::VgSizes {
        min_free_percent: VG_MAJOR_MIN_FREE_PERCENT,
    }));
}

fn storage_minors(entries: &mut Vec<CheckPlanEntry>) {
    entries.push(CheckPlanEntry::minor(Probe::OpenFileCount));
    entries.push(CheckPlanEntry::minor(Probe::MountPointSizes {
        threshold_percent: MOUNT_POINT_MINOR_PERCENT,
    }));
    entries.push(CheckPlanEntry::minor(Probe::LvPoolSizes {
        threshold_percent: LV_POOL_MINOR_PERCENT,
    }));
    entries.push(CheckPlanEntry::minor(Probe::VgSizes {
        min_free_percent: VG_MINOR_MIN_FREE_PERCENT,
    }));
}

fn push_http_service(entries: &mut Vec<CheckPlanEntry>, config: &AppConfig) {
    if let Some(url) = config.http_service_url() {
        entries.push(CheckPlanEntry::minor(Probe::HttpService {
            url: url.to_string(),
        }));
    }
}

fn push_certificates(entries: &mut Vec<CheckPlanEntry>, config: &AppConfig, severity: Severity) {
    let paths = config.certificate_paths();
    if paths.is_empty() {
        return;
    }

    let days = match severity {
        Severity::Major => CERT_EXPIRY_MAJOR_DAYS,
        Severity::Minor => CERT_EXPIRY_MINOR_DAYS,
    };

    entries.push(CheckPlanEntry {
        probe: Probe::CertificateExpiry { paths, days },
        severity,
    });
}
