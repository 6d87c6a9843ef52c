//! Probe capability set
//!
//! The orchestrator only knows [`ProbeSet`]. [`SystemProbes`] is the
//! implementation that inspects the local node and cluster; each submodule
//! groups probes by what they look at.

pub mod cluster;
pub mod host;
pub mod network;
pub mod storage;

use crate::checks::plan::Probe;
use crate::config::ProbeConfig;
use crate::error::Result;
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a probe did not pass. The message ends up verbatim in the report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProbeFailure {
    message: String,
}

impl ProbeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type ProbeResult = std::result::Result<(), ProbeFailure>;

pub trait ProbeSet {
    /// Runs one probe to completion. Implementations own their timeouts.
    fn probe(&self, probe: &Probe) -> ProbeResult;
}

impl<T: ProbeSet + ?Sized> ProbeSet for &T {
    fn probe(&self, probe: &Probe) -> ProbeResult {
        (**self).probe(probe)
    }
}

impl<T: ProbeSet + ?Sized> ProbeSet for Box<T> {
    fn probe(&self, probe: &Probe) -> ProbeResult {
        (**self).probe(probe)
    }
}

/// Knobs the production probes need beyond what the plan binds.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub docker_pool: String,
    pub mount_point_prefix: String,
    pub kubernetes_dns_host: String,
    pub external_dns_host: String,
    pub restart_limit: u32,
}

impl From<&ProbeConfig> for ProbeSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            docker_pool: config.docker_pool.clone(),
            mount_point_prefix: config.mount_point_prefix.clone(),
            kubernetes_dns_host: config.kubernetes_dns_host.clone(),
            external_dns_host: config.external_dns_host.clone(),
            restart_limit: config.restart_limit,
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&ProbeConfig::default())
    }
}

pub struct SystemProbes {
    settings: ProbeSettings,
    http: network::HttpProber,
}

impl SystemProbes {
    pub fn new(settings: ProbeSettings) -> Result<Self> {
        let http = network::HttpProber::new(settings.timeout)?;
        Ok(Self { settings, http })
    }
}

impl ProbeSet for SystemProbes {
    fn probe(&self, probe: &Probe) -> ProbeResult {
        let settings = &self.settings;

        match probe {
            Probe::GlusterdRunning => host::process_running(&["glusterd"], "glusterd"),
            Probe::MountPointSizes { threshold_percent } => {
                storage::mount_point_sizes(&settings.mount_point_prefix, *threshold_percent)
            }
            Probe::LvPoolSizes { threshold_percent } => storage::lv_pool_sizes(*threshold_percent),
            Probe::VgSizes { min_free_percent } => storage::vg_sizes(*min_free_percent),
            Probe::OpenFileCount => host::open_file_count(),
            Probe::DockerPool { threshold_percent } => {
                storage::docker_pool(&settings.docker_pool, *threshold_percent)
            }
            Probe::KubernetesDns => network::resolve(&settings.kubernetes_dns_host),
            Probe::NodeDns => network::resolve(&settings.external_dns_host),
            Probe::NodesReady => cluster::nodes_ready(),
            Probe::EtcdHealth { addresses } => network::etcd_health(addresses, settings.timeout),
            Probe::RegistryHealth { address } => self.http.registry_health(address),
            Probe::RouterHealth { address } => self.http.router_health(address),
            Probe::MasterApi { url } => self.http.expect_success("Master API", url),
            Probe::ExternalSystem { url } => self.http.expect_success("External system", url),
            Probe::HawkularHealth { address } => self.http.hawkular_health(address),
            Probe::RouterRestartCount => {
                cluster::pod_restarts(cluster::ROUTER_NAMESPACE, Some("router"), settings.restart_limit)
            }
            Probe::LimitsAndQuotas {
                allowed_without_limits,
            } => cluster::limits_and_quotas(*allowed_without_limits),
            Probe::HttpService { url } => self.http.expect_success("HTTP service", url),
            Probe::LoggingRestartCount => {
                cluster::pod_restarts(cluster::LOGGING_NAMESPACE, None, settings.restart_limit)
            }
            Probe::CertificateExpiry { paths, days } => host::certificate_expiry(paths, *days),
            Probe::Ntpd => host::process_running(&["ntpd", "chronyd"], "ntpd"),
        }
    }
}

/// Runs an external command and returns its stdout. A missing binary or a
/// non-zero exit is a probe failure naming the command.
pub(crate) fn run_command(program: &str, args: &[&str]) -> std::result::Result<String, ProbeFailure> {
    let command = format!("{} {}", program, args.join(" "));
    debug!("Running command: {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ProbeFailure::new(format!("Could not run '{}': {}", command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeFailure::new(format!(
            "'{}' failed ({}): {}",
            command,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses a percentage column as printed by `lvs`/`df`, tolerating a `%` suffix.
pub(crate) fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse().ok()
}
