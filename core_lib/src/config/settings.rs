use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_NAME: &str = "config";
const ENV_PREFIX: &str = "MONITORING";
const ENV_SEPARATOR: &str = "__";

/// Settings read once before the checks run.
///
/// Keys mirror the historical YAML layout (`node.type`, `router.ips`,
/// `externalSystemUrl`, ...). Camel-case top-level keys are accepted both as
/// written and lower-cased, since the `config` crate folds key case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub etcd: EtcdConfig,
    pub registry: RegistryConfig,
    pub router: RouterConfig,
    pub master: MasterConfig,
    #[serde(rename = "externalsystemurl", alias = "externalSystemUrl")]
    pub external_system_url: Option<String>,
    #[serde(rename = "hawcularip", alias = "hawcularIP")]
    pub hawcular_ip: Option<String>,
    #[serde(rename = "projectswithoutlimits", alias = "projectsWithoutLimits")]
    pub projects_without_limits: u32,
    pub http_service: HttpServiceConfig,
    pub certificates: CertificateConfig,
    pub logging: LoggingConfig,
    pub probes: ProbeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    #[serde(rename = "type")]
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdConfig {
    /// Comma separated cluster member addresses.
    pub ips: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Comma separated router addresses.
    pub ips: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub api_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServiceConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_seconds: u64,
    pub docker_pool: String,
    pub mount_point_prefix: String,
    pub kubernetes_dns_host: String,
    pub external_dns_host: String,
    pub restart_limit: u32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://localhost:8443/api".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            docker_pool: "docker-vg/docker-pool".to_string(),
            mount_point_prefix: "/gluster".to_string(),
            kubernetes_dns_host: "kubernetes.default.svc.cluster.local".to_string(),
            external_dns_host: "www.google.ch".to_string(),
            restart_limit: 5,
        }
    }
}

impl AppConfig {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, `config.{yaml,toml,json}` is
    /// looked up in the working directory and next to the executable, and may
    /// be absent. `MONITORING__*` environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if let Some(beside_binary) = executable_dir() {
                    let candidate = beside_binary.join(DEFAULT_CONFIG_NAME);
                    builder = builder.add_source(
                        File::with_name(&candidate.to_string_lossy()).required(false),
                    );
                }
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("certificates.paths"),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Loads from a single file, ignoring the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(File::from(path)).build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probes.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "probes.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.master.api_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "master.api_url cannot be empty".to_string(),
            ));
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "debug" | "info" | "warn" | "error" | "trace"
        ) {
            tracing::warn!("Unknown logging.level '{}', using info", self.logging.level);
        }

        Ok(())
    }

    pub fn node_type(&self) -> Option<&str> {
        non_blank(&self.node.node_type)
    }

    pub fn etcd_addresses(&self) -> Vec<String> {
        split_addresses(self.etcd.ips.as_deref())
    }

    pub fn router_addresses(&self) -> Vec<String> {
        split_addresses(self.router.ips.as_deref())
    }

    pub fn registry_address(&self) -> Option<&str> {
        non_blank(&self.registry.ip)
    }

    pub fn external_system_url(&self) -> Option<&str> {
        non_blank(&self.external_system_url)
    }

    pub fn hawcular_address(&self) -> Option<&str> {
        non_blank(&self.hawcular_ip)
    }

    pub fn http_service_url(&self) -> Option<&str> {
        non_blank(&self.http_service.url)
    }

    pub fn certificate_paths(&self) -> Vec<String> {
        self.certificates
            .paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn debug_logging(&self) -> bool {
        self.logging.level.eq_ignore_ascii_case("debug")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Splits a comma separated address list, keeping configured order.
pub fn split_addresses(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp config file");
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.node_type().is_none());
        assert_eq!(config.master.api_url, "https://localhost:8443/api");
        assert_eq!(config.probes.timeout_seconds, 5);
        assert_eq!(config.projects_without_limits, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.probes.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.master.api_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(
            split_addresses(Some("10.0.0.1,10.0.0.2")),
            vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]
        );
        assert_eq!(
            split_addresses(Some(" 10.0.0.1 , ,10.0.0.3,")),
            vec!["10.0.0.1".to_string(), "10.0.0.3".to_string()]
        );
        assert!(split_addresses(Some("")).is_empty());
        assert!(split_addresses(None).is_empty());
    }

    #[test]
    fn test_blank_optional_values_are_absent() {
        let mut config = AppConfig::default();
        config.registry.ip = Some("   ".to_string());
        config.external_system_url = Some(String::new());
        assert!(config.registry_address().is_none());
        assert!(config.external_system_url().is_none());

        config.registry.ip = Some(" 172.30.1.1 ".to_string());
        assert_eq!(config.registry_address(), Some("172.30.1.1"));
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_config(
            ".yaml",
            r#"
node:
  type: master
etcd:
  ips: "10.0.1.1,10.0.1.2"
registry:
  ip: "172.30.0.10"
router:
  ips: "10.0.0.1,10.0.0.2"
externalSystemUrl: "https://example.org/status"
hawcularIP: "10.0.2.1"
projectsWithoutLimits: 3
logging:
  level: debug
"#,
        );

        let config = AppConfig::load_from(file.path()).expect("config should load");

        assert_eq!(config.node_type(), Some("master"));
        assert_eq!(config.etcd_addresses(), vec!["10.0.1.1", "10.0.1.2"]);
        assert_eq!(config.router_addresses(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(config.registry_address(), Some("172.30.0.10"));
        assert_eq!(config.external_system_url(), Some("https://example.org/status"));
        assert_eq!(config.hawcular_address(), Some("10.0.2.1"));
        assert_eq!(config.projects_without_limits, 3);
        assert!(config.debug_logging());
        assert_eq!(config.probes.docker_pool, "docker-vg/docker-pool");
    }

    #[test]
    fn test_load_toml_file_with_certificates() {
        let file = write_config(
            ".toml",
            r#"
[node]
type = "storage"

[certificates]
paths = ["/etc/origin/node/server.crt", ""]

[probes]
timeout_seconds = 2
mount_point_prefix = "/var/lib/heketi"
"#,
        );

        let config = AppConfig::load_from(file.path()).expect("config should load");

        assert_eq!(config.node_type(), Some("storage"));
        assert_eq!(config.certificate_paths(), vec!["/etc/origin/node/server.crt"]);
        assert_eq!(config.probes.timeout_seconds, 2);
        assert_eq!(config.probes.mount_point_prefix, "/var/lib/heketi");
        assert!(!config.debug_logging());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }
}
