use core_lib::{
    AppConfig, AppError, Category, CheckPlan, Orchestrator, Probe, ProbeFailure, ProbeResult,
    ProbeSet, Role, Severity,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Fails every probe whose name is listed.
struct FailingByName(Vec<&'static str>);

impl ProbeSet for FailingByName {
    fn probe(&self, probe: &Probe) -> ProbeResult {
        if self.0.contains(&probe.name()) {
            Err(ProbeFailure::new(format!("{} is broken", probe.name())))
        } else {
            Ok(())
        }
    }
}

fn load_config(yaml: &str) -> AppConfig {
    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    load(&file)
}

fn load(file: &NamedTempFile) -> AppConfig {
    AppConfig::load_from(file.path()).expect("config should load")
}

#[test]
fn test_master_report_from_config_file() {
    let config = load_config(
        r#"
node:
  type: master
etcd:
  ips: "10.0.1.1,10.0.1.2,10.0.1.3"
registry:
  ip: "172.30.0.10"
router:
  ips: "10.0.0.1,10.0.0.2"
"#,
    );

    let orchestrator = Orchestrator::new(FailingByName(vec!["router_health", "ntpd"]));
    let report = orchestrator.run(&config).unwrap();

    let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
    assert_eq!(value["name"], "ch.sbb.openshift-integration");
    assert_eq!(value["protocol_version"], "1");
    assert_eq!(value["integration_version"], "1.0.0");

    let events = value["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["category"], "MAJOR");
    assert_eq!(events[1]["category"], "MAJOR");
    assert_eq!(events[2]["category"], "MINOR");
    assert_eq!(events[2]["summary"], "ntpd is broken");
}

#[test]
fn test_master_without_router_addresses_is_fatal() {
    let config = load_config(
        r#"
node:
  type: master
etcd:
  ips: "10.0.1.1"
registry:
  ip: "172.30.0.10"
"#,
    );

    let orchestrator = Orchestrator::new(FailingByName(Vec::new()));
    let err = orchestrator.run(&config).unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(err, AppError::MissingConfig { key: "router.ips", .. }));
}

#[test]
fn test_missing_node_type_is_fatal() {
    let config = load_config("logging:\n  level: info\n");

    let err = Orchestrator::new(FailingByName(Vec::new()))
        .run(&config)
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn test_node_alias_runs_worker_plan() {
    let config = load_config("node:\n  type: node\n");

    let role = Role::from_config(&config).unwrap();
    assert_eq!(role, Role::Worker);

    let report = Orchestrator::new(FailingByName(vec!["docker_pool"]))
        .run(&config)
        .unwrap();

    let categories: Vec<Category> = report.events.iter().map(|e| e.category()).collect();
    assert_eq!(categories, vec![Category::Major, Category::Minor]);
}

#[test]
fn test_storage_with_certificates_all_failing() {
    let config = load_config(
        r#"
node:
  type: storage
certificates:
  paths:
    - /etc/origin/node/server.crt
"#,
    );

    let plan = CheckPlan::build(Role::Storage, &config).unwrap();
    let every_probe: Vec<&'static str> = plan.iter().map(|entry| entry.probe.name()).collect();

    let report = Orchestrator::new(FailingByName(every_probe)).execute(&plan);

    assert_eq!(plan.len(), 11);
    assert_eq!(report.events.len(), plan.len());
    assert_eq!(report.major_count(), plan.count(Severity::Major));
    assert_eq!(report.minor_count(), plan.count(Severity::Minor));
    assert!(!report.is_healthy());
}

#[test]
fn test_pretty_and_compact_output_agree() {
    let config = load_config("node:\n  type: worker\n");
    let report = Orchestrator::new(FailingByName(Vec::new())).run(&config).unwrap();

    let compact: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
    let pretty: serde_json::Value = serde_json::from_str(&report.to_json(true).unwrap()).unwrap();

    assert_eq!(compact, pretty);
    assert_eq!(compact["events"][0]["summary"], "system healthy");
}
